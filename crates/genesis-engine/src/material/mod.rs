//! Shaders and the per-draw values bound to them.
//!
//! A [`Material`] is a component: it compiles its [`Shader`] in `on_init` and
//! pushes its attributes and uniforms in `on_before_render`.

mod material;
mod shader;
mod value;

pub use material::Material;
pub use shader::Shader;
pub use value::{Attribute, AttributeShape, Uniform};
