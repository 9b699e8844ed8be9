//! Built-in components.

mod mesh;
mod transform;

pub use mesh::{INDEX_ATTRIBUTE, INDEX_BUFFER, Mesh, VERTEX_ATTRIBUTE, VERTEX_BUFFER};
pub use transform::{MODEL_UNIFORM, Transform};
