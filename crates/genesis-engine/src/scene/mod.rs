//! Scene graph: named game objects composed of components.
//!
//! - [`Component`]: behavior with lifecycle hooks
//! - [`GameObject`]: at most one component per kind
//! - [`Scene`]: named objects plus the per-tick phase ordering
//! - [`SceneManager`]: the active scene

mod component;
mod core;
mod ctx;
mod manager;
mod object;

pub use component::{Component, ComponentKind};
pub use self::core::{Scene, SceneConfig};
pub use ctx::SceneCtx;
pub use manager::SceneManager;
pub use object::GameObject;
