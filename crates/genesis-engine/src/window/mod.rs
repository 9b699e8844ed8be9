//! Window + runtime loop.
//!
//! Owns the `winit` event loop and window, the GPU context behind them and the
//! [`SceneManager`](crate::scene::SceneManager) they drive.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
