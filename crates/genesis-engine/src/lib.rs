//! Genesis engine.
//!
//! A small 2D scene-graph renderer: game objects own typed components
//! ([`components::Transform`], [`components::Mesh`], [`material::Material`]),
//! a [`scene::Scene`] drives their lifecycle once per tick, and everything
//! GPU-facing goes through the [`device::Device`] trait. [`gpu`] implements it
//! with wgpu and [`window`] runs a scene in a winit window.

pub mod buffer;
pub mod components;
pub mod device;
pub mod error;
pub mod gpu;
pub mod logging;
pub mod material;
pub mod math;
pub mod scene;
pub mod time;
pub mod window;

pub use error::{Error, Result};
