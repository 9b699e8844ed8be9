//! Raymarching demo: a shape following the pointer, shaded by a raymarched
//! pair of blended spheres.
//!
//! Usage: `genesis-demo [quad|triangle|circle] [shader-dir]`

mod circle;
mod raymarch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use genesis_engine::gpu::GpuInit;
use genesis_engine::logging::{init_logging, LoggingConfig};
use genesis_engine::scene::{GameObject, SceneConfig};
use genesis_engine::window::{Runtime, RuntimeConfig};

use raymarch::{bundled_shaders, RaymarchLoader, Shape};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args().skip(1);
    let shape = match args.next() {
        Some(name) => Shape::parse(&name)
            .with_context(|| format!("unknown shape `{name}` (expected quad, triangle or circle)"))?,
        None => Shape::Quad,
    };
    let shader_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| bundled_shaders().to_path_buf());

    let runtime = RuntimeConfig {
        title: "genesis · raymarching".to_string(),
        ..RuntimeConfig::default()
    };
    let scene = SceneConfig {
        label: "raymarching".to_string(),
        ..SceneConfig::default()
    };

    Runtime::run(runtime, GpuInit::default(), scene, move |scene| {
        let loader = GameObject::new().with_component(RaymarchLoader::new(shader_dir, shape));
        scene.add_game_object("loader", loader)?;
        Ok(())
    })
}
