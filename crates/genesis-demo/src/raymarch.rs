use std::path::{Path, PathBuf};

use futures::future::{self, FutureExt, LocalBoxFuture};

use genesis_engine::components::{Mesh, Transform};
use genesis_engine::material::{Material, Shader, Uniform};
use genesis_engine::math::{Mat3, Vec2};
use genesis_engine::scene::{Component, GameObject, SceneCtx};
use genesis_engine::Result;

use crate::circle::circle_mesh;

pub const OBJECT_NAME: &str = "full-screen-quad";

const VERTEX_SHADER: &str = "raymarching.vert.wgsl";
const FRAGMENT_SHADER: &str = "raymarching.frag.wgsl";

/// Edge scale applied to the unit-sized shapes, in pixels.
const SHAPE_SCALE: f32 = 100.0;
const BLEND_FORCE: f32 = 5.0;

/// Geometry the raymarched surface is drawn on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Shape {
    Quad,
    Triangle,
    Circle,
}

impl Shape {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "quad" => Some(Shape::Quad),
            "triangle" => Some(Shape::Triangle),
            "circle" => Some(Shape::Circle),
            _ => None,
        }
    }

    fn mesh(self) -> Result<Mesh> {
        match self {
            Shape::Quad => Mesh::from_2d(
                &[
                    Vec2::new(-1.0, -1.0),
                    Vec2::new(-1.0, 1.0),
                    Vec2::new(1.0, 1.0),
                    Vec2::new(1.0, -1.0),
                ],
                &[[0, 1, 2], [0, 2, 3]],
                false,
            ),
            Shape::Triangle => Mesh::from_2d(
                &[
                    Vec2::new(-1.0, -1.0),
                    Vec2::new(0.0, 1.0),
                    Vec2::new(1.0, -1.0),
                ],
                &[[0, 1, 2]],
                false,
            ),
            Shape::Circle => circle_mesh(1.0, 64),
        }
    }
}

/// Loads the raymarching shaders on its first update and spawns the object
/// that renders them.
pub struct RaymarchLoader {
    shader_dir: PathBuf,
    shape: Shape,
    spawned: bool,
}

impl RaymarchLoader {
    pub fn new(shader_dir: impl Into<PathBuf>, shape: Shape) -> Self {
        Self {
            shader_dir: shader_dir.into(),
            shape,
            spawned: false,
        }
    }

    async fn spawn(&mut self, ctx: &mut SceneCtx) -> Result<()> {
        let dir = self.shader_dir.clone();
        let shader = Shader::load_from(
            |name: &str| future::ready(std::fs::read_to_string(dir.join(name))),
            VERTEX_SHADER,
            FRAGMENT_SHADER,
        )
        .await?;

        let transform = Transform::new(ctx.pointer(), 0.0, Vec2::splat(SHAPE_SCALE));
        let object = GameObject::new()
            .with_component(RaymarchDriver)
            .with_component(transform)
            .with_component(self.shape.mesh()?)
            .with_component(Material::new(shader));

        ctx.spawn(OBJECT_NAME, object);
        log::info!(
            "spawned {OBJECT_NAME} ({:?}) from {}",
            self.shape,
            self.shader_dir.display()
        );
        Ok(())
    }
}

impl Component for RaymarchLoader {
    fn on_update<'a>(
        &'a mut self,
        ctx: &'a mut SceneCtx,
        _object: &'a mut GameObject,
    ) -> LocalBoxFuture<'a, Result<()>> {
        async move {
            if !self.spawned {
                self.spawn(ctx).await?;
                self.spawned = true;
            }
            Ok(())
        }
        .boxed_local()
    }
}

/// Follows the pointer, spins with time and feeds the raymarching uniforms.
///
/// Sits before the object's [`Transform`] so the model matrix it publishes
/// reflects this tick's position.
pub struct RaymarchDriver;

impl Component for RaymarchDriver {
    fn on_update<'a>(
        &'a mut self,
        ctx: &'a mut SceneCtx,
        object: &'a mut GameObject,
    ) -> LocalBoxFuture<'a, Result<()>> {
        let size = ctx.surface_size();
        let time = ctx.time();

        if let Some(transform) = object.get_component_mut::<Transform>() {
            transform.set_position(ctx.pointer());
            transform.set_rotation(time);
        }

        if let Some(material) = object.get_component_mut::<Material>() {
            material.set_uniform("p_mat", Uniform::mat3(Mat3::projection(size.x(), size.y())));
            material.set_uniform("iTime", Uniform::float(time));
            material.set_uniform("iResolution", Uniform::vec2(size));
            material.set_uniform("blendForce", Uniform::float(BLEND_FORCE));
        }

        future::ready(Ok(())).boxed_local()
    }
}

/// Default shader directory of this crate.
pub fn bundled_shaders() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders"))
}
