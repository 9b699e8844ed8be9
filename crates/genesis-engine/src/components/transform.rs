use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::error::Result;
use crate::material::{Material, Uniform};
use crate::math::{Mat3, Vec2};
use crate::scene::{Component, GameObject, SceneCtx};

/// Uniform the model matrix is published under.
pub const MODEL_UNIFORM: &str = "m_mat";

/// 2D position, rotation and scale of a game object.
///
/// The model matrix is cached: setters only mark it stale, and it is rebuilt
/// on the next [`Transform::model_matrix`] call or update. Every update
/// publishes it to the owner's [`Material`] as [`MODEL_UNIFORM`].
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec2,
    rotation: f32,
    scale: Vec2,
    model: Mat3,
    dirty: bool,
    recomputes: u64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::zero(),
            rotation: 0.0,
            scale: Vec2::splat(1.0),
            model: Mat3::identity(),
            dirty: false,
            recomputes: 0,
        }
    }
}

impl Transform {
    pub fn new(position: Vec2, rotation: f32, scale: Vec2) -> Self {
        Self {
            position,
            rotation,
            scale,
            dirty: true,
            ..Self::default()
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Rotation in radians.
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    #[inline]
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.dirty = true;
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
        self.dirty = true;
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// How many times the model matrix has been rebuilt.
    #[inline]
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    /// `scaling · rotation · translation`, rebuilt only when stale.
    pub fn model_matrix(&mut self) -> Mat3 {
        if self.dirty {
            self.model = Mat3::scaling(self.scale)
                * Mat3::rotation(self.rotation)
                * Mat3::translation(self.position);
            self.dirty = false;
            self.recomputes += 1;
        }
        self.model
    }
}

impl Component for Transform {
    fn on_update<'a>(
        &'a mut self,
        _ctx: &'a mut SceneCtx,
        object: &'a mut GameObject,
    ) -> LocalBoxFuture<'a, Result<()>> {
        let model = self.model_matrix();
        if object.has_component::<Material>() {
            if let Some(material) = object.get_component_mut::<Material>() {
                material.set_uniform(MODEL_UNIFORM, Uniform::mat3(model));
            }
        }
        future::ready(Ok(())).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::device::recording::RecordingDevice;
    use crate::material::Shader;

    fn expected(position: Vec2, rotation: f32, scale: Vec2) -> Mat3 {
        Mat3::scaling(scale) * Mat3::rotation(rotation) * Mat3::translation(position)
    }

    #[test]
    fn setters_mark_dirty_and_recompute_once() {
        let mut t = Transform::default();
        assert!(!t.is_dirty());
        assert_eq!(t.model_matrix(), Mat3::identity());
        assert_eq!(t.recompute_count(), 0);

        t.set_position(Vec2::new(3.0, 4.0));
        t.set_rotation(FRAC_PI_2);
        t.set_scale(Vec2::new(2.0, 2.0));
        assert!(t.is_dirty());

        let first = t.model_matrix();
        let second = t.model_matrix();
        assert_eq!(first, second);
        assert_eq!(t.recompute_count(), 1);
    }

    #[test]
    fn model_matches_direct_composition() {
        let (p, r, s) = (Vec2::new(5.0, -2.0), 0.3, Vec2::new(1.5, 0.5));
        let mut t = Transform::new(p, r, s);
        assert!(t.model_matrix().approx_eq(&expected(p, r, s), 1e-6));

        t.set_rotation(1.2);
        assert!(t.model_matrix().approx_eq(&expected(p, 1.2, s), 1e-6));
        assert_eq!(t.recompute_count(), 2);
    }

    #[test]
    fn composition_order_scales_before_translating() {
        let mut t = Transform::new(Vec2::new(10.0, 0.0), 0.0, Vec2::new(2.0, 2.0));
        let p = t.model_matrix().transform_point(Vec2::new(1.0, 1.0));
        assert_eq!(p, Vec2::new(12.0, 2.0));
    }

    #[test]
    fn update_publishes_model_to_sibling_material() {
        let device = RecordingDevice::new();
        let mut ctx = SceneCtx::new(device.boxed());
        let mut object = GameObject::new().with_component(Material::new(Shader::new("vs", "fs")));
        let mut t = Transform::new(Vec2::new(1.0, 2.0), 0.0, Vec2::splat(1.0));

        pollster::block_on(t.on_update(&mut ctx, &mut object)).unwrap();
        pollster::block_on(t.on_update(&mut ctx, &mut object)).unwrap();

        let material = object.get_component::<Material>().unwrap();
        let published = material.uniform(MODEL_UNIFORM).unwrap();
        assert_eq!(published.data(), Mat3::translation(Vec2::new(1.0, 2.0)).as_flat());
        assert_eq!(t.recompute_count(), 1);
    }

    #[test]
    fn update_without_material_only_recomputes() {
        let device = RecordingDevice::new();
        let mut ctx = SceneCtx::new(device.boxed());
        let mut object = GameObject::new();
        let mut t = Transform::new(Vec2::new(1.0, 0.0), 0.0, Vec2::splat(1.0));

        pollster::block_on(t.on_update(&mut ctx, &mut object)).unwrap();
        assert!(!t.is_dirty());
        assert!(object.is_empty());
    }
}
