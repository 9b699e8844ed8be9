use crate::device::Device;
use crate::math::Vec2;
use crate::time::FrameTime;

use super::GameObject;

pub(super) enum SceneCommand {
    Spawn(String, GameObject),
    Despawn(String),
}

/// Scene state visible to components during lifecycle hooks.
///
/// Spawn/despawn requests are buffered and applied by the scene after the
/// current update pass (or after setup, when issued from `on_init`).
pub struct SceneCtx {
    device: Box<dyn Device>,
    time: FrameTime,
    pointer: Vec2,
    surface_size: (u32, u32),
    pub(super) commands: Vec<SceneCommand>,
}

impl SceneCtx {
    pub fn new(device: Box<dyn Device>) -> Self {
        let surface_size = device.surface_size();
        Self {
            device,
            time: FrameTime::default(),
            pointer: Vec2::zero(),
            surface_size,
            commands: Vec::new(),
        }
    }

    #[inline]
    pub fn device(&mut self) -> &mut dyn Device {
        self.device.as_mut()
    }

    /// Host timestamp of the current tick, in seconds.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time.time
    }

    /// Seconds since the previous tick.
    #[inline]
    pub fn delta_time(&self) -> f32 {
        self.time.dt
    }

    #[inline]
    pub fn frame(&self) -> FrameTime {
        self.time
    }

    /// Last known pointer position in physical pixels.
    #[inline]
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Drawable size in physical pixels.
    #[inline]
    pub fn surface_size(&self) -> Vec2 {
        Vec2::new(self.surface_size.0 as f32, self.surface_size.1 as f32)
    }

    #[inline]
    pub fn surface_size_px(&self) -> (u32, u32) {
        self.surface_size
    }

    pub fn spawn(&mut self, name: impl Into<String>, object: GameObject) {
        self.commands.push(SceneCommand::Spawn(name.into(), object));
    }

    pub fn despawn(&mut self, name: impl Into<String>) {
        self.commands.push(SceneCommand::Despawn(name.into()));
    }

    pub(super) fn set_time(&mut self, time: FrameTime) {
        self.time = time;
    }

    pub(super) fn set_pointer(&mut self, pointer: Vec2) {
        self.pointer = pointer;
    }

    pub(super) fn set_surface_size(&mut self, size: (u32, u32)) {
        self.surface_size = size;
    }
}
