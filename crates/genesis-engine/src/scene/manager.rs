use crate::error::Result;

use super::Scene;

/// Holds the active scene and forwards host events to it.
#[derive(Default)]
pub struct SceneManager {
    current: Option<Scene>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroys the active scene (if any), sets up `scene` and makes it active.
    pub fn use_scene(&mut self, mut scene: Scene) -> Result<()> {
        if let Some(mut old) = self.current.take() {
            old.destroy();
        }
        scene.setup()?;
        self.current = Some(scene);
        Ok(())
    }

    #[inline]
    pub fn current(&self) -> Option<&Scene> {
        self.current.as_ref()
    }

    #[inline]
    pub fn current_mut(&mut self) -> Option<&mut Scene> {
        self.current.as_mut()
    }

    /// Destroys the active scene.
    pub fn clear(&mut self) {
        if let Some(mut scene) = self.current.take() {
            scene.destroy();
        }
    }

    /// Ticks the active scene; without one this does nothing.
    pub async fn tick(&mut self, time: f32) -> Result<()> {
        match self.current.as_mut() {
            Some(scene) => scene.tick(time).await,
            None => Ok(()),
        }
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        if let Some(scene) = self.current.as_mut() {
            scene.on_resize(width, height);
        }
    }

    pub fn on_pointer_moved(&mut self, x: f32, y: f32) {
        if let Some(scene) = self.current.as_mut() {
            scene.on_pointer_moved(x, y);
        }
    }
}
