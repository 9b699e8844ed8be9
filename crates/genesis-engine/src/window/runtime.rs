use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::gpu::{Gpu, GpuInit, WgpuDevice};
use crate::scene::{Scene, SceneConfig, SceneManager};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "genesis".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens a window and runs one scene in it until the window closes.
    ///
    /// `setup` receives the freshly built scene before its first tick, which
    /// is where the caller adds its game objects. The scene's clock is fed
    /// seconds since the window opened.
    pub fn run<S>(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        scene_config: SceneConfig,
        setup: S,
    ) -> Result<()>
    where
        S: FnOnce(&mut Scene) -> Result<()> + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState {
            config,
            gpu_init,
            scene_config,
            setup: Some(setup),
            window: None,
            manager: SceneManager::new(),
            started: Instant::now(),
            failure: None,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct AppState<S> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    scene_config: SceneConfig,
    setup: Option<S>,

    window: Option<Arc<Window>>,
    manager: SceneManager,
    started: Instant,

    failure: Option<anyhow::Error>,
}

impl<S> AppState<S>
where
    S: FnOnce(&mut Scene) -> Result<()>,
{
    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let gpu = pollster::block_on(Gpu::new(window.clone(), self.gpu_init.clone()))
            .context("GPU initialization failed")?;
        let device = WgpuDevice::new(gpu);

        let mut scene = Scene::new(Box::new(device), self.scene_config.clone());
        if let Some(setup) = self.setup.take() {
            setup(&mut scene).context("scene setup callback failed")?;
        }
        self.manager
            .use_scene(scene)
            .context("failed to initialise scene")?;

        self.started = Instant::now();
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.shutdown(event_loop);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.manager.clear();
        self.window = None;
        event_loop.exit();
    }
}

impl<S> ApplicationHandler for AppState<S>
where
    S: FnOnce(&mut Scene) -> Result<()>,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.open(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; scenes animate every frame.
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("window closed");
                self.shutdown(event_loop);
            }

            WindowEvent::Resized(size) => {
                self.manager.on_resize(size.width, size.height);
                window.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = window.inner_size();
                self.manager.on_resize(size.width, size.height);
                window.request_redraw();
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.manager
                    .on_pointer_moved(position.x as f32, position.y as f32);
            }

            WindowEvent::RedrawRequested => {
                let time = self.started.elapsed().as_secs_f32();
                if let Err(err) = pollster::block_on(self.manager.tick(time)) {
                    let err = anyhow::Error::new(err).context("scene tick failed");
                    self.fail(event_loop, err);
                }
            }

            _ => {}
        }
    }
}
