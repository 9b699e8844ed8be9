use indexmap::IndexMap;

use crate::device::Device;
use crate::error::Result;
use crate::math::{Color, Vec2};
use crate::time::FrameClock;

use super::ctx::SceneCommand;
use super::{GameObject, SceneCtx};

/// Scene configuration.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Color the surface is cleared to at the start of the render phase.
    pub clear_color: Color,

    /// Name used in log messages.
    pub label: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::black(),
            label: "scene".to_string(),
        }
    }
}

/// Named game objects plus the frame loop that drives them.
///
/// Object names are unique; iteration follows registration order.
pub struct Scene {
    config: SceneConfig,
    objects: IndexMap<String, GameObject>,
    ctx: SceneCtx,
    clock: FrameClock,
    initialized: bool,
}

impl Scene {
    pub fn new(device: Box<dyn Device>, config: SceneConfig) -> Self {
        Self {
            config,
            objects: IndexMap::new(),
            ctx: SceneCtx::new(device),
            clock: FrameClock::new(),
            initialized: false,
        }
    }

    /// Replaces the frame clock, e.g. to clamp deltas.
    pub fn with_clock(mut self, clock: FrameClock) -> Self {
        self.clock = clock;
        self
    }

    #[inline]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    #[inline]
    pub fn ctx(&self) -> &SceneCtx {
        &self.ctx
    }

    #[inline]
    pub fn ctx_mut(&mut self) -> &mut SceneCtx {
        &mut self.ctx
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Reads the surface size and runs `on_init` on every registered object.
    ///
    /// Objects added afterwards are initialised as they are added. Calling
    /// this again is a no-op.
    pub fn setup(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        let size = self.ctx.device().surface_size();
        self.ctx.set_surface_size(size);

        for object in self.objects.values_mut() {
            object.on_init(&mut self.ctx)?;
        }
        self.initialized = true;
        self.apply_commands()?;

        log::info!(
            "scene `{}` set up with {} objects",
            self.config.label,
            self.objects.len()
        );
        Ok(())
    }

    /// Registers `object` under `name`.
    ///
    /// Returns `Ok(false)` (and keeps the existing object) if the name is
    /// taken. In a set-up scene the new object is initialised immediately;
    /// if that fails it gets `on_destroy` and is not registered.
    pub fn add_game_object(
        &mut self,
        name: impl Into<String>,
        mut object: GameObject,
    ) -> Result<bool> {
        let name = name.into();
        if self.objects.contains_key(&name) {
            log::warn!("scene `{}` already has an object named `{name}`", self.config.label);
            return Ok(false);
        }

        if self.initialized {
            if let Err(err) = object.on_init(&mut self.ctx) {
                log::warn!("object `{name}` failed to initialise: {err}");
                object.on_destroy(&mut self.ctx);
                return Err(err);
            }
        }
        self.objects.insert(name, object);
        Ok(true)
    }

    /// Runs the object's `on_destroy` and unregisters it.
    pub fn remove_game_object(&mut self, name: &str) -> bool {
        let Some(mut object) = self.objects.shift_remove(name) else {
            log::warn!("scene `{}` has no object named `{name}`", self.config.label);
            return false;
        };
        object.on_destroy(&mut self.ctx);
        true
    }

    pub fn get_game_object(&self, name: &str) -> Option<&GameObject> {
        let found = self.objects.get(name);
        if found.is_none() {
            log::warn!("scene `{}` has no object named `{name}`", self.config.label);
        }
        found
    }

    pub fn get_game_object_mut(&mut self, name: &str) -> Option<&mut GameObject> {
        let found = self.objects.get_mut(name);
        if found.is_none() {
            log::warn!("scene `{}` has no object named `{name}`", self.config.label);
        }
        found
    }

    #[inline]
    pub fn has_game_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Object names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // ── frame loop ────────────────────────────────────────────────────────

    /// Runs one frame at host timestamp `time` (seconds).
    ///
    /// The whole update pass is awaited before any object enters
    /// `on_before_render`; the render phases never suspend.
    pub async fn tick(&mut self, time: f32) -> Result<()> {
        if !self.initialized {
            self.setup()?;
        }

        let frame = self.clock.advance(time);
        self.ctx.set_time(frame);

        for object in self.objects.values_mut() {
            object.on_update(&mut self.ctx).await?;
        }
        self.apply_commands()?;

        for object in self.objects.values_mut() {
            object.on_before_render(&mut self.ctx)?;
        }

        self.render()?;

        for object in self.objects.values_mut() {
            object.on_after_render(&mut self.ctx)?;
        }

        self.ctx.device().present()?;
        Ok(())
    }

    /// Runs `on_destroy` on every object and empties the scene.
    pub fn destroy(&mut self) {
        for (_, mut object) in self.objects.drain(..) {
            object.on_destroy(&mut self.ctx);
        }
        self.ctx.commands.clear();
        self.initialized = false;
        log::info!("scene `{}` destroyed", self.config.label);
    }

    // ── observers ─────────────────────────────────────────────────────────

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.ctx.device().resize(width, height);
        self.ctx.set_surface_size((width, height));
    }

    pub fn on_pointer_moved(&mut self, x: f32, y: f32) {
        self.ctx.set_pointer(Vec2::new(x, y));
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn render(&mut self) -> Result<()> {
        let (width, height) = self.ctx.surface_size_px();
        let device = self.ctx.device();
        device.viewport(width, height)?;
        device.clear(self.config.clear_color)?;

        for object in self.objects.values_mut() {
            object.on_render(&mut self.ctx)?;
        }
        Ok(())
    }

    fn apply_commands(&mut self) -> Result<()> {
        while !self.ctx.commands.is_empty() {
            for command in std::mem::take(&mut self.ctx.commands) {
                match command {
                    SceneCommand::Spawn(name, object) => {
                        self.add_game_object(name, object)?;
                    }
                    SceneCommand::Despawn(name) => {
                        self.remove_game_object(&name);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures::future::{FutureExt, LocalBoxFuture};

    use super::*;
    use crate::device::recording::{Call, RecordingDevice};
    use crate::device::{ShaderCompileError, ShaderStage};
    use crate::error::Error;
    use crate::material::{Material, Shader};
    use crate::scene::Component;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every hook as `tag:phase`.
    struct Tracer {
        tag: &'static str,
        log: Log,
    }

    impl Tracer {
        fn push(&self, phase: &str) {
            self.log.borrow_mut().push(format!("{}:{phase}", self.tag));
        }
    }

    impl Component for Tracer {
        fn on_init(&mut self, _ctx: &mut SceneCtx, _object: &mut GameObject) -> Result<()> {
            self.push("init");
            Ok(())
        }

        fn on_update<'a>(
            &'a mut self,
            _ctx: &'a mut SceneCtx,
            _object: &'a mut GameObject,
        ) -> LocalBoxFuture<'a, Result<()>> {
            async move {
                yield_once().await;
                self.push("update");
                Ok(())
            }
            .boxed_local()
        }

        fn on_before_render(&mut self, _ctx: &mut SceneCtx, _object: &mut GameObject) -> Result<()> {
            self.push("before");
            Ok(())
        }

        fn on_render(&mut self, _ctx: &mut SceneCtx, _object: &mut GameObject) -> Result<()> {
            self.push("render");
            Ok(())
        }

        fn on_after_render(&mut self, _ctx: &mut SceneCtx, _object: &mut GameObject) -> Result<()> {
            self.push("after");
            Ok(())
        }

        fn on_destroy(&mut self, _ctx: &mut SceneCtx, _object: &mut GameObject) {
            self.push("destroy");
        }
    }

    /// Suspends once before completing.
    async fn yield_once() {
        let mut yielded = false;
        futures::future::poll_fn(|cx| {
            if yielded {
                std::task::Poll::Ready(())
            } else {
                yielded = true;
                cx.waker().wake_by_ref();
                std::task::Poll::Pending
            }
        })
        .await
    }

    /// Spawns a child object on its first update.
    struct Spawner {
        log: Log,
        spawned: bool,
    }

    impl Component for Spawner {
        fn on_update<'a>(
            &'a mut self,
            ctx: &'a mut SceneCtx,
            _object: &'a mut GameObject,
        ) -> LocalBoxFuture<'a, Result<()>> {
            if !self.spawned {
                self.spawned = true;
                let child = GameObject::new().with_component(Tracer {
                    tag: "child",
                    log: self.log.clone(),
                });
                ctx.spawn("child", child);
            }
            futures::future::ready(Ok(())).boxed_local()
        }
    }

    /// Fails its update without suspending.
    struct Broken;

    impl Component for Broken {
        fn on_update<'a>(
            &'a mut self,
            _ctx: &'a mut SceneCtx,
            _object: &'a mut GameObject,
        ) -> LocalBoxFuture<'a, Result<()>> {
            futures::future::ready(Err(Error::UncompiledMaterial)).boxed_local()
        }
    }

    fn traced(tag: &'static str, log: &Log) -> GameObject {
        GameObject::new().with_component(Tracer {
            tag,
            log: log.clone(),
        })
    }

    fn scene(device: &RecordingDevice) -> Scene {
        Scene::new(device.boxed(), SceneConfig::default())
    }

    // ── registration ──────────────────────────────────────────────────────

    #[test]
    fn duplicate_name_keeps_first_object() {
        let device = RecordingDevice::new();
        let log = Log::default();
        let mut scene = scene(&device);

        assert!(scene.add_game_object("a", traced("first", &log)).unwrap());
        assert!(!scene.add_game_object("a", GameObject::new()).unwrap());

        let kept = scene.get_game_object("a").unwrap();
        assert!(kept.has_component::<Tracer>());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn objects_added_before_setup_are_initialised_by_setup() {
        let device = RecordingDevice::new();
        let log = Log::default();
        let mut scene = scene(&device);

        scene.add_game_object("a", traced("a", &log)).unwrap();
        assert!(log.borrow().is_empty());

        scene.setup().unwrap();
        scene.setup().unwrap();
        assert_eq!(*log.borrow(), vec!["a:init"]);
    }

    #[test]
    fn objects_added_after_setup_init_alone() {
        let device = RecordingDevice::new();
        let log = Log::default();
        let mut scene = scene(&device);
        scene.add_game_object("a", traced("a", &log)).unwrap();
        scene.setup().unwrap();

        scene.add_game_object("b", traced("b", &log)).unwrap();
        assert_eq!(*log.borrow(), vec!["a:init", "b:init"]);
    }

    #[test]
    fn object_failing_init_is_not_registered() {
        let device = RecordingDevice::new()
            .failing_compile(ShaderCompileError::new(ShaderStage::Fragment, "bad token"));
        let log = Log::default();
        let mut scene = scene(&device);
        scene.setup().unwrap();

        let object = traced("quad", &log).with_component(Material::new(Shader::new("vs", "fs")));
        let err = scene.add_game_object("quad", object).unwrap_err();

        assert!(matches!(err, Error::ShaderCompile { stage: ShaderStage::Fragment, .. }));
        assert!(!scene.has_game_object("quad"));
        assert_eq!(*log.borrow(), vec!["quad:init", "quad:destroy"]);
        pollster::block_on(scene.tick(0.0)).unwrap();
        pollster::block_on(scene.tick(0.1)).unwrap();
    }

    #[test]
    fn missing_objects_are_not_errors() {
        let device = RecordingDevice::new();
        let mut scene = scene(&device);
        assert!(scene.get_game_object("ghost").is_none());
        assert!(scene.get_game_object_mut("ghost").is_none());
        assert!(!scene.remove_game_object("ghost"));
    }

    #[test]
    fn remove_runs_on_destroy() {
        let device = RecordingDevice::new();
        let log = Log::default();
        let mut scene = scene(&device);
        scene.add_game_object("a", traced("a", &log)).unwrap();

        assert!(scene.remove_game_object("a"));
        assert!(!scene.has_game_object("a"));
        assert_eq!(*log.borrow(), vec!["a:destroy"]);
    }

    // ── frame loop ────────────────────────────────────────────────────────

    #[test]
    fn phases_complete_across_all_objects_before_the_next() {
        let device = RecordingDevice::new();
        let log = Log::default();
        let mut scene = scene(&device);
        scene.add_game_object("a", traced("a", &log)).unwrap();
        scene.add_game_object("b", traced("b", &log)).unwrap();
        scene.setup().unwrap();
        log.borrow_mut().clear();

        pollster::block_on(scene.tick(0.016)).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "a:update", "b:update", "a:before", "b:before", "a:render", "b:render",
                "a:after", "b:after",
            ]
        );
    }

    #[test]
    fn update_error_ends_the_tick_before_rendering() {
        let device = RecordingDevice::new();
        let log = Log::default();
        let mut scene = scene(&device);
        scene.add_game_object("a", traced("a", &log)).unwrap();
        scene
            .add_game_object("broken", GameObject::new().with_component(Broken))
            .unwrap();
        scene.add_game_object("b", traced("b", &log)).unwrap();
        scene.setup().unwrap();
        log.borrow_mut().clear();

        let err = pollster::block_on(scene.tick(0.016)).unwrap_err();

        assert!(matches!(err, Error::UncompiledMaterial));
        assert_eq!(*log.borrow(), vec!["a:update"]);
        assert!(!device.calls().contains(&Call::Present));
        assert_eq!(device.count(|c| matches!(c, Call::Clear(_))), 0);
        assert!(scene.get_game_object("broken").unwrap().has_component::<Broken>());
    }

    #[test]
    fn render_phase_sets_viewport_and_clears_first() {
        let device = RecordingDevice::new();
        let mut scene = scene(&device);
        scene.setup().unwrap();

        pollster::block_on(scene.tick(1.0)).unwrap();

        assert_eq!(
            device.calls(),
            vec![
                Call::Viewport(800, 600),
                Call::Clear(Color::black()),
                Call::Present
            ]
        );
    }

    #[test]
    fn clock_tracks_delta_time() {
        let device = RecordingDevice::new();
        let mut scene = scene(&device);

        pollster::block_on(scene.tick(2.0)).unwrap();
        pollster::block_on(scene.tick(2.5)).unwrap();

        assert_eq!(scene.ctx().time(), 2.5);
        assert_eq!(scene.ctx().delta_time(), 0.5);
        assert_eq!(scene.ctx().frame().frame_index, 1);
    }

    #[test]
    fn spawned_objects_join_the_same_tick() {
        let device = RecordingDevice::new();
        let log = Log::default();
        let mut scene = scene(&device);
        let spawner = GameObject::new().with_component(Spawner {
            log: log.clone(),
            spawned: false,
        });
        scene.add_game_object("spawner", spawner).unwrap();

        pollster::block_on(scene.tick(0.0)).unwrap();

        assert!(scene.has_game_object("child"));
        assert_eq!(
            *log.borrow(),
            vec!["child:init", "child:before", "child:render", "child:after"]
        );
    }

    #[test]
    fn destroy_empties_the_scene() {
        let device = RecordingDevice::new();
        let log = Log::default();
        let mut scene = scene(&device);
        scene.add_game_object("a", traced("a", &log)).unwrap();
        scene.add_game_object("b", traced("b", &log)).unwrap();
        scene.setup().unwrap();
        log.borrow_mut().clear();

        scene.destroy();
        assert!(scene.is_empty());
        assert!(!scene.is_initialized());
        assert_eq!(*log.borrow(), vec!["a:destroy", "b:destroy"]);
    }

    // ── observers ─────────────────────────────────────────────────────────

    #[test]
    fn observers_update_context() {
        let device = RecordingDevice::new();
        let mut scene = scene(&device);
        scene.on_resize(1024, 768);
        scene.on_pointer_moved(10.0, 20.0);

        assert_eq!(scene.ctx().surface_size(), Vec2::new(1024.0, 768.0));
        assert_eq!(scene.ctx().pointer(), Vec2::new(10.0, 20.0));
        assert!(device.calls().contains(&Call::Resize(1024, 768)));
    }
}
