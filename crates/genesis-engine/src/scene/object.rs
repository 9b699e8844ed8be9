use indexmap::IndexMap;

use crate::error::Result;

use super::component::{downcast_mut, downcast_ref};
use super::{Component, ComponentKind, SceneCtx};

type Slot = Option<Box<dyn Component>>;

/// Container of components, at most one per [`ComponentKind`].
///
/// Lifecycle broadcasts visit components in insertion order. Removing a kind
/// and adding it again moves it to the end.
#[derive(Default)]
pub struct GameObject {
    components: IndexMap<ComponentKind, Slot>,
}

impl GameObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`GameObject::add_component`].
    pub fn with_component<T: Component>(mut self, component: T) -> Self {
        self.add_component(component);
        self
    }

    /// Inserts `component`; returns `false` if its kind is already present,
    /// leaving the existing one untouched.
    pub fn add_component<T: Component>(&mut self, component: T) -> bool {
        let kind = ComponentKind::of::<T>();
        if self.components.contains_key(&kind) {
            log::warn!("component {kind:?} already present");
            return false;
        }
        self.components.insert(kind, Some(Box::new(component)));
        true
    }

    /// Replaces the component of the same kind; returns `false` if there is
    /// none to replace.
    pub fn set_component<T: Component>(&mut self, component: T) -> bool {
        let kind = ComponentKind::of::<T>();
        let Some(slot) = self.components.get_mut(&kind) else {
            log::warn!("cannot set component {kind:?}: not present");
            return false;
        };
        *slot = Some(Box::new(component));
        true
    }

    pub fn remove_component<T: Component>(&mut self) -> bool {
        let kind = ComponentKind::of::<T>();
        if self.components.shift_remove(&kind).is_none() {
            log::warn!("cannot remove component {kind:?}: not present");
            return false;
        }
        true
    }

    pub fn get_component<T: Component>(&self) -> Option<&T> {
        let kind = ComponentKind::of::<T>();
        match self.components.get(&kind) {
            Some(Some(component)) => downcast_ref::<T>(&**component),
            Some(None) => None,
            None => {
                log::warn!("component {kind:?} not present");
                None
            }
        }
    }

    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        let kind = ComponentKind::of::<T>();
        match self.components.get_mut(&kind) {
            Some(Some(component)) => downcast_mut::<T>(&mut **component),
            Some(None) => None,
            None => {
                log::warn!("component {kind:?} not present");
                None
            }
        }
    }

    #[inline]
    pub fn has_component<T: Component>(&self) -> bool {
        self.components.contains_key(&ComponentKind::of::<T>())
    }

    /// Kinds in broadcast order.
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.keys().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    pub fn on_init(&mut self, ctx: &mut SceneCtx) -> Result<()> {
        self.broadcast(ctx, |c, ctx, obj| c.on_init(ctx, obj))
    }

    pub async fn on_update(&mut self, ctx: &mut SceneCtx) -> Result<()> {
        for kind in self.snapshot() {
            let Some(mut held) = Detached::take(self, kind) else {
                continue;
            };
            let Detached { object, component, .. } = &mut held;
            if let Some(component) = component.as_deref_mut() {
                component.on_update(ctx, &mut **object).await?;
            }
        }
        Ok(())
    }

    pub fn on_before_render(&mut self, ctx: &mut SceneCtx) -> Result<()> {
        self.broadcast(ctx, |c, ctx, obj| c.on_before_render(ctx, obj))
    }

    pub fn on_render(&mut self, ctx: &mut SceneCtx) -> Result<()> {
        self.broadcast(ctx, |c, ctx, obj| c.on_render(ctx, obj))
    }

    pub fn on_after_render(&mut self, ctx: &mut SceneCtx) -> Result<()> {
        self.broadcast(ctx, |c, ctx, obj| c.on_after_render(ctx, obj))
    }

    pub fn on_destroy(&mut self, ctx: &mut SceneCtx) {
        // on_destroy is infallible, so this never returns Err.
        let _ = self.broadcast(ctx, |c, ctx, obj| {
            c.on_destroy(ctx, obj);
            Ok(())
        });
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn broadcast(
        &mut self,
        ctx: &mut SceneCtx,
        mut hook: impl FnMut(&mut dyn Component, &mut SceneCtx, &mut GameObject) -> Result<()>,
    ) -> Result<()> {
        for kind in self.snapshot() {
            let Some(mut held) = Detached::take(self, kind) else {
                continue;
            };
            let Detached { object, component, .. } = &mut held;
            if let Some(component) = component.as_deref_mut() {
                hook(component, ctx, &mut **object)?;
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> Vec<ComponentKind> {
        self.components.keys().copied().collect()
    }

    /// Puts a component back unless its hook removed or replaced it.
    fn reattach(&mut self, kind: ComponentKind, component: Box<dyn Component>) {
        if let Some(slot) = self.components.get_mut(&kind) {
            if slot.is_none() {
                *slot = Some(component);
            }
        }
    }
}

/// A component lifted out of its slot for the duration of one hook.
///
/// Dropping it reattaches the component, so an error return or a dropped
/// update future leaves the object whole.
struct Detached<'o> {
    object: &'o mut GameObject,
    kind: ComponentKind,
    component: Option<Box<dyn Component>>,
}

impl<'o> Detached<'o> {
    fn take(object: &'o mut GameObject, kind: ComponentKind) -> Option<Self> {
        let component = object.components.get_mut(&kind).and_then(Option::take)?;
        Some(Self {
            object,
            kind,
            component: Some(component),
        })
    }
}

impl Drop for Detached<'_> {
    fn drop(&mut self) {
        if let Some(component) = self.component.take() {
            self.object.reattach(self.kind, component);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures::future::{FutureExt, LocalBoxFuture};

    use super::*;
    use crate::device::recording::RecordingDevice;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Witness {
        tag: &'static str,
        log: Log,
    }

    impl Component for Witness {
        fn on_init(&mut self, _ctx: &mut SceneCtx, _object: &mut GameObject) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:init", self.tag));
            Ok(())
        }

        fn on_render(&mut self, _ctx: &mut SceneCtx, object: &mut GameObject) -> Result<()> {
            let sees_counter = object.get_component::<Counter>().is_some();
            self.log
                .borrow_mut()
                .push(format!("{}:render:{sees_counter}", self.tag));
            Ok(())
        }
    }

    #[derive(Default)]
    struct Counter(u32);

    impl Component for Counter {
        fn on_init(&mut self, _ctx: &mut SceneCtx, _object: &mut GameObject) -> Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    struct SelfRemover;

    impl Component for SelfRemover {
        fn on_init(&mut self, _ctx: &mut SceneCtx, object: &mut GameObject) -> Result<()> {
            object.remove_component::<SelfRemover>();
            Ok(())
        }
    }

    /// Never finishes its update.
    struct Stalled;

    impl Component for Stalled {
        fn on_update<'a>(
            &'a mut self,
            _ctx: &'a mut SceneCtx,
            _object: &'a mut GameObject,
        ) -> LocalBoxFuture<'a, Result<()>> {
            futures::future::pending().boxed_local()
        }
    }

    fn ctx() -> SceneCtx {
        SceneCtx::new(RecordingDevice::new().boxed())
    }

    // ── component set ─────────────────────────────────────────────────────

    #[test]
    fn add_then_duplicate_add() {
        let mut object = GameObject::new();
        assert!(object.add_component(Counter(7)));
        assert!(!object.add_component(Counter(1)));
        assert_eq!(object.get_component::<Counter>().unwrap().0, 7);
        assert_eq!(object.len(), 1);
    }

    #[test]
    fn set_requires_existing_kind() {
        let mut object = GameObject::new();
        assert!(!object.set_component(Counter(1)));
        assert!(!object.has_component::<Counter>());

        object.add_component(Counter(1));
        assert!(object.set_component(Counter(2)));
        assert_eq!(object.get_component::<Counter>().unwrap().0, 2);
    }

    #[test]
    fn remove_absent_kind_fails_quietly() {
        let mut object = GameObject::new();
        assert!(!object.remove_component::<Counter>());
        assert!(object.get_component::<Counter>().is_none());

        object.add_component(Counter(0));
        assert!(object.remove_component::<Counter>());
        assert!(!object.has_component::<Counter>());
    }

    #[test]
    fn get_mut_narrows_to_the_requested_kind() {
        let mut object = GameObject::new().with_component(Counter(0));
        object.get_component_mut::<Counter>().unwrap().0 = 5;
        assert_eq!(object.get_component::<Counter>().unwrap().0, 5);
        assert!(object.get_component::<SelfRemover>().is_none());
    }

    // ── broadcast ─────────────────────────────────────────────────────────

    #[test]
    fn hooks_run_in_insertion_order() {
        let log = Log::default();
        let mut object = GameObject::new()
            .with_component(Counter(0))
            .with_component(Witness { tag: "witness", log: log.clone() });
        let mut ctx = ctx();

        object.on_init(&mut ctx).unwrap();
        object.on_render(&mut ctx).unwrap();

        assert_eq!(object.get_component::<Counter>().unwrap().0, 1);
        assert_eq!(*log.borrow(), vec!["witness:init", "witness:render:true"]);
    }

    #[test]
    fn reinsertion_moves_component_to_the_end() {
        let mut object = GameObject::new()
            .with_component(Counter(0))
            .with_component(SelfRemover);
        object.remove_component::<Counter>();
        object.add_component(Counter(0));

        let kinds: Vec<ComponentKind> = object.kinds().collect();
        assert_eq!(
            kinds,
            vec![ComponentKind::of::<SelfRemover>(), ComponentKind::of::<Counter>()]
        );
    }

    #[test]
    fn component_may_remove_itself_during_a_hook() {
        let mut object = GameObject::new()
            .with_component(SelfRemover)
            .with_component(Counter(0));
        object.on_init(&mut ctx()).unwrap();

        assert!(!object.has_component::<SelfRemover>());
        assert_eq!(object.get_component::<Counter>().unwrap().0, 1);
    }

    #[test]
    fn abandoned_update_keeps_the_component() {
        let mut object = GameObject::new()
            .with_component(Counter(3))
            .with_component(Stalled);
        let mut ctx = ctx();

        assert!(object.on_update(&mut ctx).now_or_never().is_none());

        assert!(object.get_component::<Stalled>().is_some());
        assert!(!object.add_component(Stalled));
        assert_eq!(object.get_component::<Counter>().unwrap().0, 3);
        object.on_init(&mut ctx).unwrap();
        assert_eq!(object.get_component::<Counter>().unwrap().0, 4);
    }

    #[test]
    fn failing_hook_keeps_the_component() {
        struct Refuses;

        impl Component for Refuses {
            fn on_render(&mut self, _ctx: &mut SceneCtx, _object: &mut GameObject) -> Result<()> {
                Err(crate::error::Error::UncompiledMaterial)
            }
        }

        let mut object = GameObject::new().with_component(Refuses);
        assert!(object.on_render(&mut ctx()).is_err());
        assert!(object.get_component::<Refuses>().is_some());
    }
}
