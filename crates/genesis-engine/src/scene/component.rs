use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::error::Result;

use super::{GameObject, SceneCtx};

/// Per-object behavior driven by the scene's frame loop.
///
/// Hooks receive the scene context and the owning object. While a hook runs,
/// the component is detached from its owner, so it can freely borrow sibling
/// components through `object` but will not find itself there.
///
/// Per tick the scene calls, for every object in registration order:
/// `on_update` (awaited for all objects first), then `on_before_render`,
/// `on_render` and `on_after_render`. `on_init` runs once when the object
/// enters a set-up scene, `on_destroy` when it leaves.
pub trait Component: Any {
    fn on_init(&mut self, ctx: &mut SceneCtx, object: &mut GameObject) -> Result<()> {
        let _ = (ctx, object);
        Ok(())
    }

    /// The only phase allowed to suspend.
    fn on_update<'a>(
        &'a mut self,
        ctx: &'a mut SceneCtx,
        object: &'a mut GameObject,
    ) -> LocalBoxFuture<'a, Result<()>> {
        let _ = (ctx, object);
        future::ready(Ok(())).boxed_local()
    }

    fn on_before_render(&mut self, ctx: &mut SceneCtx, object: &mut GameObject) -> Result<()> {
        let _ = (ctx, object);
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut SceneCtx, object: &mut GameObject) -> Result<()> {
        let _ = (ctx, object);
        Ok(())
    }

    fn on_after_render(&mut self, ctx: &mut SceneCtx, object: &mut GameObject) -> Result<()> {
        let _ = (ctx, object);
        Ok(())
    }

    /// Releases device resources. Cannot fail.
    fn on_destroy(&mut self, ctx: &mut SceneCtx, object: &mut GameObject) {
        let _ = (ctx, object);
    }
}

/// Type identity of a component; a game object holds at most one per kind.
#[derive(Copy, Clone)]
pub struct ComponentKind {
    id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentKind {}

impl Hash for ComponentKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub(super) fn downcast_ref<T: Component>(component: &dyn Component) -> Option<&T> {
    let any: &dyn Any = component;
    any.downcast_ref::<T>()
}

pub(super) fn downcast_mut<T: Component>(component: &mut dyn Component) -> Option<&mut T> {
    let any: &mut dyn Any = component;
    any.downcast_mut::<T>()
}
