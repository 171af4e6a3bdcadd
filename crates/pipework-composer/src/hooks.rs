//! Composition hooks.
//!
//! Hooks are called, in registration order, after every composition the
//! composer finishes, including compositions of targets without behaviors.
//! They observe the result; the composed type is shared and immutable.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use pipework_core::{ComposedType, Member};

type HookFn = dyn Fn(&Arc<ComposedType>, &str, &[Arc<ComposedType>], &IndexMap<String, Member>)
    + Send
    + Sync;

/// Callback run with `(composed, name, bases, members)`.
#[derive(Clone)]
pub struct CompositionHook(Arc<HookFn>);

impl CompositionHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Arc<ComposedType>, &str, &[Arc<ComposedType>], &IndexMap<String, Member>)
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, ty: &Arc<ComposedType>) {
        (self.0)(ty, ty.name(), ty.bases(), ty.members())
    }
}

impl fmt::Debug for CompositionHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompositionHook").finish_non_exhaustive()
    }
}
