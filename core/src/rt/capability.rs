use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use super::Runtime;
use crate::node::RootNode;
use crate::target::CallTarget;
use crate::val::Val;

/// Type-indexed table of optional runtime services.
///
/// Values are stored once and cloned out on lookup, so registered types are
/// usually cheap handles (`Arc<..>` or small config structs).
#[derive(Default)]
pub struct CapabilityRegistry {
    entries: DashMap<TypeId, Box<dyn Any + Send + Sync>, FxBuildHasher>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value`, replacing any earlier capability of the same type.
    pub fn register<T>(&self, value: T)
    where
        T: Any + Send + Sync,
    {
        tracing::debug!(target: "lkr::rt::capability", capability = std::any::type_name::<T>(), "registered");
        self.entries.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T>(&self) -> Option<T>
    where
        T: Any + Clone + Send + Sync,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value().downcast_ref::<T>().cloned())
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry").field("len", &self.len()).finish()
    }
}

/// Contributes capabilities while a runtime is being built.
pub trait CapabilityProvider: Send + Sync {
    fn name(&self) -> &str;

    fn enabled(&self) -> bool {
        true
    }

    fn register(&self, registry: &CapabilityRegistry) -> Result<()>;
}

/// Notified once for every call target the runtime creates.
pub trait LoadHook: Send + Sync {
    fn on_load(&self, target: &CallTarget);
}

/// Built-in load hook counting created targets. Available as the
/// `Arc<LoadCounter>` capability.
#[derive(Debug, Default)]
pub struct LoadCounter {
    total: AtomicU64,
    per_target: DashMap<u64, u64, FxBuildHasher>,
}

impl LoadCounter {
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn loads_of(&self, target: &CallTarget) -> u64 {
        self.per_target.get(&target.id()).map_or(0, |n| *n)
    }
}

impl LoadHook for LoadCounter {
    fn on_load(&self, target: &CallTarget) {
        self.total.fetch_add(1, Ordering::Relaxed);
        *self.per_target.entry(target.id()).or_insert(0) += 1;
    }
}

/// Helpers for harnesses that drive routines directly. Built on demand by
/// `Runtime::capability::<TestSupport>()`.
#[derive(Clone, Debug)]
pub struct TestSupport {
    runtime: Runtime,
}

impl TestSupport {
    pub(crate) fn new(runtime: Runtime) -> Self {
        Self { runtime }
    }

    pub fn create_test_call_target(&self, root: Arc<dyn RootNode>) -> CallTarget {
        self.runtime.create_call_target(root)
    }

    /// There is no compiler to warm up, so this only records the request.
    pub fn finish_warmup(&self, target: &CallTarget, test_name: &str) {
        tracing::trace!(
            target: "lkr::rt::capability",
            target_name = target.name(),
            test_name,
            "warmup finished"
        );
    }
}

/// Compilation knobs. The interpreter recognizes none of them.
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    _private: (),
}

impl CompilerOptions {
    pub fn supports_option(&self, _name: &str) -> bool {
        false
    }

    /// Unsupported options are ignored.
    pub fn set_option(&mut self, name: &str, value: Val) {
        tracing::trace!(target: "lkr::rt::capability", option = name, value = %value, "compiler option ignored");
    }
}
