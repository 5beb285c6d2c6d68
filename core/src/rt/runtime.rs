//! The runtime: factory for call targets, nodes, frames and assumptions, and
//! the entry point for call-stack introspection.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};

use super::capability::{CapabilityProvider, CapabilityRegistry, CompilerOptions, LoadCounter, LoadHook, TestSupport};
use super::config::{ConfigResult, RuntimeConfig};
use super::locator::Locator;
use super::stack::{self, StackGuard};
use crate::assumption::Assumption;
use crate::error::{RuntimeError, RuntimeResult};
use crate::frame::{Frame, FrameDescriptor, FrameInstance, FrameView};
use crate::node::{CallNode, DirectCallNode, IndirectCallNode, LoopNode, RepeatingNode, RootNode};
use crate::target::CallTarget;
use crate::val::Val;

static NEXT_RUNTIME_ID: AtomicU64 = AtomicU64::new(1);

struct RuntimeState {
    id: u64,
    config: RuntimeConfig,
    capabilities: CapabilityRegistry,
    load_hooks: Vec<Arc<dyn LoadHook>>,
    load_counter: Arc<LoadCounter>,
    locators: Vec<Arc<dyn Locator>>,
}

/// Shared handle on one runtime instance. Cheap to clone; every call target
/// keeps one.
#[derive(Clone)]
pub struct Runtime(Arc<RuntimeState>);

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::assemble(config, CapabilityRegistry::new(), Vec::new(), Vec::new())
    }

    /// Default configuration with `LKR_RT_*` overrides applied.
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self::with_config(RuntimeConfig::default().with_env_overrides()?))
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    fn assemble(
        config: RuntimeConfig,
        capabilities: CapabilityRegistry,
        mut load_hooks: Vec<Arc<dyn LoadHook>>,
        locators: Vec<Arc<dyn Locator>>,
    ) -> Self {
        let load_counter = Arc::new(LoadCounter::default());
        capabilities.register(Arc::clone(&load_counter));
        capabilities.register(config.clone());
        load_hooks.insert(0, Arc::clone(&load_counter) as Arc<dyn LoadHook>);

        let id = NEXT_RUNTIME_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            target: "lkr::rt::call",
            runtime_id = id,
            runtime_name = %config.name,
            max_call_depth = config.max_call_depth,
            "runtime created"
        );
        Self(Arc::new(RuntimeState {
            id,
            config,
            capabilities,
            load_hooks,
            load_counter,
            locators,
        }))
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.config.name
    }

    #[inline]
    pub fn config(&self) -> &RuntimeConfig {
        &self.0.config
    }

    pub fn create_call_target(&self, root: Arc<dyn RootNode>) -> CallTarget {
        let target = CallTarget::new(Arc::clone(&root), self.clone());
        root.attach_call_target(target.downgrade());
        for hook in &self.0.load_hooks {
            hook.on_load(&target);
        }
        tracing::debug!(target: "lkr::rt::call", target_id = target.id(), target_name = target.name(), "call target created");
        target
    }

    pub fn create_direct_call_node(&self, target: Option<CallTarget>) -> RuntimeResult<DirectCallNode> {
        match target {
            Some(target) => Ok(DirectCallNode::new(target)),
            None => Err(RuntimeError::invalid_argument("direct call node requires a call target")),
        }
    }

    pub fn create_indirect_call_node(&self) -> IndirectCallNode {
        IndirectCallNode::new()
    }

    pub fn create_loop_node(&self, repeating: Arc<dyn RepeatingNode>) -> RuntimeResult<LoopNode> {
        LoopNode::new(repeating)
    }

    pub fn create_assumption(&self, name: Option<&str>) -> Assumption {
        Assumption::new(name)
    }

    pub fn create_virtual_frame(&self, arguments: Vec<Val>, descriptor: Arc<FrameDescriptor>) -> Frame {
        Frame::new(descriptor, arguments, FrameView::Virtual)
    }

    /// An escapable frame. Without a descriptor the frame has no slots.
    pub fn create_materialized_frame(&self, arguments: Vec<Val>, descriptor: Option<Arc<FrameDescriptor>>) -> Frame {
        let descriptor = descriptor.unwrap_or_else(|| Arc::new(FrameDescriptor::new()));
        Frame::new(descriptor, arguments, FrameView::Materialized)
    }

    pub fn create_compiler_options(&self) -> CompilerOptions {
        CompilerOptions::default()
    }

    /// Walks the current thread's activations from the innermost outwards and
    /// returns the first non-`None` result of `visitor`. Activations past that
    /// point are never visited.
    pub fn iterate_frames<T, F>(&self, mut visitor: F) -> Option<T>
    where
        F: FnMut(&FrameInstance) -> Option<T>,
    {
        let top = stack::current(self.0.id)?;
        top.iter().find_map(|instance| visitor(&instance))
    }

    pub fn current_frame(&self) -> Option<FrameInstance> {
        stack::current(self.0.id)
    }

    pub fn caller_frame(&self) -> Option<FrameInstance> {
        stack::current(self.0.id).and_then(|top| top.caller().cloned())
    }

    /// Snapshot of the current thread's activations, innermost first.
    pub fn stack_trace(&self) -> Vec<StackTraceElement> {
        let mut trace = Vec::new();
        self.iterate_frames::<(), _>(|instance| {
            trace.push(StackTraceElement {
                target: instance.call_target().clone(),
                call_node: instance.call_node().cloned(),
                depth: instance.depth(),
            });
            None
        });
        trace
    }

    /// Looks up an optional service by type. `TestSupport` is always available.
    pub fn capability<T>(&self) -> Option<T>
    where
        T: Any + Clone + Send + Sync,
    {
        if TypeId::of::<T>() == TypeId::of::<TestSupport>() {
            let support: Box<dyn Any> = Box::new(TestSupport::new(self.clone()));
            return support.downcast::<T>().ok().map(|boxed| *boxed);
        }
        self.0.capabilities.get::<T>()
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.0.capabilities
    }

    /// Nothing is ever compiled, so there is no code to deoptimize.
    #[inline]
    pub fn notify_transfer_to_interpreter(&self) {}

    pub fn is_profiling_enabled(&self) -> bool {
        self.0.config.profiling
    }

    pub fn loaded_call_targets(&self) -> u64 {
        self.0.load_counter.total()
    }

    pub(crate) fn locators(&self) -> &[Arc<dyn Locator>] {
        &self.0.locators
    }

    /// Pushes an activation for `target` unless that would exceed the
    /// configured depth. The returned guard pops it.
    pub(crate) fn enter(
        &self,
        frame: Frame,
        target: CallTarget,
        call_node: Option<CallNode>,
    ) -> RuntimeResult<StackGuard> {
        let limit = self.0.config.max_call_depth;
        if limit > 0 {
            let depth = stack::current(self.0.id).map_or(0, |top| top.depth()) + 1;
            if depth > limit {
                tracing::warn!(target: "lkr::rt::stack", depth, limit, target_name = target.name(), "call depth limit hit");
                return Err(RuntimeError::StackOverflow { depth, limit });
            }
        }
        Ok(StackGuard::push(self.0.id, frame, target, call_node))
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("id", &self.0.id)
            .field("name", &self.name())
            .field("capabilities", &self.0.capabilities)
            .finish()
    }
}

/// One line of [`Runtime::stack_trace`].
#[derive(Debug, Clone)]
pub struct StackTraceElement {
    pub target: CallTarget,
    /// Call site the activation was executing when the trace was taken.
    pub call_node: Option<CallNode>,
    pub depth: usize,
}

impl fmt::Display for StackTraceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {} (depth {})", self.target.name(), self.depth)
    }
}

#[derive(Default)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    providers: Vec<Box<dyn CapabilityProvider>>,
    load_hooks: Vec<Arc<dyn LoadHook>>,
    locators: Vec<Arc<dyn Locator>>,
}

impl RuntimeBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(mut self, provider: impl CapabilityProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn load_hook(mut self, hook: Arc<dyn LoadHook>) -> Self {
        self.load_hooks.push(hook);
        self
    }

    pub fn locator(mut self, locator: Arc<dyn Locator>) -> Self {
        self.locators.push(locator);
        self
    }

    /// Runs every enabled provider, then builds the runtime. The first
    /// provider error aborts the build.
    pub fn build(self) -> Result<Runtime> {
        let capabilities = CapabilityRegistry::new();
        for provider in self.providers.iter().filter(|p| p.enabled()) {
            provider
                .register(&capabilities)
                .with_context(|| format!("capability provider '{}' failed", provider.name()))?;
            tracing::debug!(target: "lkr::rt::capability", provider = provider.name(), "provider registered");
        }
        Ok(Runtime::assemble(self.config, capabilities, self.load_hooks, self.locators))
    }
}
