use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Result;

use crate::target::CallTarget;
use crate::val::Val;

struct DirectState {
    target: CallTarget,
    inlining_forced: AtomicBool,
    call_count: AtomicU64,
}

/// Call site bound to one known target for its whole lifetime.
///
/// The interpreter never inlines or splits, so the inlining and cloning queries
/// answer negatively; `force_inlining` is only recorded.
#[derive(Clone)]
pub struct DirectCallNode(Arc<DirectState>);

impl DirectCallNode {
    pub(crate) fn new(target: CallTarget) -> Self {
        Self(Arc::new(DirectState {
            target,
            inlining_forced: AtomicBool::new(false),
            call_count: AtomicU64::new(0),
        }))
    }

    /// Invokes the bound target. While the callee runs, the caller's frame
    /// instance reports this node as its call node.
    pub fn call(&self, args: Vec<Val>) -> Result<Val> {
        self.0.call_count.fetch_add(1, Ordering::Relaxed);
        self.0.target.call_from(Some(CallNode::Direct(self.clone())), args)
    }

    #[inline]
    pub fn call_target(&self) -> &CallTarget {
        &self.0.target
    }

    /// Same as [`call_target`](Self::call_target) since targets are never split.
    #[inline]
    pub fn current_call_target(&self) -> &CallTarget {
        &self.0.target
    }

    pub fn cloned_call_target(&self) -> Option<&CallTarget> {
        None
    }

    pub fn is_inlinable(&self) -> bool {
        false
    }

    pub fn is_call_target_cloning_allowed(&self) -> bool {
        false
    }

    /// Requests a split copy of the target. Always refused here.
    pub fn clone_call_target(&self) -> bool {
        false
    }

    pub fn force_inlining(&self) {
        self.0.inlining_forced.store(true, Ordering::Relaxed);
    }

    pub fn is_inlining_forced(&self) -> bool {
        self.0.inlining_forced.load(Ordering::Relaxed)
    }

    pub fn call_count(&self) -> u64 {
        self.0.call_count.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for DirectCallNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectCallNode")
            .field("target", &self.0.target.name())
            .field("inlining_forced", &self.is_inlining_forced())
            .finish()
    }
}

struct IndirectState {
    call_count: AtomicU64,
}

/// Call site whose target is only known per invocation.
#[derive(Clone)]
pub struct IndirectCallNode(Arc<IndirectState>);

impl IndirectCallNode {
    pub(crate) fn new() -> Self {
        Self(Arc::new(IndirectState {
            call_count: AtomicU64::new(0),
        }))
    }

    pub fn call(&self, target: &CallTarget, args: Vec<Val>) -> Result<Val> {
        self.0.call_count.fetch_add(1, Ordering::Relaxed);
        target.call_from(Some(CallNode::Indirect(self.clone())), args)
    }

    pub fn call_count(&self) -> u64 {
        self.0.call_count.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for IndirectCallNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndirectCallNode")
            .field("call_count", &self.call_count())
            .finish()
    }
}

/// The call site recorded on a caller's frame instance.
#[derive(Clone)]
pub enum CallNode {
    Direct(DirectCallNode),
    Indirect(IndirectCallNode),
}

impl CallNode {
    #[inline]
    pub fn is_direct(&self) -> bool {
        matches!(self, CallNode::Direct(_))
    }

    pub fn direct_target(&self) -> Option<&CallTarget> {
        match self {
            CallNode::Direct(node) => Some(node.call_target()),
            CallNode::Indirect(_) => None,
        }
    }

    /// Identity comparison: true when both refer to the same call site.
    pub fn same_node(&self, other: &CallNode) -> bool {
        match (self, other) {
            (CallNode::Direct(a), CallNode::Direct(b)) => Arc::ptr_eq(&a.0, &b.0),
            (CallNode::Indirect(a), CallNode::Indirect(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl fmt::Debug for CallNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallNode::Direct(node) => fmt::Debug::fmt(node, f),
            CallNode::Indirect(node) => fmt::Debug::fmt(node, f),
        }
    }
}

impl From<DirectCallNode> for CallNode {
    fn from(node: DirectCallNode) -> Self {
        CallNode::Direct(node)
    }
}

impl From<IndirectCallNode> for CallNode {
    fn from(node: IndirectCallNode) -> Self {
        CallNode::Indirect(node)
    }
}
