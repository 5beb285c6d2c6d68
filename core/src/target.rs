use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use anyhow::Result;

use crate::frame::{Frame, FrameView};
use crate::node::{CallNode, RootNode};
use crate::rt::Runtime;
use crate::val::Val;

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

struct CallTargetState {
    id: u64,
    root: Arc<dyn RootNode>,
    runtime: Runtime,
}

/// The runtime's handle on an executable routine.
///
/// Identity is by reference: two targets built from the same root are still
/// distinct. Nothing about a target changes after creation.
#[derive(Clone)]
pub struct CallTarget(Arc<CallTargetState>);

impl CallTarget {
    pub(crate) fn new(root: Arc<dyn RootNode>, runtime: Runtime) -> Self {
        Self(Arc::new(CallTargetState {
            id: NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed),
            root,
            runtime,
        }))
    }

    /// Invokes the routine with no call node attached to the caller.
    pub fn call(&self, args: Vec<Val>) -> Result<Val> {
        self.call_from(None, args)
    }

    pub(crate) fn call_from(&self, call_node: Option<CallNode>, args: Vec<Val>) -> Result<Val> {
        let state = &self.0;
        let frame = Frame::new(Arc::clone(state.root.frame_descriptor()), args, FrameView::Virtual);
        let _guard = state.runtime.enter(frame.clone(), self.clone(), call_node)?;
        let result = state.root.execute(&frame);
        if let Err(err) = &result {
            tracing::debug!(target: "lkr::rt::call", target_name = self.name(), error = %err, "call unwound with error");
        }
        result
    }

    #[inline]
    pub fn root(&self) -> &Arc<dyn RootNode> {
        &self.0.root
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.0.root.name()
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    #[inline]
    pub fn runtime(&self) -> &Runtime {
        &self.0.runtime
    }

    pub fn downgrade(&self) -> WeakCallTarget {
        WeakCallTarget(Arc::downgrade(&self.0))
    }
}

impl PartialEq for CallTarget {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for CallTarget {}

impl Hash for CallTarget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallTarget")
            .field("id", &self.0.id)
            .field("name", &self.name())
            .finish()
    }
}

/// Non-owning handle, so a root can refer to its own target without a cycle.
#[derive(Clone, Default)]
pub struct WeakCallTarget(Weak<CallTargetState>);

impl WeakCallTarget {
    pub fn upgrade(&self) -> Option<CallTarget> {
        self.0.upgrade().map(CallTarget)
    }
}

impl fmt::Debug for WeakCallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(target) => write!(f, "WeakCallTarget({})", target.name()),
            None => f.write_str("WeakCallTarget(<dropped>)"),
        }
    }
}
