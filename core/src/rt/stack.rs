//! Per-thread frame-instance chains.
//!
//! Every thread keeps one chain per runtime, keyed by runtime id. Entries are
//! created on first push and dropped once the chain empties, so idle threads
//! hold nothing.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::frame::{Frame, FrameInstance};
use crate::node::CallNode;
use crate::target::CallTarget;

thread_local! {
    static STACKS: RefCell<FxHashMap<u64, FrameInstance>> = RefCell::new(FxHashMap::default());
}

pub(crate) fn current(runtime_id: u64) -> Option<FrameInstance> {
    STACKS.with(|stacks| stacks.borrow().get(&runtime_id).cloned())
}

/// Pushes a new activation. With a call node, the previous top is rebuilt so
/// that it reports the node it is calling through.
pub(crate) fn push_frame(
    runtime_id: u64,
    frame: Frame,
    target: CallTarget,
    call_node: Option<CallNode>,
) -> FrameInstance {
    STACKS.with(|stacks| {
        let mut stacks = stacks.borrow_mut();
        let caller = match (stacks.get(&runtime_id), call_node) {
            (Some(top), Some(node)) => Some(top.rebuild(Some(node))),
            (Some(top), None) => Some(top.clone()),
            (None, _) => None,
        };
        let instance = FrameInstance::new(frame, target, None, caller);
        stacks.insert(runtime_id, instance.clone());
        instance
    })
}

/// Pops the top activation and returns it. The caller is rebuilt without a
/// call node since its outgoing call has finished.
pub(crate) fn pop_frame(runtime_id: u64) -> Option<FrameInstance> {
    STACKS.with(|stacks| {
        let mut stacks = stacks.borrow_mut();
        let top = stacks.remove(&runtime_id)?;
        if let Some(caller) = top.caller() {
            let restored = if caller.call_node().is_some() {
                caller.rebuild(None)
            } else {
                caller.clone()
            };
            stacks.insert(runtime_id, restored);
        }
        Some(top)
    })
}

/// Pops the activation it was created for when dropped, whether the body
/// returned, failed, or panicked.
pub(crate) struct StackGuard {
    runtime_id: u64,
    depth: usize,
    frame: Frame,
}

impl StackGuard {
    pub(crate) fn push(runtime_id: u64, frame: Frame, target: CallTarget, call_node: Option<CallNode>) -> Self {
        let instance = push_frame(runtime_id, frame.clone(), target, call_node);
        tracing::trace!(target: "lkr::rt::stack", depth = instance.depth(), "push");
        Self {
            runtime_id,
            depth: instance.depth(),
            frame,
        }
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        let matches_top = current(self.runtime_id)
            .is_some_and(|top| top.depth() == self.depth && top.frame_ref().shares_storage_with(&self.frame));
        if !matches_top {
            if std::thread::panicking() {
                tracing::error!(
                    target: "lkr::rt::stack",
                    expected_depth = self.depth,
                    "call stack corrupted while unwinding"
                );
                return;
            }
            panic!("call stack corrupted: expected activation at depth {} on top", self.depth);
        }
        pop_frame(self.runtime_id);
        tracing::trace!(target: "lkr::rt::stack", depth = self.depth, "pop");
    }
}
