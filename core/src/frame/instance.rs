use std::fmt;
use std::rc::Rc;

use super::storage::Frame;
use crate::node::CallNode;
use crate::target::CallTarget;

/// How much of an activation's frame an introspecting caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAccess {
    /// Only the target and call node are needed.
    None,
    ReadOnly,
    /// The live frame. Only sound while the activation is still running.
    ReadWrite,
    /// A view that may be retained after the activation returns.
    Materialize,
}

struct FrameInstanceNode {
    frame: Frame,
    target: CallTarget,
    call_node: Option<CallNode>,
    caller: Option<FrameInstance>,
    depth: usize,
}

/// Immutable snapshot of one activation on the current thread's call stack.
///
/// A node is never mutated once built: attaching a call node or popping a callee
/// rebuilds the affected node and shares the unchanged tail. `Rc` keeps chains on
/// the thread that built them.
#[derive(Clone)]
pub struct FrameInstance {
    node: Rc<FrameInstanceNode>,
}

impl FrameInstance {
    pub(crate) fn new(
        frame: Frame,
        target: CallTarget,
        call_node: Option<CallNode>,
        caller: Option<FrameInstance>,
    ) -> Self {
        let depth = caller.as_ref().map_or(1, |c| c.depth() + 1);
        Self {
            node: Rc::new(FrameInstanceNode {
                frame,
                target,
                call_node,
                caller,
                depth,
            }),
        }
    }

    /// Copy of this node with a different call node and the same caller chain.
    pub(crate) fn rebuild(&self, call_node: Option<CallNode>) -> Self {
        Self {
            node: Rc::new(FrameInstanceNode {
                frame: self.node.frame.clone(),
                target: self.node.target.clone(),
                call_node,
                caller: self.node.caller.clone(),
                depth: self.node.depth,
            }),
        }
    }

    pub fn frame(&self, access: FrameAccess) -> Option<Frame> {
        match access {
            FrameAccess::None => None,
            FrameAccess::ReadOnly => Some(self.node.frame.read_only()),
            FrameAccess::ReadWrite => Some(self.node.frame.clone()),
            FrameAccess::Materialize => Some(self.node.frame.materialize()),
        }
    }

    #[inline]
    pub fn call_target(&self) -> &CallTarget {
        &self.node.target
    }

    /// The node through which this activation made its current outgoing call.
    #[inline]
    pub fn call_node(&self) -> Option<&CallNode> {
        self.node.call_node.as_ref()
    }

    #[inline]
    pub fn caller(&self) -> Option<&FrameInstance> {
        self.node.caller.as_ref()
    }

    /// 1 for the outermost activation.
    #[inline]
    pub fn depth(&self) -> usize {
        self.node.depth
    }

    /// The interpreter never elides frames, so instances always carry a real one.
    #[inline]
    pub fn is_virtual_frame(&self) -> bool {
        false
    }

    /// True when both handles are the same snapshot node.
    pub fn same_instance(&self, other: &FrameInstance) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    pub(crate) fn frame_ref(&self) -> &Frame {
        &self.node.frame
    }

    /// Walks from this instance towards the outermost activation, lazily.
    pub fn iter(&self) -> FrameInstanceIter {
        FrameInstanceIter {
            next: Some(self.clone()),
        }
    }
}

impl fmt::Debug for FrameInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameInstance")
            .field("target", &self.node.target.name())
            .field("depth", &self.node.depth)
            .field("call_node", &self.node.call_node)
            .finish()
    }
}

pub struct FrameInstanceIter {
    next: Option<FrameInstance>,
}

impl Iterator for FrameInstanceIter {
    type Item = FrameInstance;

    fn next(&mut self) -> Option<FrameInstance> {
        let current = self.next.take()?;
        self.next = current.caller().cloned();
        Some(current)
    }
}
