//! Execution graph node contracts consumed by the runtime.
//!
//! A language implementation builds its own node tree. The runtime only needs the
//! root of each routine ([`RootNode`]) and, for loops, a body that can be run one
//! iteration at a time ([`RepeatingNode`]).

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use crate::frame::{Frame, FrameDescriptor};
use crate::target::WeakCallTarget;
use crate::val::Val;

mod call;
mod loop_node;

pub use call::{CallNode, DirectCallNode, IndirectCallNode};
pub use loop_node::LoopNode;

/// A node of a routine's execution graph.
pub trait Node: Send + Sync + fmt::Debug {
    /// Short label used in traces.
    fn description(&self) -> &str {
        ""
    }
}

/// The entry node of a routine. Wrapped by a [`CallTarget`](crate::target::CallTarget).
pub trait RootNode: Node {
    fn execute(&self, frame: &Frame) -> Result<Val>;

    /// Layout shared by every frame this routine runs against.
    fn frame_descriptor(&self) -> &Arc<FrameDescriptor>;

    fn name(&self) -> &str {
        "<root>"
    }

    /// Called once when the runtime wraps this root in a call target, so the
    /// routine can reach its own target (e.g. to recurse).
    fn attach_call_target(&self, _target: WeakCallTarget) {}
}

/// Outcome of one loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopStatus {
    Continue,
    Break(Val),
}

/// One iteration of a loop body.
pub trait RepeatingNode: Send + Sync {
    fn execute_repeating(&self, frame: &Frame) -> Result<LoopStatus>;

    /// The graph node iteration profiles are attributed to. Bodies that are not
    /// part of the graph return `None` and are refused by the runtime.
    fn as_node(&self) -> Option<&dyn Node>;
}

/// Adapter running a plain closure as a loop body. It is not a graph node, so
/// the runtime will not build a loop around it; it exists for hosts that want
/// to exercise that boundary and for quick scripting of iteration logic.
pub struct RepeatingFn<F>(pub F);

impl<F> RepeatingNode for RepeatingFn<F>
where
    F: Fn(&Frame) -> Result<LoopStatus> + Send + Sync,
{
    fn execute_repeating(&self, frame: &Frame) -> Result<LoopStatus> {
        (self.0)(frame)
    }

    fn as_node(&self) -> Option<&dyn Node> {
        None
    }
}
