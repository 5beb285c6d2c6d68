use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;

use super::{LoopStatus, RepeatingNode};
use crate::error::{RuntimeError, RuntimeResult};
use crate::frame::Frame;
use crate::val::Val;

/// Drives a [`RepeatingNode`] until it breaks, profiling the iteration count.
pub struct LoopNode {
    repeating: Arc<dyn RepeatingNode>,
    iterations: AtomicU64,
}

impl LoopNode {
    pub(crate) fn new(repeating: Arc<dyn RepeatingNode>) -> RuntimeResult<Self> {
        if repeating.as_node().is_none() {
            return Err(RuntimeError::invalid_argument(
                "repeating body must be a node of the execution graph",
            ));
        }
        Ok(Self {
            repeating,
            iterations: AtomicU64::new(0),
        })
    }

    /// Runs the body until it reports `Break`; errors from the body propagate
    /// unchanged and end the loop.
    pub fn execute_loop(&self, frame: &Frame) -> Result<Val> {
        let mut count: u64 = 0;
        let outcome = loop {
            count += 1;
            match self.repeating.execute_repeating(frame) {
                Ok(LoopStatus::Continue) => continue,
                Ok(LoopStatus::Break(value)) => break Ok(value),
                Err(err) => break Err(err),
            }
        };
        self.iterations.fetch_add(count, Ordering::Relaxed);
        tracing::trace!(
            target: "lkr::rt::loop",
            iterations = count,
            body = self.body_description(),
            ok = outcome.is_ok(),
            "loop exited"
        );
        outcome
    }

    pub fn repeating_node(&self) -> &Arc<dyn RepeatingNode> {
        &self.repeating
    }

    /// Body invocations accumulated over every execution of this loop.
    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    fn body_description(&self) -> &str {
        self.repeating.as_node().map_or("", |node| node.description())
    }
}

impl fmt::Debug for LoopNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopNode")
            .field("body", &self.body_description())
            .field("iterations", &self.iterations())
            .finish()
    }
}
