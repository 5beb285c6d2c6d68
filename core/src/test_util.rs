use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::OnceCell;

use crate::frame::{Frame, FrameDescriptor};
use crate::node::{Node, RootNode};
use crate::target::{CallTarget, WeakCallTarget};
use crate::val::Val;

type Body = Box<dyn Fn(&Frame) -> Result<Val> + Send + Sync>;

/// Root node running a closure; remembers the target it was attached to.
pub(crate) struct FnRoot {
    name: String,
    descriptor: Arc<FrameDescriptor>,
    body: Body,
    attached: OnceCell<WeakCallTarget>,
}

impl FnRoot {
    pub(crate) fn new<F>(name: &str, body: F) -> Arc<Self>
    where
        F: Fn(&Frame) -> Result<Val> + Send + Sync + 'static,
    {
        Self::with_descriptor(name, Arc::new(FrameDescriptor::new()), body)
    }

    pub(crate) fn with_descriptor<F>(name: &str, descriptor: Arc<FrameDescriptor>, body: F) -> Arc<Self>
    where
        F: Fn(&Frame) -> Result<Val> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.to_string(),
            descriptor,
            body: Box::new(body),
            attached: OnceCell::new(),
        })
    }

    pub(crate) fn attached_target(&self) -> Option<CallTarget> {
        self.attached.get().and_then(WeakCallTarget::upgrade)
    }
}

impl fmt::Debug for FnRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRoot").field("name", &self.name).finish()
    }
}

impl Node for FnRoot {
    fn description(&self) -> &str {
        &self.name
    }
}

impl RootNode for FnRoot {
    fn execute(&self, frame: &Frame) -> Result<Val> {
        (self.body)(frame)
    }

    fn frame_descriptor(&self) -> &Arc<FrameDescriptor> {
        &self.descriptor
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attach_call_target(&self, target: WeakCallTarget) {
        let _ = self.attached.set(target);
    }
}
