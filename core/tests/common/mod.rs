#![allow(dead_code)]

use std::fmt;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use lkr_exec::{CallTarget, DirectCallNode, Frame, FrameDescriptor, Node, RootNode, Runtime, Val};
use once_cell::sync::OnceCell;

type Body = Box<dyn Fn(&Frame, &SelfCall) -> Result<Val> + Send + Sync>;

/// Lets a routine call itself through a direct node bound after creation.
#[derive(Default)]
pub struct SelfCall {
    node: OnceCell<DirectCallNode>,
}

impl SelfCall {
    pub fn call(&self, args: Vec<Val>) -> Result<Val> {
        self.node.get().ok_or_else(|| anyhow!("self call not bound"))?.call(args)
    }
}

pub struct ScriptRoot {
    name: String,
    descriptor: Arc<FrameDescriptor>,
    body: Body,
    recurse: SelfCall,
}

impl fmt::Debug for ScriptRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRoot").field("name", &self.name).finish()
    }
}

impl Node for ScriptRoot {
    fn description(&self) -> &str {
        &self.name
    }
}

impl RootNode for ScriptRoot {
    fn execute(&self, frame: &Frame) -> Result<Val> {
        (self.body)(frame, &self.recurse)
    }

    fn frame_descriptor(&self) -> &Arc<FrameDescriptor> {
        &self.descriptor
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Builds a target whose body may recurse through the `SelfCall` it receives.
pub fn script<F>(rt: &Runtime, name: &str, descriptor: Arc<FrameDescriptor>, body: F) -> CallTarget
where
    F: Fn(&Frame, &SelfCall) -> Result<Val> + Send + Sync + 'static,
{
    let root = Arc::new(ScriptRoot {
        name: name.to_string(),
        descriptor,
        body: Box::new(body),
        recurse: SelfCall::default(),
    });
    let target = rt.create_call_target(root.clone());
    let node = rt
        .create_direct_call_node(Some(target.clone()))
        .expect("target is present");
    let _ = root.recurse.node.set(node);
    target
}

pub fn int_arg(frame: &Frame, index: usize) -> i64 {
    frame.argument(index).and_then(Val::as_i64).unwrap_or(0)
}
