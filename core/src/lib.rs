pub mod assumption;
pub mod error;
pub mod frame;
pub mod node;
pub mod rt;
pub mod target;
pub mod val;

pub use assumption::{AssumedValue, Assumption, CyclicAssumption};
pub use error::{RuntimeError, RuntimeResult};
pub use frame::{Frame, FrameAccess, FrameDescriptor, FrameInstance, FrameSlot, FrameSlotKind, FrameView, SlotIdentifier};
pub use node::{CallNode, DirectCallNode, IndirectCallNode, LoopNode, LoopStatus, Node, RepeatingNode, RootNode};
pub use rt::{Runtime, RuntimeConfig};
pub use target::{CallTarget, WeakCallTarget};
pub use val::Val;

#[cfg(test)]
pub(crate) mod test_util;
