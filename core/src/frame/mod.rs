//! Activation records: slot layouts, frame storage views, and call-stack snapshots.

mod descriptor;
mod instance;
mod storage;

pub use descriptor::{FrameDescriptor, FrameSlot, FrameSlotKind, SlotIdentifier};
pub use instance::{FrameAccess, FrameInstance, FrameInstanceIter};
pub use storage::{Frame, FrameView};

#[cfg(test)]
mod frame_test;
