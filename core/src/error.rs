use thiserror::Error;

use crate::frame::{FrameSlotKind, SlotIdentifier};

/// Recoverable failures raised by the execution runtime.
///
/// Routine bodies return `anyhow::Result`, so these usually travel wrapped in an
/// [`anyhow::Error`]; use [`RuntimeError::from_anyhow`] (or `downcast_ref`) to get
/// them back and pick a slow path.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    /// A frame slot was read with a kind other than the one currently stored.
    #[error("frame slot '{slot}' holds {actual} but was read as {requested}")]
    TypeMismatch {
        slot: SlotIdentifier,
        requested: FrameSlotKind,
        actual: FrameSlotKind,
    },

    /// A write was attempted through a read-only frame view.
    #[error("frame slot '{slot}' cannot be written through a read-only frame")]
    InvalidAccess { slot: SlotIdentifier },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An assumption was checked after it had been invalidated.
    #[error("assumption '{name}' is no longer valid")]
    Invalidated { name: String },

    #[error("call depth {depth} exceeds the configured limit of {limit}")]
    StackOverflow { depth: usize, limit: usize },
}

impl RuntimeError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        RuntimeError::InvalidArgument(message.into())
    }

    /// Borrow the runtime error carried by `err`, if any.
    pub fn from_anyhow(err: &anyhow::Error) -> Option<&RuntimeError> {
        err.downcast_ref::<RuntimeError>()
    }

    #[inline]
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, RuntimeError::TypeMismatch { .. })
    }

    #[inline]
    pub fn is_invalidated(&self) -> bool {
        matches!(self, RuntimeError::Invalidated { .. })
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
