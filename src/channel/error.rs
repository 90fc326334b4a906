//! Channel-specific error types.

use thiserror::Error;

/// Errors raised by channel and namespace slot operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// Push or terminate after the producer side was already closed.
    #[error("channel closed")]
    Closed,

    /// Non-blocking pop with nothing ready.
    #[error("channel would block")]
    WouldBlock,

    /// The owning pipeline was cancelled while this operation was waiting.
    #[error("channel operation cancelled")]
    Cancelled,

    /// Second write to a single-assignment namespace slot.
    #[error("namespace slot already assigned")]
    AlreadyAssigned,
}

pub type ChannelResult<T> = std::result::Result<T, ChannelError>;
