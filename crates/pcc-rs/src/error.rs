//! Error taxonomy for window operations.
//!
//! Every fallible operation is transactional: when it returns an error the
//! window's messages, token total, and message count are exactly as they were
//! before the call.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A message handle that no longer refers to a live message.
    #[error("message handle is stale or missing")]
    NullOrMissingHandle,

    /// Configuration or argument validation failed.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("allocation failed")]
    OutOfMemory,

    /// The message alone does not fit in an empty window.
    #[error("message ({tokens} tokens) exceeds window capacity ({max_tokens} tokens)")]
    Full { tokens: usize, max_tokens: usize },

    #[error("no message with matching content")]
    NotFound,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The shared window is held by another caller.
    #[error("window is locked")]
    Locked,
}

pub type Result<T> = std::result::Result<T, Error>;
