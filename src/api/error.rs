//! API Error Types
//!
//! Errors that can stop the server itself. Per-connection failures never reach
//! this layer; the dispatcher resolves them by deregistering the peer.

use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error (bind failures and the like)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
