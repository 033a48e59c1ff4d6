//! Error taxonomy for the wrapper
//!
//! The native libraries only report a numeric return code, so there is no
//! richer diagnostic to carry than the code itself. Everything that can be
//! caught before a foreign call (state guards, argument checks) has its own
//! variant and never reaches the native side.

use thiserror::Error;

/// Errors surfaced by the Dante wrapper
#[derive(Debug, Error)]
pub enum DanteError {
    /// A native call returned a non-zero result code
    #[error("bad result: {0}")]
    OperationFailed(i32),

    /// A command was issued against a handle that was never opened
    #[error("device is not initialized")]
    NotInitialized,

    /// A command was issued against a closed handle; closed sessions never
    /// reopen, construct a fresh one instead
    #[error("session is closed")]
    SessionClosed,

    /// Device or channel name rejected before any foreign call was made
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// The background step worker could not be spawned
    #[error("failed to start step worker: {0}")]
    Worker(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DanteError>;
