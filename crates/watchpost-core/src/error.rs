//! Shared error type across watchpost crates.

use thiserror::Error;

/// Stable error codes (used in log fields and by tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A line on the wire that is not a JSON object.
    BadFrame,
    /// Invalid input (config, request shape).
    BadRequest,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// No connection to the server.
    Disconnected,
    /// Socket-level failure.
    Io,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and error events.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadFrame => "BAD_FRAME",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Disconnected => "DISCONNECTED",
            ErrorCode::Io => "IO",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, WatchpostError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum WatchpostError {
    #[error("bad frame: {0}")]
    BadFrame(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("disconnected")]
    Disconnected,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl WatchpostError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            WatchpostError::BadFrame(_) => ErrorCode::BadFrame,
            WatchpostError::BadRequest(_) => ErrorCode::BadRequest,
            WatchpostError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            WatchpostError::Disconnected => ErrorCode::Disconnected,
            WatchpostError::Io(_) => ErrorCode::Io,
            WatchpostError::Internal(_) => ErrorCode::Internal,
        }
    }
}
