//! Error types for the reference server.

use recstore_codec::CodecError;
use recstore_protocol::{ErrorKind, ProtocolError};
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the reference server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Request could not be understood.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Write or index request rejected.
    #[error("rejected: {0}")]
    Store(String),

    /// Query could not be evaluated.
    #[error("query failed: {0}")]
    Query(String),

    /// Server configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Unknown or already released cursor.
    #[error("cursor {0} not found")]
    CursorNotFound(u64),

    /// Framing or message error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Wire error class reported to the client.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServerError::Store(_) => ErrorKind::Store,
            ServerError::Query(_) | ServerError::CursorNotFound(_) => ErrorKind::Query,
            ServerError::InvalidRequest(_)
            | ServerError::Config(_)
            | ServerError::Protocol(_)
            | ServerError::Codec(_)
            | ServerError::Io(_) => ErrorKind::Protocol,
        }
    }

    /// Returns true if this error was caused by the client's request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ServerError::Io(_) | ServerError::Config(_))
    }
}
