//! Error types for the protocol crate.

use recstore_codec::CodecError;
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while framing, decoding or evaluating protocol data.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Encoding or decoding a message failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Frame exceeds the configured size limit.
    #[error("frame of {size} bytes exceeds limit of {limit} bytes")]
    FrameTooLarge {
        /// Announced frame size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Underlying stream failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Field name or path is not acceptable.
    #[error("invalid field name {field:?}: {reason}")]
    InvalidField {
        /// The offending field name.
        field: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Pattern could not be compiled.
    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Compiler message.
        message: String,
    },

    /// Pattern filter applied to a field that does not hold text.
    #[error("field {field:?} holds {found}, pattern matching requires text")]
    NotText {
        /// Field path.
        field: String,
        /// Type name of the stored value.
        found: &'static str,
    },
}
