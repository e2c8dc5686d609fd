//! Error types for the client.

use recstore_codec::CodecError;
use recstore_protocol::{ErrorKind, ProtocolError};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to a server.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Server unreachable or connection lost.
    #[error("connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Connection was closed by an earlier failure or by `close`.
    #[error("not connected to server")]
    NotConnected,

    /// Write or index request rejected by the server.
    #[error("store error: {0}")]
    Store(String),

    /// Filter could not be evaluated.
    #[error("query error: {0}")]
    Query(String),

    /// Malformed frame or unexpected response.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Server speaks another protocol version.
    #[error("protocol version mismatch: client {client}, server {server}")]
    VersionMismatch {
        /// Version spoken by this client.
        client: u16,
        /// Version reported by the server.
        server: u16,
    },

    /// Address could not be parsed.
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress {
        /// The address as given.
        address: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl ClientError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        ClientError::Connection {
            message: message.into(),
        }
    }

    /// Creates an invalid address error.
    pub fn invalid_address(address: impl Into<String>, reason: &'static str) -> Self {
        ClientError::InvalidAddress {
            address: address.into(),
            reason,
        }
    }

    /// Maps a server error response.
    pub fn from_response(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::Store => ClientError::Store(message),
            ErrorKind::Query => ClientError::Query(message),
            ErrorKind::Protocol => ClientError::Protocol(message),
        }
    }

    /// Returns true if the connection is no longer usable.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ClientError::Connection { .. } | ClientError::NotConnected
        )
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(e) => ClientError::connection(e.to_string()),
            ProtocolError::Codec(e) => ClientError::Codec(e),
            ProtocolError::FrameTooLarge { .. } => ClientError::Protocol(err.to_string()),
            ProtocolError::InvalidField { .. }
            | ProtocolError::InvalidPattern { .. }
            | ProtocolError::NotText { .. } => ClientError::Query(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_kinds_map_to_variants() {
        assert!(matches!(
            ClientError::from_response(ErrorKind::Store, "x".into()),
            ClientError::Store(_)
        ));
        assert!(matches!(
            ClientError::from_response(ErrorKind::Query, "x".into()),
            ClientError::Query(_)
        ));
        assert!(matches!(
            ClientError::from_response(ErrorKind::Protocol, "x".into()),
            ClientError::Protocol(_)
        ));
    }

    #[test]
    fn io_failures_are_connection_errors() {
        let err: ClientError =
            ProtocolError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe)).into();
        assert!(err.is_connection_error());
        assert!(ClientError::NotConnected.is_connection_error());
        assert!(!ClientError::Store("rejected".into()).is_connection_error());
    }

    #[test]
    fn error_display() {
        let err = ClientError::VersionMismatch {
            client: 1,
            server: 2,
        };
        assert_eq!(
            err.to_string(),
            "protocol version mismatch: client 1, server 2"
        );
        let err = ClientError::invalid_address("a:b", "port is not a number");
        assert_eq!(
            err.to_string(),
            "invalid address \"a:b\": port is not a number"
        );
    }
}
