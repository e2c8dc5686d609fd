//! Client configuration.

use recstore_protocol::DEFAULT_MAX_FRAME_SIZE;
use std::time::Duration;

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Limit on establishing the TCP connection. `None` waits for the OS.
    pub connect_timeout: Option<Duration>,
    /// Read/write timeout on the socket. `None` blocks indefinitely.
    pub io_timeout: Option<Duration>,
    /// Records requested per batch; 0 lets the server choose.
    pub batch_size: u32,
    /// Maximum accepted response frame size.
    pub max_frame_size: usize,
    /// Identification sent in the handshake.
    pub client_name: String,
}

impl ClientConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the I/O timeout.
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Sets the batch size.
    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets the maximum frame size.
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Sets the client name.
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(10)),
            io_timeout: None,
            batch_size: 0,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            client_name: format!("recstore-client {}", env!("CARGO_PKG_VERSION")),
        }
    }
}
