//! Server configuration.

use crate::error::{ServerError, ServerResult};
use recstore_protocol::{PatternSyntax, DEFAULT_MAX_FRAME_SIZE, DEFAULT_PORT};
use std::net::SocketAddr;

/// Configuration for the reference server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Maximum accepted frame body size.
    pub max_frame_size: usize,
    /// Batch size used when a request asks for 0.
    pub default_batch_size: u32,
    /// Upper bound on any batch.
    pub max_batch_size: u32,
    /// How `FieldMatchesPattern` patterns are interpreted.
    pub pattern_syntax: PatternSyntax,
    /// Open cursors a session may hold; the oldest is evicted beyond this.
    pub max_open_cursors: usize,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            max_connections: 1000,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            default_batch_size: 101,
            max_batch_size: 10_000,
            pattern_syntax: PatternSyntax::default(),
            max_open_cursors: 100,
        }
    }

    /// Sets the maximum concurrent connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the maximum frame size.
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Sets the default batch size.
    pub fn with_default_batch_size(mut self, size: u32) -> Self {
        self.default_batch_size = size;
        self
    }

    /// Sets the maximum batch size.
    pub fn with_max_batch_size(mut self, size: u32) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Sets the pattern syntax.
    pub fn with_pattern_syntax(mut self, syntax: PatternSyntax) -> Self {
        self.pattern_syntax = syntax;
        self
    }

    /// Sets the per-session open cursor limit.
    pub fn with_max_open_cursors(mut self, max: usize) -> Self {
        self.max_open_cursors = max;
        self
    }

    /// Checks that the limits allow the server to do any work.
    pub fn validate(&self) -> ServerResult<()> {
        if self.max_connections == 0 {
            return Err(ServerError::Config("max_connections must be at least 1".into()));
        }
        if self.max_open_cursors == 0 {
            return Err(ServerError::Config("max_open_cursors must be at least 1".into()));
        }
        Ok(())
    }

    /// Resolves a requested batch size against the defaults and limits.
    pub fn effective_batch_size(&self, requested: u32) -> usize {
        let size = if requested == 0 {
            self.default_batch_size
        } else {
            requested
        };
        size.clamp(1, self.max_batch_size.max(1)) as usize
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))
    }
}
