//! In-process transport.

use crate::error::{ClientError, ClientResult};
use crate::transport::StoreTransport;
use recstore_codec::{Decode, Encode};
use recstore_protocol::{Request, Response};

/// Trait for servers that can handle loopback frames.
pub trait LoopbackServer: Send {
    /// Handles one encoded request and returns the encoded response.
    fn handle_frame(&mut self, body: &[u8]) -> Result<Vec<u8>, String>;
}

/// A transport that hands encoded frames straight to a server.
///
/// Requests still go through the wire encoding, so the client behaves the
/// same as over TCP without a socket.
pub struct LoopbackTransport<S: LoopbackServer> {
    server: Option<S>,
}

impl<S: LoopbackServer> LoopbackTransport<S> {
    /// Creates a transport connected to `server`.
    pub fn new(server: S) -> Self {
        Self {
            server: Some(server),
        }
    }
}

impl<S: LoopbackServer> StoreTransport for LoopbackTransport<S> {
    fn round_trip(&mut self, request: &Request) -> ClientResult<Response> {
        let server = self.server.as_mut().ok_or(ClientError::NotConnected)?;
        let reply = server
            .handle_frame(&request.encode()?)
            .map_err(ClientError::connection)?;
        Ok(Response::decode(&reply)?)
    }

    fn is_connected(&self) -> bool {
        self.server.is_some()
    }

    fn close(&mut self) -> ClientResult<()> {
        self.server = None;
        Ok(())
    }
}
