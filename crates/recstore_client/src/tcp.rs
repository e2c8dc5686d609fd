//! TCP transport.

use crate::address::ServerAddress;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::StoreTransport;
use recstore_codec::{Decode, Encode};
use recstore_protocol::{read_frame, write_frame, ProtocolError, Request, Response};
use std::io::BufWriter;
use std::net::{Shutdown, TcpStream};
use tracing::{debug, warn};

/// Blocking transport over one TCP stream.
///
/// A failed send or receive leaves the stream in an unknown position, so the
/// transport drops it and later round trips fail with
/// [`ClientError::NotConnected`].
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    peer: String,
    max_frame_size: usize,
}

impl TcpTransport {
    /// Connects to the first reachable address `address` resolves to.
    pub fn connect(address: &ServerAddress, config: &ClientConfig) -> ClientResult<Self> {
        let mut last_error = None;
        for addr in address.resolve()? {
            let attempt = match config.connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream
                        .set_nodelay(true)
                        .and_then(|_| stream.set_read_timeout(config.io_timeout))
                        .and_then(|_| stream.set_write_timeout(config.io_timeout))
                        .map_err(|e| ClientError::connection(e.to_string()))?;
                    debug!(%addr, "tcp connection established");
                    return Ok(Self {
                        stream: Some(stream),
                        peer: address.to_string(),
                        max_frame_size: config.max_frame_size,
                    });
                }
                Err(e) => {
                    debug!(%addr, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }
        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(ClientError::connection(format!(
            "cannot connect to {}: {}",
            address, reason
        )))
    }

    /// Address this transport was opened against.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    fn exchange(stream: &mut TcpStream, body: &[u8], max: usize) -> ClientResult<Vec<u8>> {
        {
            let mut writer = BufWriter::new(&mut *stream);
            write_frame(&mut writer, body)?;
        }
        Ok(read_frame(stream, max)?)
    }
}

impl StoreTransport for TcpTransport {
    fn round_trip(&mut self, request: &Request) -> ClientResult<Response> {
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
        let body = request.encode()?;
        if body.len() > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size: body.len(),
                limit: self.max_frame_size,
            }
            .into());
        }

        let reply = match Self::exchange(stream, &body, self.max_frame_size) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(peer = %self.peer, error = %e, "connection lost");
                if let Some(stream) = self.stream.take() {
                    let _ = stream.shutdown(Shutdown::Both);
                }
                return Err(e);
            }
        };
        Ok(Response::decode(&reply)?)
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn close(&mut self) -> ClientResult<()> {
        if let Some(stream) = self.stream.take() {
            debug!(peer = %self.peer, "closing connection");
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {}
                Err(e) => return Err(ClientError::connection(e.to_string())),
            }
        }
        Ok(())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
