//! TCP front end of the reference server.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::session::{ServerContext, Session};
use recstore_codec::Encode;
use recstore_protocol::frame::frame_header;
use recstore_protocol::{ErrorKind, ProtocolError, Response, FRAME_HEADER_LEN};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// The reference server.
///
/// Holds the shared catalog and accepts connections. Each connection gets
/// its own [`Session`].
///
/// # Example
///
/// ```
/// use recstore_server::{ServerConfig, StoreServer};
///
/// let server = StoreServer::new(ServerConfig::default());
/// let session = server.session();
/// assert_eq!(session.open_cursors(), 0);
/// ```
#[derive(Clone)]
pub struct StoreServer {
    context: Arc<ServerContext>,
}

impl StoreServer {
    /// Creates a server with an empty catalog.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            context: Arc::new(ServerContext::new(config)),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Shared state, for inspection in tests and tools.
    pub fn context(&self) -> &Arc<ServerContext> {
        &self.context
    }

    /// Opens an in-process session, bypassing the network.
    pub fn session(&self) -> Session {
        Session::new(Arc::clone(&self.context))
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> io::Result<TcpListener> {
        TcpListener::bind(self.context.config.bind_addr).await
    }

    /// Accepts connections until `shutdown` resolves.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()>,
    {
        self.context.config.validate()?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "recstore server listening");

        let permits = Arc::new(Semaphore::new(self.context.config.max_connections));
        tokio::pin!(shutdown);

        loop {
            let permit = tokio::select! {
                _ = &mut shutdown => break,
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                },
            };

            let session = self.session();
            let max_frame_size = self.context.config.max_frame_size;
            tokio::spawn(async move {
                let _permit = permit;
                match handle_connection(stream, session, max_frame_size).await {
                    Ok(()) => debug!(%peer, "connection closed"),
                    Err(e) => warn!(%peer, error = %e, "connection dropped"),
                }
            });
        }

        info!(addr = %local_addr, "recstore server stopped");
        Ok(())
    }

    /// Binds and serves until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()>,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    mut session: Session,
    max_frame_size: usize,
) -> ServerResult<()> {
    stream.set_nodelay(true)?;
    let peer: Option<SocketAddr> = stream.peer_addr().ok();
    debug!(?peer, "connection accepted");

    while let Some(incoming) = read_frame(&mut stream, max_frame_size).await? {
        let response = match incoming {
            Incoming::Frame(body) => session.handle_frame(&body)?,
            Incoming::Oversized(size) => {
                debug!(?peer, size, limit = max_frame_size, "oversized frame discarded");
                let err = ProtocolError::FrameTooLarge {
                    size,
                    limit: max_frame_size,
                };
                Response::error(ErrorKind::Protocol, err.to_string()).encode()?
            }
        };
        write_frame(&mut stream, &response).await?;
    }
    Ok(())
}

/// One frame read from a connection.
#[derive(Debug, PartialEq)]
enum Incoming {
    /// A body within the size limit.
    Frame(Vec<u8>),
    /// A body over the limit, already skipped; holds its announced size.
    Oversized(usize),
}

/// Reads one frame; `None` on a clean end of stream between frames.
///
/// An oversized body is read and thrown away so the stream stays aligned on
/// frame boundaries.
async fn read_frame<R>(reader: &mut R, max_frame_size: usize) -> ServerResult<Option<Incoming>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; FRAME_HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(header) as usize;
    if len > max_frame_size {
        let mut rest = (&mut *reader).take(len as u64);
        let skipped = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await?;
        if skipped < len as u64 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        return Ok(Some(Incoming::Oversized(len)));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(Incoming::Frame(body)))
}

async fn write_frame<W>(writer: &mut W, body: &[u8]) -> ServerResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&frame_header(body.len())?).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}
