//! Connection handle.

use crate::address::ServerAddress;
use crate::collection::Database;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::tcp::TcpTransport;
use crate::transport::StoreTransport;
use parking_lot::Mutex;
use recstore_protocol::{Request, Response, PROTOCOL_VERSION};
use tracing::{debug, info};

/// A connection to a RecStore server.
///
/// All operations are blocking request/response exchanges. The client may be
/// shared by reference across threads; each exchange holds the connection
/// exclusively. The connection is closed when the client is dropped.
///
/// # Example
///
/// ```rust,ignore
/// use recstore_client::Client;
/// use recstore_codec::record;
///
/// let client = Client::connect("localhost")?;
/// let coll = client.database("mydb").collection("testCollection");
/// coll.ensure_index("type")?;
/// coll.insert(record! { "name" => "MongoDB", "type" => "database" })?;
/// println!("count = {}", coll.count()?);
/// ```
pub struct Client {
    transport: Mutex<Box<dyn StoreTransport>>,
    config: ClientConfig,
    server: String,
}

impl Client {
    /// Connects with the default configuration.
    pub fn connect(address: &str) -> ClientResult<Self> {
        Self::connect_with_config(address, ClientConfig::default())
    }

    /// Connects with an explicit configuration.
    pub fn connect_with_config(address: &str, config: ClientConfig) -> ClientResult<Self> {
        let address: ServerAddress = address.parse()?;
        let transport = TcpTransport::connect(&address, &config)?;
        let client = Self::with_transport(Box::new(transport), config)?;
        info!(%address, server = %client.server, "connected");
        Ok(client)
    }

    /// Wraps an already-open transport and performs the handshake.
    pub fn with_transport(
        transport: Box<dyn StoreTransport>,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        let mut client = Self {
            transport: Mutex::new(transport),
            config,
            server: String::new(),
        };

        let hello = Request::Hello {
            protocol_version: PROTOCOL_VERSION,
            client: client.config.client_name.clone(),
        };
        match client.round_trip(hello)? {
            Response::Hello {
                protocol_version,
                server,
            } => {
                if protocol_version != PROTOCOL_VERSION {
                    return Err(ClientError::VersionMismatch {
                        client: PROTOCOL_VERSION,
                        server: protocol_version,
                    });
                }
                client.server = server;
            }
            other => return Err(unexpected("hello", &other)),
        }
        Ok(client)
    }

    /// Server identification from the handshake.
    pub fn server_version(&self) -> &str {
        &self.server
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns a handle to a database. No request is sent.
    pub fn database(&self, name: impl Into<String>) -> Database<'_> {
        Database::new(self, name.into())
    }

    /// Checks if the connection is still usable.
    pub fn is_connected(&self) -> bool {
        self.transport.lock().is_connected()
    }

    /// Closes the connection.
    pub fn close(mut self) -> ClientResult<()> {
        self.transport.get_mut().close()
    }

    /// Sends a request; error responses become errors.
    pub(crate) fn round_trip(&self, request: Request) -> ClientResult<Response> {
        let name = request.name();
        let response = self.transport.lock().round_trip(&request)?;
        debug!(request = name, response = response.name(), "round trip");
        match response {
            Response::Error { kind, message } => Err(ClientError::from_response(kind, message)),
            response => Ok(response),
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        let _ = self.transport.get_mut().close();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("server", &self.server)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Builds the error for a response of the wrong type.
pub(crate) fn unexpected(expected: &str, response: &Response) -> ClientError {
    ClientError::Protocol(format!(
        "expected {} response, got {}",
        expected,
        response.name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn hello(version: u16) -> Response {
        Response::Hello {
            protocol_version: version,
            server: "mock 0.0".into(),
        }
    }

    #[test]
    fn handshake_records_server() {
        let mock = MockTransport::new();
        mock.push_response(hello(PROTOCOL_VERSION));
        let client =
            Client::with_transport(Box::new(mock.clone()), ClientConfig::default()).unwrap();
        assert_eq!(client.server_version(), "mock 0.0");
        assert!(matches!(mock.requests()[0], Request::Hello { .. }));
    }

    #[test]
    fn handshake_rejects_other_versions() {
        let mock = MockTransport::new();
        mock.push_response(hello(PROTOCOL_VERSION + 1));
        let err = Client::with_transport(Box::new(mock), ClientConfig::default()).unwrap_err();
        assert!(matches!(err, ClientError::VersionMismatch { .. }));
    }

    #[test]
    fn handshake_rejects_wrong_response() {
        let mock = MockTransport::new();
        mock.push_response(Response::Count { count: 0 });
        let err = Client::with_transport(Box::new(mock), ClientConfig::default()).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[test]
    fn drop_closes_transport() {
        let mock = MockTransport::new();
        mock.push_response(hello(PROTOCOL_VERSION));
        let client =
            Client::with_transport(Box::new(mock.clone()), ClientConfig::default()).unwrap();
        assert!(client.is_connected());
        drop(client);
        assert!(mock.is_closed());
    }
}
