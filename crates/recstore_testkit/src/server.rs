//! A real TCP server for integration tests.

use recstore_client::{Client, ClientConfig};
use recstore_server::{ServerConfig, StoreServer};
use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread;
use tokio::sync::watch;
use tracing::warn;

/// A reference server listening on an ephemeral localhost port.
///
/// Runs its own tokio runtime on a background thread and shuts down when
/// dropped.
pub struct TestServer {
    server: StoreServer,
    addr: SocketAddr,
    shutdown: Option<watch::Sender<bool>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl TestServer {
    /// Starts a server with default settings.
    pub fn start() -> Self {
        Self::start_with_config(ServerConfig::default())
    }

    /// Starts a server with `config`; the bind address is replaced by
    /// `127.0.0.1:0`.
    pub fn start_with_config(config: ServerConfig) -> Self {
        let config = ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..config
        };
        let server = StoreServer::new(config);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (addr_tx, addr_rx) = mpsc::channel();

        let serving = server.clone();
        let thread = thread::Builder::new()
            .name("recstore-test-server".into())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(2)
                    .enable_all()
                    .build()
                    .expect("Failed to build test runtime");
                runtime.block_on(async move {
                    let listener = serving.bind().await.expect("Failed to bind test server");
                    let addr = listener.local_addr().expect("Listener has no address");
                    let _ = addr_tx.send(addr);
                    let shutdown = async move {
                        let _ = shutdown_rx.changed().await;
                    };
                    if let Err(e) = serving.serve(listener, shutdown).await {
                        warn!(error = %e, "test server failed");
                    }
                });
            })
            .expect("Failed to spawn test server thread");

        let addr = addr_rx.recv().expect("Test server failed to start");
        Self {
            server,
            addr,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    /// Socket address the server listens on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Address in `recstore://host:port` form.
    pub fn url(&self) -> String {
        format!("recstore://{}", self.addr)
    }

    /// The server, for inspecting its catalog.
    pub fn server(&self) -> &StoreServer {
        &self.server
    }

    /// Connects a new client.
    pub fn client(&self) -> Client {
        self.client_with_config(ClientConfig::default())
    }

    /// Connects a new client with `config`.
    pub fn client_with_config(&self, config: ClientConfig) -> Client {
        Client::connect_with_config(&self.url(), config).expect("Failed to connect to test server")
    }

    /// Stops accepting connections and waits for the server thread.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recstore_codec::record;
    use recstore_protocol::Namespace;

    #[test]
    fn test_server_accepts_clients() {
        let server = TestServer::start();
        let client = server.client();
        assert!(client.server_version().starts_with("recstore"));

        client
            .database("db")
            .collection("c")
            .insert(record! { "a" => 1 })
            .unwrap();
        let catalog = &server.server().context().catalog;
        assert_eq!(catalog.count(&Namespace::new("db", "c")), 1);
    }

    #[test]
    fn test_server_stops() {
        let mut server = TestServer::start();
        let url = server.url();
        server.shutdown();
        assert!(Client::connect(&url).is_err());
    }
}
