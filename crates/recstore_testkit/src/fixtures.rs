//! Test fixtures and client helpers.
//!
//! Provides the sample data set and convenience functions for running a
//! client against an in-process server.

use recstore_client::{Client, ClientConfig, LoopbackServer, LoopbackTransport};
use recstore_codec::{record, Record};
use recstore_server::{ServerConfig, Session, StoreServer};
use std::sync::{Arc, Mutex};

/// Database used by the sample scenario.
pub const SAMPLE_DATABASE: &str = "mydb";

/// Collection used by the sample scenario.
pub const SAMPLE_COLLECTION: &str = "testCollection";

/// Field indexed by the sample scenario.
pub const SAMPLE_INDEX_FIELD: &str = "type";

/// The three sample records, in insertion order.
pub fn sample_records() -> Vec<Record> {
    [
        ("MongoDB", "database", 10),
        ("CouchDB", "database", 1),
        ("Apache", "webserver", 7),
    ]
    .into_iter()
    .map(|(name, kind, count)| {
        record! {
            "name" => name,
            "type" => kind,
            "count" => count,
            "info" => record! { "x" => 203, "y" => "102" },
        }
    })
    .collect()
}

/// A server session that a loopback client can talk to.
///
/// The session is shared so tests can inspect it while the client owns the
/// transport.
#[derive(Clone)]
pub struct LoopbackSession {
    session: Arc<Mutex<Session>>,
}

impl LoopbackSession {
    /// Opens a new session on `server`.
    pub fn open(server: &StoreServer) -> Self {
        Self {
            session: Arc::new(Mutex::new(server.session())),
        }
    }

    /// Number of server cursors the session still holds.
    pub fn open_cursors(&self) -> usize {
        self.session
            .lock()
            .expect("Loopback session poisoned")
            .open_cursors()
    }
}

impl LoopbackServer for LoopbackSession {
    fn handle_frame(&mut self, body: &[u8]) -> Result<Vec<u8>, String> {
        self.session
            .lock()
            .map_err(|e| e.to_string())?
            .handle_frame(body)
            .map_err(|e| e.to_string())
    }
}

/// Connects a client to `server` without a socket.
pub fn loopback_client(server: &StoreServer, config: ClientConfig) -> (Client, LoopbackSession) {
    let session = LoopbackSession::open(server);
    let transport = LoopbackTransport::new(session.clone());
    let client = Client::with_transport(Box::new(transport), config)
        .expect("Failed to connect loopback client");
    (client, session)
}

/// Runs a test with a client connected to a fresh in-process server.
///
/// # Example
///
/// ```rust,ignore
/// use recstore_testkit::with_client;
///
/// #[test]
/// fn my_test() {
///     with_client(|client| {
///         let coll = client.database("db").collection("c");
///         // ... test operations
///     });
/// }
/// ```
pub fn with_client<F, R>(f: F) -> R
where
    F: FnOnce(&Client) -> R,
{
    let server = StoreServer::new(ServerConfig::default());
    let (client, _session) = loopback_client(&server, ClientConfig::default());
    f(&client)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// A server holding the indexed sample collection.
    pub fn sample_server() -> StoreServer {
        let server = StoreServer::new(ServerConfig::default());
        let (client, _) = loopback_client(&server, ClientConfig::default());
        load_samples(&client);
        server
    }

    /// Declares the sample index and inserts the sample records.
    pub fn load_samples(client: &Client) {
        let coll = client
            .database(SAMPLE_DATABASE)
            .collection(SAMPLE_COLLECTION);
        coll.ensure_index(SAMPLE_INDEX_FIELD)
            .expect("Failed to ensure index");
        for record in sample_records() {
            coll.insert(record).expect("Failed to insert sample");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recstore_codec::Value;

    #[test]
    fn samples_are_well_formed() {
        let records = sample_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].get("name"), Some(&Value::from("Apache")));
        assert_eq!(records[0].get_path("info.y"), Some(&Value::from("102")));
    }

    #[test]
    fn test_with_client() {
        let count = with_client(|client| {
            scenarios::load_samples(client);
            client
                .database(SAMPLE_DATABASE)
                .collection(SAMPLE_COLLECTION)
                .count()
                .unwrap()
        });
        assert_eq!(count, 3);
    }

    #[test]
    fn test_sample_server() {
        let server = scenarios::sample_server();
        let (client, session) = loopback_client(&server, ClientConfig::default());
        let coll = client.database(SAMPLE_DATABASE).collection(SAMPLE_COLLECTION);
        assert_eq!(coll.count().unwrap(), 3);
        assert_eq!(coll.indexes().unwrap(), vec![SAMPLE_INDEX_FIELD]);
        assert_eq!(session.open_cursors(), 0);
    }
}
