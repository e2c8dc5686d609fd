//! Database and collection handles.

use crate::client::{unexpected, Client};
use crate::cursor::Cursor;
use crate::error::ClientResult;
use recstore_codec::Record;
use recstore_protocol::{Filter, Namespace, RecordId, Request, Response, StoredRecord};

/// A named database on a server.
///
/// Handles are cheap and never fail to create. The database exists on the
/// server once something is written to one of its collections.
#[derive(Debug, Clone)]
pub struct Database<'c> {
    client: &'c Client,
    name: String,
}

impl<'c> Database<'c> {
    pub(crate) fn new(client: &'c Client, name: String) -> Self {
        Self { client, name }
    }

    /// Database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a handle to a collection. No request is sent.
    pub fn collection(&self, name: impl Into<String>) -> Collection<'c> {
        Collection {
            client: self.client,
            namespace: Namespace::new(self.name.clone(), name),
        }
    }

    /// Names of the collections that currently exist, sorted.
    pub fn collection_names(&self) -> ClientResult<Vec<String>> {
        match self.client.round_trip(Request::ListCollections {
            database: self.name.clone(),
        })? {
            Response::Collections { names } => Ok(names),
            other => Err(unexpected("collections", &other)),
        }
    }
}

/// A named collection within a database.
#[derive(Debug, Clone)]
pub struct Collection<'c> {
    client: &'c Client,
    namespace: Namespace,
}

impl<'c> Collection<'c> {
    /// Collection name.
    pub fn name(&self) -> &str {
        &self.namespace.collection
    }

    /// Owning database name.
    pub fn database_name(&self) -> &str {
        &self.namespace.database
    }

    /// Full namespace.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Declares an equality index on `field`.
    ///
    /// Idempotent: returns `true` if the index was created by this call and
    /// `false` if it already existed.
    ///
    /// # Errors
    ///
    /// [`ClientError::Store`](crate::ClientError::Store) if the field name is
    /// rejected (empty, empty path segment, leading `$`).
    pub fn ensure_index(&self, field: &str) -> ClientResult<bool> {
        match self.client.round_trip(Request::EnsureIndex {
            namespace: self.namespace.clone(),
            field: field.to_string(),
        })? {
            Response::IndexEnsured { created } => Ok(created),
            other => Err(unexpected("index_ensured", &other)),
        }
    }

    /// Indexed fields, sorted.
    pub fn indexes(&self) -> ClientResult<Vec<String>> {
        match self.client.round_trip(Request::ListIndexes {
            namespace: self.namespace.clone(),
        })? {
            Response::Indexes { fields } => Ok(fields),
            other => Err(unexpected("indexes", &other)),
        }
    }

    /// Appends a record and returns the identifier the server assigned.
    ///
    /// Not retried. If the connection fails mid-request the insert may or
    /// may not have been applied.
    pub fn insert(&self, record: Record) -> ClientResult<RecordId> {
        match self.client.round_trip(Request::Insert {
            namespace: self.namespace.clone(),
            record,
        })? {
            Response::Inserted { id } => Ok(id),
            other => Err(unexpected("inserted", &other)),
        }
    }

    /// Number of records in the collection.
    pub fn count(&self) -> ClientResult<u64> {
        match self.client.round_trip(Request::Count {
            namespace: self.namespace.clone(),
        })? {
            Response::Count { count } => Ok(count),
            other => Err(unexpected("count", &other)),
        }
    }

    /// Runs a query and returns a cursor over the matches.
    ///
    /// The result set is fixed when the query runs. Records arrive in
    /// insertion order, one batch at a time.
    ///
    /// # Errors
    ///
    /// [`ClientError::Query`](crate::ClientError::Query) if the filter is
    /// malformed or a pattern is applied to a non-text field.
    pub fn find(&self, filter: Filter) -> ClientResult<Cursor<'c>> {
        self.find_batched(filter, self.client.config().batch_size)
    }

    /// Returns the first match, if any.
    pub fn find_one(&self, filter: Filter) -> ClientResult<Option<StoredRecord>> {
        self.find_batched(filter, 1)?.next().transpose()
    }

    fn find_batched(&self, filter: Filter, batch_size: u32) -> ClientResult<Cursor<'c>> {
        let response = self.client.round_trip(Request::Find {
            namespace: self.namespace.clone(),
            filter,
            batch_size,
        })?;
        Cursor::open(self.client, response, batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ClientError;
    use crate::transport::MockTransport;
    use recstore_codec::record;
    use recstore_protocol::{ErrorKind, PROTOCOL_VERSION};

    fn client(mock: &MockTransport) -> Client {
        mock.push_response(Response::Hello {
            protocol_version: PROTOCOL_VERSION,
            server: "mock".into(),
        });
        Client::with_transport(Box::new(mock.clone()), ClientConfig::default()).unwrap()
    }

    #[test]
    fn handles_send_nothing() {
        let mock = MockTransport::new();
        let client = client(&mock);
        let coll = client.database("mydb").collection("testCollection");
        assert_eq!(coll.name(), "testCollection");
        assert_eq!(coll.database_name(), "mydb");
        assert_eq!(mock.requests().len(), 1);
    }

    #[test]
    fn requests_target_the_namespace() {
        let mock = MockTransport::new();
        let client = client(&mock);
        let coll = client.database("mydb").collection("testCollection");

        mock.push_response(Response::IndexEnsured { created: true });
        assert!(coll.ensure_index("type").unwrap());

        mock.push_response(Response::Count { count: 4 });
        assert_eq!(coll.count().unwrap(), 4);

        let requests = mock.requests();
        assert_eq!(
            requests[1],
            Request::EnsureIndex {
                namespace: Namespace::new("mydb", "testCollection"),
                field: "type".into(),
            }
        );
        assert_eq!(
            requests[2],
            Request::Count {
                namespace: Namespace::new("mydb", "testCollection"),
            }
        );
    }

    #[test]
    fn error_responses_become_errors() {
        let mock = MockTransport::new();
        let client = client(&mock);
        let coll = client.database("mydb").collection("c");

        mock.push_response(Response::error(ErrorKind::Store, "bad field"));
        assert!(matches!(coll.ensure_index(""), Err(ClientError::Store(_))));

        mock.push_response(Response::error(ErrorKind::Query, "not text"));
        assert!(matches!(
            coll.find(Filter::pattern("count", "1")),
            Err(ClientError::Query(_))
        ));

        mock.push_response(Response::Indexes { fields: vec![] });
        assert!(matches!(
            coll.insert(record! { "a" => 1 }),
            Err(ClientError::Protocol(_))
        ));
    }
}
