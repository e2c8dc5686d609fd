//! Protocol messages.
//!
//! Every exchange is one [`Request`] frame answered by one [`Response`]
//! frame. Bodies are CBOR; see [`crate::frame`] for the envelope.

use crate::filter::Filter;
use crate::record::{RecordId, StoredRecord};
use recstore_codec::Record;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version spoken by this crate.
pub const PROTOCOL_VERSION: u16 = 1;

/// Port a server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 7017;

/// Database and collection a request targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    /// Database name.
    pub database: String,
    /// Collection name.
    pub collection: String,
}

impl Namespace {
    /// Creates a namespace.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// A client request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    /// First message on a connection.
    Hello {
        /// Client protocol version.
        protocol_version: u16,
        /// Free-form client identification.
        client: String,
    },
    /// Declare an equality index on a field.
    EnsureIndex {
        /// Target collection.
        namespace: Namespace,
        /// Field path to index.
        field: String,
    },
    /// List indexed fields.
    ListIndexes {
        /// Target collection.
        namespace: Namespace,
    },
    /// Append a record.
    Insert {
        /// Target collection.
        namespace: Namespace,
        /// Record to store.
        record: Record,
    },
    /// Count records.
    Count {
        /// Target collection.
        namespace: Namespace,
    },
    /// Run a query and open a cursor over its results.
    Find {
        /// Target collection.
        namespace: Namespace,
        /// Selection predicate.
        filter: Filter,
        /// Records to return in the first batch (0 = server default).
        batch_size: u32,
    },
    /// Fetch the next batch from an open cursor.
    GetMore {
        /// Cursor returned by `Find`.
        cursor_id: u64,
        /// Records to return (0 = server default).
        batch_size: u32,
    },
    /// Release an open cursor.
    KillCursor {
        /// Cursor to release.
        cursor_id: u64,
    },
    /// List collections that exist in a database.
    ListCollections {
        /// Database name.
        database: String,
    },
}

impl Request {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Hello { .. } => "hello",
            Request::EnsureIndex { .. } => "ensure_index",
            Request::ListIndexes { .. } => "list_indexes",
            Request::Insert { .. } => "insert",
            Request::Count { .. } => "count",
            Request::Find { .. } => "find",
            Request::GetMore { .. } => "get_more",
            Request::KillCursor { .. } => "kill_cursor",
            Request::ListCollections { .. } => "list_collections",
        }
    }
}

/// Class of a server-reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Write or index request rejected.
    Store,
    /// Malformed filter or type mismatch while matching.
    Query,
    /// Undecodable or out-of-sequence request.
    Protocol,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Store => f.write_str("store"),
            ErrorKind::Query => f.write_str("query"),
            ErrorKind::Protocol => f.write_str("protocol"),
        }
    }
}

/// A server response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    /// Answer to `Hello`.
    Hello {
        /// Server protocol version.
        protocol_version: u16,
        /// Free-form server identification.
        server: String,
    },
    /// Answer to `EnsureIndex`.
    IndexEnsured {
        /// False when the index already existed.
        created: bool,
    },
    /// Answer to `ListIndexes`.
    Indexes {
        /// Indexed field paths, sorted.
        fields: Vec<String>,
    },
    /// Answer to `Insert`.
    Inserted {
        /// Identifier of the new record.
        id: RecordId,
    },
    /// Answer to `Count`.
    Count {
        /// Number of records.
        count: u64,
    },
    /// Answer to `Find` and `GetMore`.
    Batch {
        /// Cursor to continue with; 0 once exhausted.
        cursor_id: u64,
        /// Records in this batch, in result order.
        records: Vec<StoredRecord>,
        /// True when no records remain.
        exhausted: bool,
    },
    /// Answer to `KillCursor`.
    CursorKilled {
        /// False when the cursor was unknown.
        found: bool,
    },
    /// Answer to `ListCollections`.
    Collections {
        /// Collection names, sorted.
        names: Vec<String>,
    },
    /// Request failed.
    Error {
        /// Failure class.
        kind: ErrorKind,
        /// Human-readable description.
        message: String,
    },
}

impl Response {
    /// Creates an error response.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error {
            kind,
            message: message.into(),
        }
    }

    /// Short name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Response::Hello { .. } => "hello",
            Response::IndexEnsured { .. } => "index_ensured",
            Response::Indexes { .. } => "indexes",
            Response::Inserted { .. } => "inserted",
            Response::Count { .. } => "count",
            Response::Batch { .. } => "batch",
            Response::CursorKilled { .. } => "cursor_killed",
            Response::Collections { .. } => "collections",
            Response::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recstore_codec::{record, Decode, Encode};

    #[test]
    fn find_request_survives_encoding() {
        let request = Request::Find {
            namespace: Namespace::new("mydb", "testCollection"),
            filter: Filter::equals("type", "database").and(Filter::pattern("name", "ch")),
            batch_size: 2,
        };
        let decoded = Request::decode(&request.encode().unwrap()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn batch_response_keeps_record_order() {
        let records = vec![
            StoredRecord::new(RecordId::generate(), record! { "name" => "MongoDB", "count" => 10 }),
            StoredRecord::new(RecordId::generate(), record! { "name" => "Apache" }),
        ];
        let response = Response::Batch {
            cursor_id: 7,
            records: records.clone(),
            exhausted: false,
        };
        match Response::decode(&response.encode().unwrap()).unwrap() {
            Response::Batch {
                cursor_id,
                records: decoded,
                exhausted,
            } => {
                assert_eq!(cursor_id, 7);
                assert!(!exhausted);
                assert_eq!(decoded, records);
                let names: Vec<_> = decoded[0].record.field_names().collect();
                assert_eq!(names, vec!["name", "count"]);
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn error_response() {
        let response = Response::error(ErrorKind::Query, "bad pattern");
        let decoded = Response::decode(&response.encode().unwrap()).unwrap();
        assert_eq!(decoded, response);
        assert_eq!(decoded.name(), "error");
    }

    #[test]
    fn garbage_is_not_a_request() {
        assert!(Request::decode(&[0xff, 0x00, 0x13]).is_err());
    }

    #[test]
    fn names() {
        assert_eq!(Request::Count { namespace: Namespace::new("a", "b") }.name(), "count");
        assert_eq!(Namespace::new("mydb", "testCollection").to_string(), "mydb.testCollection");
        assert_eq!(ErrorKind::Store.to_string(), "store");
    }
}
