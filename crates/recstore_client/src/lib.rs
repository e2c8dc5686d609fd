//! # RecStore Client
//!
//! Blocking client for RecStore document collections.
//!
//! This crate provides:
//! - [`Client`]: one connection to a server, with handshake and clean close
//! - [`Database`] and [`Collection`] handles, created without a round trip
//! - Index declaration, insert, count and filtered queries
//! - [`Cursor`]: lazily fetched query results
//!
//! ## Transports
//!
//! The client talks through the [`StoreTransport`] trait. [`TcpTransport`] is
//! used by [`Client::connect`]; [`LoopbackTransport`] hands frames to an
//! in-process server; [`MockTransport`] replays canned responses in tests.
//!
//! ## Example
//!
//! ```rust,ignore
//! use recstore_client::{Client, Filter};
//!
//! let client = Client::connect("recstore://localhost")?;
//! let coll = client.database("mydb").collection("testCollection");
//! for stored in coll.find(Filter::equals("type", "database"))? {
//!     println!("{}", stored?.record);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod address;
mod client;
mod collection;
mod config;
mod cursor;
mod error;
mod loopback;
mod tcp;
mod transport;

pub use address::ServerAddress;
pub use client::Client;
pub use collection::{Collection, Database};
pub use config::ClientConfig;
pub use cursor::Cursor;
pub use error::{ClientError, ClientResult};
pub use loopback::{LoopbackServer, LoopbackTransport};
pub use tcp::TcpTransport;
pub use transport::{MockTransport, StoreTransport};

// Re-export protocol types that appear in the public API
pub use recstore_protocol::{Filter, PatternSyntax, RecordId, StoredRecord, DEFAULT_PORT};
