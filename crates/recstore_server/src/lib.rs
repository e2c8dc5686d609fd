//! # RecStore Server
//!
//! Reference in-memory server for RecStore.
//!
//! This crate provides:
//! - A tokio TCP front end speaking the framed RecStore protocol
//! - Per-connection sessions owning their query cursors
//! - An in-memory catalog of collections with equality indexes
//!
//! Records live in memory only. There is no persistence, replication or
//! query planning beyond a single-field index lookup.
//!
//! ```rust,ignore
//! use recstore_server::{ServerConfig, StoreServer};
//!
//! let server = StoreServer::new(ServerConfig::default());
//! server.run(async { tokio::signal::ctrl_c().await.ok(); }).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod config;
mod error;
mod server;
mod session;

pub use catalog::Catalog;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use recstore_protocol::DEFAULT_PORT;
pub use server::StoreServer;
pub use session::{ServerContext, Session};
