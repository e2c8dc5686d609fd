//! # RecStore Protocol
//!
//! Wire messages, filters and framing shared by the RecStore client and
//! reference server.
//!
//! This crate provides:
//! - [`Request`] / [`Response`] messages (CBOR bodies)
//! - [`Filter`] and its evaluation against records
//! - [`RecordId`] and [`StoredRecord`]
//! - Length-prefixed framing over any `Read`/`Write`
//!
//! This is a pure protocol crate; it opens no sockets.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod filter;
pub mod frame;
mod messages;
mod record;

pub use error::{ProtocolError, ProtocolResult};
pub use filter::{validate_field_path, CompiledFilter, Filter, PatternSyntax};
pub use frame::{read_frame, write_frame, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_LEN};
pub use messages::{ErrorKind, Namespace, Request, Response, DEFAULT_PORT, PROTOCOL_VERSION};
pub use record::{RecordId, StoredRecord};
