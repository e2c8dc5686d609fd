//! # RecStore Testkit
//!
//! Test utilities for RecStore.
//!
//! This crate provides:
//! - The sample data set and in-process client helpers
//! - A TCP test server on an ephemeral port
//! - Property-based test generators using proptest
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use recstore_testkit::prelude::*;
//!
//! #[test]
//! fn test_over_tcp() {
//!     let server = TestServer::start();
//!     let client = server.client();
//!     scenarios::load_samples(&client);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod server;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::server::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use server::*;
pub use stress::*;
