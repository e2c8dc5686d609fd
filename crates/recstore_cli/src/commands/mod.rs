//! CLI command implementations.

pub mod insert;
pub mod search;
pub mod serve;

use recstore_codec::{record, Record};

/// Index declared by `insert`.
pub const INDEX_FIELD: &str = "type";

/// Records written by `insert`.
pub fn sample_records() -> Vec<Record> {
    let info = || record! { "x" => 203, "y" => "102" };
    vec![
        record! { "name" => "MongoDB", "type" => "database", "count" => 10, "info" => info() },
        record! { "name" => "CouchDB", "type" => "database", "count" => 1, "info" => info() },
        record! { "name" => "Apache", "type" => "webserver", "count" => 7, "info" => info() },
    ]
}
