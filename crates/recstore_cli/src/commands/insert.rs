//! Insert command implementation.

use super::{sample_records, INDEX_FIELD};
use crate::output::write_record;
use recstore_client::Client;
use std::io::Write;
use tracing::info;

/// Runs the insert command.
///
/// Declares the index on `type`, then prints and inserts each sample record.
pub fn run(
    client: &Client,
    database: &str,
    collection: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let coll = client.database(database).collection(collection);

    if coll.ensure_index(INDEX_FIELD)? {
        info!(collection = %coll.namespace(), field = INDEX_FIELD, "index created");
    }

    for record in sample_records() {
        write_record(out, &record)?;
        let id = coll.insert(record)?;
        info!(%id, "record inserted");
    }

    Ok(())
}
