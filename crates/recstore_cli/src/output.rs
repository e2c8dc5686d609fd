//! Record rendering for terminal output.

use recstore_codec::Record;
use recstore_protocol::StoredRecord;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::io::Write;

/// Width of the rule printed before each result section.
pub const RULE_WIDTH: usize = 30;

/// A stored record with its id rendered as the leading `_id` field.
struct WithId<'a>(&'a StoredRecord);

impl Serialize for WithId<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = &self.0.record;
        let mut map = serializer.serialize_map(Some(record.len() + 1))?;
        map.serialize_entry("_id", &self.0.id)?;
        for (field, value) in record.iter() {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

/// Writes a record as pretty JSON, fields in insertion order.
pub fn write_record(
    out: &mut impl Write,
    record: &Record,
) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(&mut *out, record)?;
    writeln!(out)?;
    Ok(())
}

/// Writes a stored record as pretty JSON with its `_id` first.
pub fn write_stored(
    out: &mut impl Write,
    stored: &StoredRecord,
) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(&mut *out, &WithId(stored))?;
    writeln!(out)?;
    Ok(())
}

/// Writes a section heading: a dashed rule followed by the title.
pub fn write_section(out: &mut impl Write, title: &str) -> std::io::Result<()> {
    writeln!(out, "{} {}", "-".repeat(RULE_WIDTH), title)
}
