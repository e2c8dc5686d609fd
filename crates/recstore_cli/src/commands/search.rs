//! Search command implementation.

use crate::output::{write_section, write_stored};
use recstore_client::{Client, Collection, Filter};
use std::io::Write;

/// Runs the search command.
///
/// Prints the record count, then every record, then the `database` records,
/// then the records whose name matches `ch`.
pub fn run(
    client: &Client,
    database: &str,
    collection: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let coll = client.database(database).collection(collection);

    writeln!(out, "count = {}", coll.count()?)?;

    let sections = [
        ("search all", Filter::all()),
        ("Search with a Query", Filter::equals("type", "database")),
        ("Search with regexp", Filter::pattern("name", "ch")),
    ];
    for (title, filter) in sections {
        write_section(out, title)?;
        print_matches(&coll, filter, out)?;
    }

    Ok(())
}

fn print_matches(
    coll: &Collection<'_>,
    filter: Filter,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    for stored in coll.find(filter)? {
        write_stored(out, &stored?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::insert;
    use recstore_testkit::TestServer;

    fn names_in(section: &str) -> Vec<&str> {
        ["MongoDB", "CouchDB", "Apache"]
            .into_iter()
            .filter(|name| section.contains(&format!("\"{}\"", name)))
            .collect()
    }

    #[test]
    fn prints_three_sections() {
        let server = TestServer::start();
        let client = server.client();
        insert::run(&client, "mydb", "testCollection", &mut std::io::sink()).unwrap();

        let mut out = Vec::new();
        run(&client, "mydb", "testCollection", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let rule = "-".repeat(30);
        let parts: Vec<&str> = text.split(&rule).collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "count = 3\n");
        assert!(parts[1].starts_with(" search all\n"));
        assert_eq!(names_in(parts[1]), vec!["MongoDB", "CouchDB", "Apache"]);
        assert!(parts[2].starts_with(" Search with a Query\n"));
        assert_eq!(names_in(parts[2]), vec!["MongoDB", "CouchDB"]);
        assert!(parts[3].starts_with(" Search with regexp\n"));
        assert_eq!(names_in(parts[3]), vec!["CouchDB", "Apache"]);
        assert_eq!(text.matches("\"_id\"").count(), 7);
    }

    #[test]
    fn empty_collection() {
        let server = TestServer::start();
        let client = server.client();
        let mut out = Vec::new();
        run(&client, "mydb", "nothing", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("count = 0\n"));
        assert!(!text.contains("_id"));
    }
}
