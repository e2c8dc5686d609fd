//! End-to-end tests over TCP.

use recstore_client::{Client, ClientConfig, ClientError, Filter, StoredRecord};
use recstore_codec::{record, Value};
use recstore_protocol::PatternSyntax;
use recstore_server::ServerConfig;
use recstore_testkit::prelude::*;
use std::net::TcpListener;
use std::time::Duration;

fn names(records: &[StoredRecord]) -> Vec<String> {
    records
        .iter()
        .map(|s| s.record.get("name").and_then(Value::as_text).unwrap().to_string())
        .collect()
}

fn find_names(client: &Client, filter: Filter) -> Vec<String> {
    let coll = client.database(SAMPLE_DATABASE).collection(SAMPLE_COLLECTION);
    names(&coll.find(filter).unwrap().collect_records().unwrap())
}

#[test]
fn sample_session() {
    let server = TestServer::start();
    let client = server.client();
    scenarios::load_samples(&client);

    let coll = client.database(SAMPLE_DATABASE).collection(SAMPLE_COLLECTION);
    assert_eq!(coll.count().unwrap(), 3);
    assert_eq!(
        find_names(&client, Filter::all()),
        vec!["MongoDB", "CouchDB", "Apache"]
    );
    assert_eq!(
        find_names(&client, Filter::equals("type", "database")),
        vec!["MongoDB", "CouchDB"]
    );
    assert_eq!(
        find_names(&client, Filter::pattern("name", "ch")),
        vec!["CouchDB", "Apache"]
    );
}

#[test]
fn data_outlives_the_connection() {
    let server = TestServer::start();
    {
        let client = server.client();
        scenarios::load_samples(&client);
        client.close().unwrap();
    }
    let client = server.client();
    let coll = client.database(SAMPLE_DATABASE).collection(SAMPLE_COLLECTION);
    assert_eq!(coll.count().unwrap(), 3);
    assert_eq!(coll.indexes().unwrap(), vec![SAMPLE_INDEX_FIELD]);
    assert!(!coll.ensure_index(SAMPLE_INDEX_FIELD).unwrap());
}

#[test]
fn inserted_records_come_back_unchanged() {
    let server = TestServer::start();
    let client = server.client();
    let coll = client.database("mydb").collection("roundTrip");

    let mut ids = Vec::new();
    for record in sample_records() {
        ids.push(coll.insert(record).unwrap());
    }
    let stored = coll.find(Filter::all()).unwrap().collect_records().unwrap();
    assert_eq!(stored.iter().map(|s| s.id).collect::<Vec<_>>(), ids);
    assert_eq!(
        stored.into_iter().map(StoredRecord::into_record).collect::<Vec<_>>(),
        sample_records()
    );
}

#[test]
fn cursor_fetches_lazily_over_tcp() {
    let server = TestServer::start();
    let client = server.client_with_config(ClientConfig::default().with_batch_size(3));
    let coll = client.database("mydb").collection("many");
    for n in 0..10 {
        coll.insert(record! { "n" => n }).unwrap();
    }

    let mut cursor = coll.find(Filter::all()).unwrap();
    assert_eq!(cursor.buffered(), 3);
    assert!(!cursor.is_exhausted());
    let seen: Vec<i64> = cursor
        .by_ref()
        .map(|r| r.unwrap().record.get("n").and_then(Value::as_integer).unwrap())
        .collect();
    assert_eq!(seen, (0..10).collect::<Vec<_>>());
    assert!(cursor.is_exhausted());
    assert_eq!(cursor.cursor_id(), 0);
}

#[test]
fn result_set_is_fixed_when_the_query_runs() {
    let server = TestServer::start();
    let client = server.client_with_config(ClientConfig::default().with_batch_size(1));
    let coll = client.database("mydb").collection("growing");
    for n in 0..3 {
        coll.insert(record! { "n" => n }).unwrap();
    }

    let mut cursor = coll.find(Filter::all()).unwrap();
    cursor.next().unwrap().unwrap();
    coll.insert(record! { "n" => 99 }).unwrap();
    assert_eq!(cursor.count(), 2);
    assert_eq!(coll.count().unwrap(), 4);
}

#[test]
fn abandoned_cursor_leaves_connection_usable() {
    let server = TestServer::start();
    let client = server.client_with_config(ClientConfig::default().with_batch_size(2));
    let coll = client.database("mydb").collection("abandon");
    for n in 0..6 {
        coll.insert(record! { "n" => n }).unwrap();
    }

    for _ in 0..5 {
        let mut cursor = coll.find(Filter::all()).unwrap();
        cursor.next().unwrap().unwrap();
    }
    let four = coll.find_one(Filter::equals("n", 4)).unwrap().unwrap();
    assert_eq!(four.record.get("n"), Some(&Value::Integer(4)));
    assert_eq!(coll.count().unwrap(), 6);
}

#[test]
fn missing_fields_never_match() {
    let server = TestServer::start();
    let client = server.client();
    scenarios::load_samples(&client);

    assert!(find_names(&client, Filter::equals("owner", "x")).is_empty());
    assert!(find_names(&client, Filter::pattern("owner", ".*")).is_empty());
    assert!(find_names(&client, Filter::equals("info.z", 1)).is_empty());
}

#[test]
fn equality_is_exact() {
    let server = TestServer::start();
    let client = server.client();
    scenarios::load_samples(&client);

    assert!(find_names(&client, Filter::equals("type", "Database")).is_empty());
    assert!(find_names(&client, Filter::equals("count", "10")).is_empty());
    assert_eq!(find_names(&client, Filter::equals("count", 10)), vec!["MongoDB"]);
    assert_eq!(
        find_names(&client, Filter::equals("info.y", "102")),
        vec!["MongoDB", "CouchDB", "Apache"]
    );
    assert!(find_names(&client, Filter::equals("info.y", 102)).is_empty());
}

#[test]
fn combined_filters() {
    let server = TestServer::start();
    let client = server.client();
    scenarios::load_samples(&client);

    assert_eq!(
        find_names(
            &client,
            Filter::equals("type", "database").and(Filter::pattern("name", "ch"))
        ),
        vec!["CouchDB"]
    );
    assert_eq!(
        find_names(&client, Filter::equals("type", "webserver").and(Filter::equals("count", 7))),
        vec!["Apache"]
    );
}

#[test]
fn pattern_on_integer_field_is_a_query_error() {
    let server = TestServer::start();
    let client = server.client();
    scenarios::load_samples(&client);

    let coll = client.database(SAMPLE_DATABASE).collection(SAMPLE_COLLECTION);
    let err = coll.find(Filter::pattern("count", "1")).unwrap_err();
    assert!(matches!(err, ClientError::Query(_)));
    assert!(client.is_connected());
}

#[test]
fn literal_pattern_syntax_escapes_metacharacters() {
    let config = ServerConfig::default().with_pattern_syntax(PatternSyntax::Literal);
    let server = TestServer::start_with_config(config);
    let client = server.client();
    let coll = client.database("mydb").collection("literal");
    coll.insert(record! { "name" => "a.b" }).unwrap();
    coll.insert(record! { "name" => "axb" }).unwrap();
    coll.insert(record! { "name" => "(x)" }).unwrap();

    let found = |pattern: &str| {
        names(
            &coll
                .find(Filter::pattern("name", pattern))
                .unwrap()
                .collect_records()
                .unwrap(),
        )
    };
    assert_eq!(found("."), vec!["a.b"]);
    assert_eq!(found("("), vec!["(x)"]);
    assert!(found("^a").is_empty());
}

#[test]
fn oversized_insert_is_rejected_without_losing_the_connection() {
    let server = TestServer::start_with_config(ServerConfig::default().with_max_frame_size(256));
    let client = server.client();
    let coll = client.database("mydb").collection("big");

    let err = coll.insert(record! { "blob" => "x".repeat(1024) }).unwrap_err();
    assert!(matches!(err, ClientError::Protocol(_)), "{:?}", err);
    assert!(client.is_connected());

    coll.insert(record! { "blob" => "small" }).unwrap();
    assert_eq!(coll.count().unwrap(), 1);
}

#[test]
fn unreachable_address_is_a_connection_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ClientConfig::default().with_connect_timeout(Some(Duration::from_secs(2)));
    let err = Client::connect_with_config(&format!("127.0.0.1:{}", port), config).unwrap_err();
    assert!(matches!(err, ClientError::Connection { .. }), "{:?}", err);
}

#[test]
fn invalid_address_is_rejected_before_connecting() {
    let err = Client::connect("http://localhost").unwrap_err();
    assert!(matches!(err, ClientError::InvalidAddress { .. }));
}

#[test]
fn server_shutdown_surfaces_as_connection_error() {
    let mut server = TestServer::start();
    let client = server.client_with_config(
        ClientConfig::default().with_io_timeout(Some(Duration::from_secs(5))),
    );
    let coll = client.database("mydb").collection("gone");
    coll.insert(record! { "a" => 1 }).unwrap();

    server.shutdown();
    let err = coll.count().unwrap_err();
    assert!(err.is_connection_error(), "{:?}", err);
    assert!(!client.is_connected());
    assert!(matches!(coll.count(), Err(ClientError::NotConnected)));
}

#[test]
fn clients_share_the_catalog() {
    let server = TestServer::start();
    let writer = server.client();
    let reader = server.client();
    scenarios::load_samples(&writer);

    let db = reader.database(SAMPLE_DATABASE);
    assert_eq!(db.collection_names().unwrap(), vec![SAMPLE_COLLECTION]);
    assert_eq!(db.collection(SAMPLE_COLLECTION).count().unwrap(), 3);
}

#[test]
fn concurrent_clients_over_tcp() {
    let server = TestServer::start();
    let config = StressConfig {
        operations: 25,
        threads: 4,
        ..Default::default()
    };
    let result = stress_concurrent_clients(|| server.client(), &config);
    assert_eq!(result.failed_ops, 0);

    let client = server.client();
    let shared = stress_shared_client_inserts(&client, &config);
    assert_eq!(shared.failed_ops, 0);
    assert_eq!(
        client.database("stress").collection("records").count().unwrap(),
        (2 * 4 * 25) as u64
    );
}
