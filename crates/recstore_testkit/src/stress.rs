//! Stress tests for RecStore.
//!
//! These exercise a server under concurrent clients and a single client
//! shared between threads.

use recstore_client::{Client, Filter};
use recstore_codec::record;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Database to write to.
    pub database: String,
    /// Collection to write to.
    pub collection: String,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 200,
            threads: 4,
            database: "stress".into(),
            collection: "records".into(),
        }
    }
}

/// Inserts from several threads sharing one client.
///
/// Each record carries its thread number in `worker` and its sequence
/// number in `seq`.
pub fn stress_shared_client_inserts(client: &Client, config: &StressConfig) -> StressTestResult {
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|scope| {
        for worker in 0..config.threads {
            let successful = &successful;
            let failed = &failed;
            scope.spawn(move || {
                let coll = client
                    .database(config.database.as_str())
                    .collection(config.collection.as_str());
                for seq in 0..config.operations {
                    let record = record! { "worker" => worker as i64, "seq" => seq as i64 };
                    match coll.insert(record) {
                        Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            });
        }
    });

    StressTestResult::new(
        successful.into_inner(),
        failed.into_inner(),
        start.elapsed(),
    )
}

/// Runs one client per thread, each inserting then reading back its own
/// records with an equality filter.
pub fn stress_concurrent_clients<F>(connect: F, config: &StressConfig) -> StressTestResult
where
    F: Fn() -> Client + Sync,
{
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|scope| {
        for worker in 0..config.threads {
            let connect = &connect;
            let successful = &successful;
            let failed = &failed;
            scope.spawn(move || {
                let client = connect();
                let coll = client
                    .database(config.database.as_str())
                    .collection(config.collection.as_str());
                for seq in 0..config.operations {
                    let record = record! { "worker" => worker as i64, "seq" => seq as i64 };
                    match coll.insert(record) {
                        Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }

                let mine = coll
                    .find(Filter::equals("worker", worker as i64))
                    .and_then(|cursor| cursor.collect_records());
                match mine {
                    Ok(records) if records.len() == config.operations => {
                        successful.fetch_add(1, Ordering::Relaxed)
                    }
                    _ => failed.fetch_add(1, Ordering::Relaxed),
                };
            });
        }
    });

    StressTestResult::new(
        successful.into_inner(),
        failed.into_inner(),
        start.elapsed(),
    )
}
