//! Stress tests for sequences and accession minting.
//!
//! These tests verify that concurrent callers never receive the same
//! sequence value or accession.

use pride_core::model::ArchiveFile;
use pride_core::service::FileService;
use pride_core::store::SharedStore;
use pride_core::SequenceAllocator;
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone, Serialize)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Values handed out more than once.
    pub duplicates: usize,
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
            duplicates: 0,
            duration,
            ops_per_second,
        }
    }

    /// Records how many values were seen twice.
    #[must_use]
    pub fn with_duplicates(mut self, duplicates: usize) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duplicates: {}", self.duplicates);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }

    /// The result as a JSON object.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("Stress result should serialize")
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Values reserved per operation.
    pub batch_size: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            threads: 4,
            batch_size: 1,
        }
    }
}

fn count_duplicates<T: Eq + Hash>(values: Vec<T>) -> usize {
    let total = values.len();
    let unique: HashSet<T> = values.into_iter().collect();
    total - unique.len()
}

/// Reserves blocks of `config.batch_size` values from `sequence` on
/// `config.threads` threads at once.
///
/// Every reserved value is checked for uniqueness across all threads.
pub fn stress_sequence_reservations(
    store: SharedStore,
    sequence: &str,
    config: &StressConfig,
) -> StressTestResult {
    let allocator = SequenceAllocator::new(store);
    let per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let allocator = allocator.clone();
            let sequence = sequence.to_string();
            let batch = config.batch_size;
            thread::spawn(move || {
                let mut values = Vec::new();
                let mut failed = 0usize;
                for _ in 0..per_thread {
                    match allocator.reserve_range(&sequence, batch) {
                        Ok(range) => values.extend(range),
                        Err(_) => failed += 1,
                    }
                }
                (values, failed)
            })
        })
        .collect();

    let mut values = Vec::new();
    let mut failed = 0usize;
    for handle in handles {
        let (thread_values, thread_failed) = handle.join().expect("Stress thread panicked");
        values.extend(thread_values);
        failed += thread_failed;
    }
    let duration = start.elapsed();

    let successful = per_thread * config.threads - failed;
    StressTestResult::new(successful, failed, duration).with_duplicates(count_duplicates(values))
}

/// Inserts files from `config.threads` threads at once and checks every
/// minted accession is unique.
pub fn stress_concurrent_inserts(
    files: Arc<FileService>,
    config: &StressConfig,
) -> StressTestResult {
    let per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let files = Arc::clone(&files);
            thread::spawn(move || {
                let mut accessions = Vec::new();
                let mut failed = 0usize;
                for i in 0..per_thread {
                    let mut file = ArchiveFile::new(format!("t{t}-{i}.raw"));
                    match files.insert(&mut file) {
                        Ok(accession) => accessions.push(accession),
                        Err(_) => failed += 1,
                    }
                }
                (accessions, failed)
            })
        })
        .collect();

    let mut accessions = Vec::new();
    let mut failed = 0usize;
    for handle in handles {
        let (thread_accessions, thread_failed) = handle.join().expect("Stress thread panicked");
        accessions.extend(thread_accessions);
        failed += thread_failed;
    }
    let duration = start.elapsed();

    StressTestResult::new(accessions.len(), failed, duration)
        .with_duplicates(count_duplicates(accessions))
}

/// Inserts `config.operations` files in batches of `config.batch_size`.
pub fn stress_batch_inserts(files: &FileService, config: &StressConfig) -> StressTestResult {
    let batch = config.batch_size.max(1) as usize;

    let start = Instant::now();
    let mut accessions = Vec::new();
    let mut failed = 0usize;
    let mut remaining = config.operations;
    while remaining > 0 {
        let size = remaining.min(batch);
        let offset = config.operations - remaining;
        let batch_files = (offset..offset + size)
            .map(|i| ArchiveFile::new(format!("batch-{i}.raw")))
            .collect();
        match files.insert_all(batch_files) {
            Ok(results) => {
                for (_, result) in results {
                    match result {
                        Ok(file) => accessions.extend(file.accession),
                        Err(_) => failed += 1,
                    }
                }
            }
            Err(_) => failed += size,
        }
        remaining -= size;
    }

    StressTestResult::new(accessions.len(), failed, start.elapsed())
        .with_duplicates(count_duplicates(accessions))
}
