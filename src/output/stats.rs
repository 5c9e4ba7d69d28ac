//! Batch statistics reporting
//!
//! This module turns a finished batch report into the human-readable
//! summary printed at the end of a run.

use crate::scraper::BatchReport;

/// Aggregate numbers for a finished batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStatistics {
    /// Threads in the batch
    pub threads: usize,

    /// Threads whose export was written
    pub written: usize,

    /// Threads whose export failed to write
    pub write_failures: usize,

    /// Entries across all threads
    pub entries: usize,

    /// Pages across all threads
    pub pages: u64,

    /// Pages that degraded to an empty result
    pub degraded_pages: usize,
}

impl BatchStatistics {
    /// Computes statistics from a batch report
    pub fn from_report(report: &BatchReport) -> Self {
        let mut stats = Self {
            threads: report.threads.len(),
            ..Self::default()
        };

        for thread in &report.threads {
            stats.entries += thread.entries;
            stats.pages += u64::from(thread.page_count);
            stats.degraded_pages += thread.degraded_pages.len();
            if thread.output.is_ok() {
                stats.written += 1;
            } else {
                stats.write_failures += 1;
            }
        }

        stats
    }
}

/// Prints a batch report to stdout in a formatted manner
pub fn print_report(report: &BatchReport) {
    let stats = BatchStatistics::from_report(report);

    println!("=== Export Statistics ===\n");
    println!("  Threads: {}", stats.threads);
    println!("  Written: {}", stats.written);
    println!("  Pages fetched: {}", stats.pages);
    println!("  Entries exported: {}", stats.entries);
    println!();

    if stats.degraded_pages > 0 || stats.write_failures > 0 {
        println!("Problems:");
        for thread in &report.threads {
            if !thread.degraded_pages.is_empty() {
                println!(
                    "  - {}: {} page(s) came back empty {:?}",
                    thread.thread,
                    thread.degraded_pages.len(),
                    thread.degraded_pages
                );
            }
            if let Err(e) = &thread.output {
                println!("  - {}: write failed: {}", thread.thread, e);
            }
        }
        println!();
    }

    println!(
        "It took {:.2} seconds to scrape {} thread(s).",
        report.elapsed().as_secs_f64(),
        stats.threads
    );
}
