//! Scraper module for thread page fetching and processing
//!
//! This module contains the core scraping logic, including:
//! - Page-count discovery and entry parsing
//! - HTTP fetching with retry and exponential backoff
//! - Concurrency gates for pages and threads
//! - A bounded worker pool for CPU-bound parsing
//! - Per-thread and per-batch orchestration

mod batch;
mod fetcher;
mod gate;
mod parser;
mod pool;
mod retry;
mod thread;

pub use batch::{BatchDriver, BatchReport, ThreadReport};
pub use fetcher::{
    build_http_client, page_url, thread_url, HttpSource, PageCount, PageCountResolver, PageSource,
    RetryingFetcher,
};
pub use gate::{ConcurrencyGate, GatePermit};
pub use parser::{parse_entries, parse_page_count, split_dates, Entry};
pub use pool::{ParsePool, PoolError};
pub use retry::{retry_with_backoff, RetryError, RetryPolicy};
pub use thread::{ThreadResult, ThreadScraper};

use crate::config::Config;
use crate::diagnostics::SharedDiagnostics;
use crate::ScrapeError;

/// Scrapes and exports a batch of threads
///
/// This is the main entry point for a run. It will:
/// 1. Build the HTTP client and parse pool from the configuration
/// 2. Scrape each thread, at most `max-concurrent-threads` at a time
/// 3. Write every finished thread to `{directory}/{thread}.{format}`
///
/// # Returns
///
/// * `Ok(BatchReport)` - Per-thread outcomes; individual threads may have failed
/// * `Err(ScrapeError)` - The HTTP client could not be built
pub async fn scrape_batch(
    config: &Config,
    threads: &[String],
    diagnostics: SharedDiagnostics,
) -> Result<BatchReport, ScrapeError> {
    let driver = BatchDriver::from_config(config, diagnostics)?;
    Ok(driver.run(threads).await)
}
