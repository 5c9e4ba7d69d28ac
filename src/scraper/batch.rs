//! Batch driver - runs many thread scrapes under one concurrency bound
//!
//! Each thread is scraped in its own task and written out as soon as it is
//! complete. A failure writing one thread is reported and the rest of the
//! batch carries on.

use crate::config::Config;
use crate::diagnostics::SharedDiagnostics;
use crate::output::{DataWriter, FileWriter, OutputFormat};
use crate::scraper::fetcher::{
    build_http_client, HttpSource, PageCountResolver, PageSource, RetryingFetcher,
};
use crate::scraper::gate::ConcurrencyGate;
use crate::scraper::parser::Entry;
use crate::scraper::pool::ParsePool;
use crate::scraper::thread::ThreadScraper;
use crate::ScrapeError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// What happened to one thread of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadReport {
    pub thread: String,
    pub page_count: u32,
    pub entries: usize,
    pub degraded_pages: Vec<u32>,

    /// Where the export was written, or why it was not
    pub output: Result<PathBuf, String>,
}

/// Outcome of a whole batch
///
/// Threads are listed in completion order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub threads: Vec<ThreadReport>,
}

impl BatchReport {
    /// Wall-clock duration of the batch
    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Threads whose export could not be written
    pub fn failures(&self) -> impl Iterator<Item = &ThreadReport> {
        self.threads.iter().filter(|t| t.output.is_err())
    }

    /// Looks up the report for `thread`
    pub fn thread(&self, thread: &str) -> Option<&ThreadReport> {
        self.threads.iter().find(|t| t.thread == thread)
    }
}

/// Drives thread scrapes and hands results to the writer
pub struct BatchDriver {
    scraper: Arc<ThreadScraper>,
    writer: Arc<dyn DataWriter>,
    format: OutputFormat,
    max_concurrent_threads: usize,
    diagnostics: SharedDiagnostics,
}

impl BatchDriver {
    /// Creates a new batch driver
    ///
    /// # Arguments
    ///
    /// * `scraper` - Scraper used for every thread
    /// * `writer` - Destination for finished threads
    /// * `format` - Export format passed to the writer
    /// * `max_concurrent_threads` - Bound on threads scraped at once
    /// * `diagnostics` - Sink for thread events
    pub fn new(
        scraper: ThreadScraper,
        writer: Arc<dyn DataWriter>,
        format: OutputFormat,
        max_concurrent_threads: usize,
        diagnostics: SharedDiagnostics,
    ) -> Self {
        Self {
            scraper: Arc::new(scraper),
            writer,
            format,
            max_concurrent_threads,
            diagnostics,
        }
    }

    /// Wires up the HTTP source, parse pool, scraper and file writer from config
    pub fn from_config(config: &Config, diagnostics: SharedDiagnostics) -> Result<Self, ScrapeError> {
        let client = build_http_client(&config.http)?;
        let source: Arc<dyn PageSource> = Arc::new(HttpSource::new(client));
        let pool = ParsePool::new(config.scraper.parse_workers as usize);

        let scraper = ThreadScraper::new(
            config.scraper.base_url.clone(),
            PageCountResolver::new(Arc::clone(&source), pool.clone())
                .with_page_limit(config.scraper.page_limit),
            RetryingFetcher::new(source, pool, config.retry.policy()),
            config.scraper.max_concurrent_pages as usize,
            Arc::clone(&diagnostics),
        );

        let writer = Arc::new(FileWriter::new(&config.output.directory));

        Ok(Self::new(
            scraper,
            writer,
            config.output.format,
            config.scraper.max_concurrent_threads as usize,
            diagnostics,
        ))
    }

    /// Scrapes and writes every thread in `threads`
    ///
    /// Never fails as a whole; per-thread problems are in the report.
    pub async fn run(&self, threads: &[String]) -> BatchReport {
        let started_at = Utc::now();
        tracing::info!(
            threads = threads.len(),
            max_concurrent = self.max_concurrent_threads,
            "Started scraping"
        );

        let gate = ConcurrencyGate::new(self.max_concurrent_threads);
        let mut tasks = JoinSet::new();

        for thread in threads {
            let thread = thread.clone();
            let gate = gate.clone();
            let scraper = Arc::clone(&self.scraper);
            let writer = Arc::clone(&self.writer);
            let diagnostics = Arc::clone(&self.diagnostics);
            let format = self.format;

            tasks.spawn(async move {
                let permit = match gate.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let reason = e.to_string();
                        diagnostics.thread_failed(&thread, &reason);
                        return ThreadReport {
                            thread,
                            page_count: 0,
                            entries: 0,
                            degraded_pages: Vec::new(),
                            output: Err(reason),
                        };
                    }
                };

                let result = scraper.scrape(&thread).await;
                drop(permit);

                let entries = result.entries.len();
                let output = write_thread(writer, thread.clone(), result.entries, format).await;
                match &output {
                    Ok(path) => {
                        diagnostics.thread_succeeded(&thread, entries, &path.display().to_string())
                    }
                    Err(reason) => diagnostics.thread_failed(&thread, reason),
                }

                ThreadReport {
                    thread,
                    page_count: result.page_count,
                    entries,
                    degraded_pages: result.degraded_pages,
                    output,
                }
            });
        }

        let mut reports = Vec::with_capacity(threads.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!(error = %e, "Thread task aborted"),
            }
        }

        // A panicked task leaves its thread unreported.
        let reported: HashSet<String> = reports.iter().map(|r| r.thread.clone()).collect();
        for thread in threads {
            if !reported.contains(thread) {
                let reason = "thread task panicked".to_string();
                self.diagnostics.thread_failed(thread, &reason);
                reports.push(ThreadReport {
                    thread: thread.clone(),
                    page_count: 0,
                    entries: 0,
                    degraded_pages: Vec::new(),
                    output: Err(reason),
                });
            }
        }

        BatchReport {
            started_at,
            finished_at: Utc::now(),
            threads: reports,
        }
    }
}

/// Writes one thread on a blocking worker
async fn write_thread(
    writer: Arc<dyn DataWriter>,
    thread: String,
    entries: Vec<Entry>,
    format: OutputFormat,
) -> Result<PathBuf, String> {
    tokio::task::spawn_blocking(move || writer.write(&thread, &entries, format))
        .await
        .map_err(|e| format!("writer task failed: {}", e))?
        .map_err(|e| e.to_string())
}
