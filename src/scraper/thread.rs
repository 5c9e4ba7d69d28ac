//! Per-thread orchestration
//!
//! Resolves the page count, fans out one gated fetch task per page, and
//! stitches the page results back together in page order once every task
//! has finished.

use crate::diagnostics::SharedDiagnostics;
use crate::scraper::fetcher::{page_url, thread_url, PageCount, PageCountResolver, RetryingFetcher};
use crate::scraper::gate::ConcurrencyGate;
use crate::scraper::parser::Entry;
use std::sync::Arc;
use tokio::task::JoinSet;

/// All entries of one thread, in page order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadResult {
    /// The thread identifier
    pub thread: String,

    /// Entries of pages `1..=page_count`, concatenated in page order
    pub entries: Vec<Entry>,

    /// Number of pages the thread was scraped as
    pub page_count: u32,

    /// Pages that degraded to an empty result, ascending
    pub degraded_pages: Vec<u32>,
}

/// Scrapes single threads
pub struct ThreadScraper {
    base_url: String,
    resolver: PageCountResolver,
    fetcher: Arc<RetryingFetcher>,
    max_concurrent_pages: usize,
    diagnostics: SharedDiagnostics,
}

impl ThreadScraper {
    /// Creates a new thread scraper
    ///
    /// # Arguments
    ///
    /// * `base_url` - Prefix thread identifiers are appended to
    /// * `resolver` - Page-count discovery
    /// * `fetcher` - Retried page fetches
    /// * `max_concurrent_pages` - Per-thread bound on in-flight page fetches
    /// * `diagnostics` - Sink for thread and page events
    pub fn new(
        base_url: impl Into<String>,
        resolver: PageCountResolver,
        fetcher: RetryingFetcher,
        max_concurrent_pages: usize,
        diagnostics: SharedDiagnostics,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            resolver,
            fetcher: Arc::new(fetcher),
            max_concurrent_pages,
            diagnostics,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scrapes every page of `thread`
    ///
    /// This never fails as a whole: a page that cannot be fetched or parsed
    /// contributes no entries and is listed in `degraded_pages`.
    pub async fn scrape(&self, thread: &str) -> ThreadResult {
        self.diagnostics.thread_started(thread);

        let landing = thread_url(&self.base_url, thread);
        let resolved = self.resolver.resolve(&landing).await;
        if let PageCount::Assumed { reason } = &resolved {
            self.diagnostics.page_count_fallback(thread, reason);
        }
        let page_count = resolved.get();
        tracing::debug!(thread, page_count, "Resolved page count");

        let pages = self.fetch_pages(thread, page_count).await;

        let mut degraded_pages = Vec::new();
        let mut entries = Vec::new();
        for (index, page) in pages.into_iter().enumerate() {
            match page {
                Some(page_entries) => entries.extend(page_entries),
                None => degraded_pages.push(index as u32 + 1),
            }
        }

        ThreadResult {
            thread: thread.to_string(),
            entries,
            page_count,
            degraded_pages,
        }
    }

    /// Fetches pages `1..=page_count` concurrently under one gate
    ///
    /// Slot `i` holds page `i + 1`; `None` marks a degraded page.
    async fn fetch_pages(&self, thread: &str, page_count: u32) -> Vec<Option<Vec<Entry>>> {
        let gate = ConcurrencyGate::new(self.max_concurrent_pages);
        let mut tasks = JoinSet::new();

        for page in 1..=page_count {
            let fetcher = Arc::clone(&self.fetcher);
            let gate = gate.clone();
            let url = page_url(&self.base_url, thread, page);

            tasks.spawn(async move {
                let outcome = fetcher.fetch_entries(&url, &gate).await;
                (page, url, outcome)
            });
        }

        let mut slots: Vec<Option<Vec<Entry>>> = vec![None; page_count as usize];
        let mut finished = vec![false; page_count as usize];

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((page, url, outcome)) => {
                    let index = (page - 1) as usize;
                    finished[index] = true;
                    match outcome {
                        Ok(page_entries) => {
                            tracing::debug!(thread, page, entries = page_entries.len(), "Page done");
                            slots[index] = Some(page_entries);
                        }
                        Err(e) => {
                            self.diagnostics
                                .page_failed(thread, page, &url, &e.to_string());
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(thread, error = %e, "Page task aborted");
                }
            }
        }

        // Tasks that panicked never reported back.
        for (index, done) in finished.iter().enumerate() {
            if !done {
                let page = index as u32 + 1;
                let url = page_url(&self.base_url, thread, page);
                self.diagnostics
                    .page_failed(thread, page, &url, "page task panicked");
            }
        }

        slots
    }
}
