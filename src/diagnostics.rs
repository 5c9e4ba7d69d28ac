//! Diagnostics sink for scrape events
//!
//! The batch driver and thread scraper report significant events through a
//! [`Diagnostics`] handle passed in by the caller. [`TracingDiagnostics`]
//! forwards them to `tracing`; [`MemoryDiagnostics`] keeps them in memory so
//! tests can assert on what happened.

use std::sync::{Arc, Mutex};

/// Receiver of scrape lifecycle events
///
/// Implementations must be thread-safe; events arrive from concurrently
/// running page and thread tasks.
pub trait Diagnostics: Send + Sync {
    /// A thread scrape is starting
    fn thread_started(&self, thread: &str);

    /// Page-count discovery failed and the thread is treated as single-page
    fn page_count_fallback(&self, thread: &str, reason: &str);

    /// A page degraded to an empty result
    fn page_failed(&self, thread: &str, page: u32, url: &str, reason: &str);

    /// A thread finished and its export was written
    fn thread_succeeded(&self, thread: &str, entries: usize, destination: &str);

    /// A thread could not be exported
    fn thread_failed(&self, thread: &str, reason: &str);
}

/// Shared diagnostics handle
pub type SharedDiagnostics = Arc<dyn Diagnostics>;

/// Forwards events to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn thread_started(&self, thread: &str) {
        tracing::info!(thread, "Started scraping thread");
    }

    fn page_count_fallback(&self, thread: &str, reason: &str) {
        tracing::warn!(thread, reason, "Page count unavailable, assuming a single page");
    }

    fn page_failed(&self, thread: &str, page: u32, url: &str, reason: &str) {
        tracing::error!(thread, page, url, reason, "Page fetch failed, continuing without it");
    }

    fn thread_succeeded(&self, thread: &str, entries: usize, destination: &str) {
        tracing::info!(
            thread,
            entries,
            destination,
            "Successfully scraped and saved thread"
        );
    }

    fn thread_failed(&self, thread: &str, reason: &str) {
        tracing::error!(thread, reason, "Failed to export thread");
    }
}

/// A recorded diagnostics event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    ThreadStarted {
        thread: String,
    },
    PageCountFallback {
        thread: String,
        reason: String,
    },
    PageFailed {
        thread: String,
        page: u32,
        url: String,
        reason: String,
    },
    ThreadSucceeded {
        thread: String,
        entries: usize,
        destination: String,
    },
    ThreadFailed {
        thread: String,
        reason: String,
    },
}

/// Records events in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Pages reported as failed for `thread`, sorted
    pub fn failed_pages(&self, thread: &str) -> Vec<u32> {
        let mut pages: Vec<u32> = self
            .events()
            .into_iter()
            .filter_map(|event| match event {
                DiagnosticEvent::PageFailed { thread: t, page, .. } if t == thread => Some(page),
                _ => None,
            })
            .collect();
        pages.sort_unstable();
        pages
    }

    fn push(&self, event: DiagnosticEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn thread_started(&self, thread: &str) {
        self.push(DiagnosticEvent::ThreadStarted {
            thread: thread.to_string(),
        });
    }

    fn page_count_fallback(&self, thread: &str, reason: &str) {
        self.push(DiagnosticEvent::PageCountFallback {
            thread: thread.to_string(),
            reason: reason.to_string(),
        });
    }

    fn page_failed(&self, thread: &str, page: u32, url: &str, reason: &str) {
        self.push(DiagnosticEvent::PageFailed {
            thread: thread.to_string(),
            page,
            url: url.to_string(),
            reason: reason.to_string(),
        });
    }

    fn thread_succeeded(&self, thread: &str, entries: usize, destination: &str) {
        self.push(DiagnosticEvent::ThreadSucceeded {
            thread: thread.to_string(),
            entries,
            destination: destination.to_string(),
        });
    }

    fn thread_failed(&self, thread: &str, reason: &str) {
        self.push(DiagnosticEvent::ThreadFailed {
            thread: thread.to_string(),
            reason: reason.to_string(),
        });
    }
}
