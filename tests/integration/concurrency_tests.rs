//! Ordering and concurrency-bound tests
//!
//! Pages are served from memory with per-page delays so completion order
//! differs from page order, and the source tracks how many fetches are in
//! flight at once.

use async_trait::async_trait;
use eksi_export::diagnostics::MemoryDiagnostics;
use eksi_export::output::{read_records, FileWriter};
use eksi_export::scraper::{
    BatchDriver, PageCountResolver, PageSource, ParsePool, RetryPolicy, RetryingFetcher,
    ThreadScraper,
};
use eksi_export::{FetchError, FetchResult, OutputFormat};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const BASE: &str = "https://example.com/";

/// In-memory pages with a delay per URL
#[derive(Default)]
struct SlowSource {
    pages: HashMap<String, (String, Duration)>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowSource {
    fn add(&mut self, url: String, body: String, delay_ms: u64) {
        self.pages.insert(url, (body, Duration::from_millis(delay_ms)));
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for SlowSource {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let result = match self.pages.get(url) {
            Some((body, delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(body.clone())
            }
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn page_html(contents: &[String], page_count: u32) -> String {
    let items: String = contents
        .iter()
        .map(|c| {
            format!(
                r#"<li id="entry-item"><div class="content">{}</div><a class="entry-author">yazar</a><a class="entry-date">01.01.2020</a></li>"#,
                c
            )
        })
        .collect();
    format!(
        r#"<div class="pager" data-pagecount="{}"></div><ul>{}</ul>"#,
        page_count, items
    )
}

fn page_url(thread: &str, page: u32) -> String {
    if page == 1 {
        format!("{}{}", BASE, thread)
    } else {
        format!("{}{}?p={}", BASE, thread, page)
    }
}

/// Adds a thread of `page_count` pages with `per_page` entries each
///
/// Later pages answer faster, so tasks finish in reverse page order.
fn add_thread(source: &mut SlowSource, thread: &str, page_count: u32, per_page: usize) {
    for page in 1..=page_count {
        let contents: Vec<String> = (0..per_page).map(|i| format!("{}-{}", page, i)).collect();
        let delay = 5 * u64::from(page_count - page + 1);
        source.add(page_url(thread, page), page_html(&contents, page_count), delay);
    }
}

fn scraper(source: Arc<SlowSource>, max_concurrent_pages: usize) -> ThreadScraper {
    let source: Arc<dyn PageSource> = source;
    let pool = ParsePool::new(4);
    let policy = RetryPolicy {
        max_attempts: 2,
        backoff_base: Duration::from_millis(1),
        max_elapsed_time: Duration::from_secs(5),
    };
    ThreadScraper::new(
        BASE,
        PageCountResolver::new(Arc::clone(&source), pool.clone()),
        RetryingFetcher::new(source, pool, policy),
        max_concurrent_pages,
        Arc::new(MemoryDiagnostics::new()),
    )
}

fn expected_contents(page_count: u32, per_page: usize) -> Vec<String> {
    (1..=page_count)
        .flat_map(|page| (0..per_page).map(move |i| format!("{}-{}", page, i)))
        .collect()
}

#[tokio::test]
async fn test_entries_in_page_order_regardless_of_completion() {
    let mut source = SlowSource::default();
    add_thread(&mut source, "sirali--1", 8, 3);
    let source = Arc::new(source);

    let result = scraper(Arc::clone(&source), 8).scrape("sirali--1").await;

    let contents: Vec<String> = result.entries.iter().map(|e| e.content.clone()).collect();
    assert_eq!(contents, expected_contents(8, 3));
    assert!(result.degraded_pages.is_empty());
}

#[tokio::test]
async fn test_page_fetches_respect_budget() {
    let mut source = SlowSource::default();
    add_thread(&mut source, "kalabalik--1", 20, 1);
    let source = Arc::new(source);

    let result = scraper(Arc::clone(&source), 3).scrape("kalabalik--1").await;

    assert_eq!(result.entries.len(), 20);
    assert!(source.max_in_flight() <= 3);
    assert!(source.max_in_flight() >= 1);
}

#[tokio::test]
async fn test_unicode_thread_identifier() {
    let mut source = SlowSource::default();
    add_thread(&mut source, "örnek-başlık--1", 3, 2);
    let source = Arc::new(source);
    let output_dir = TempDir::new().expect("Failed to create temp dir");

    let driver = BatchDriver::new(
        scraper(Arc::clone(&source), 2),
        Arc::new(FileWriter::new(output_dir.path())),
        OutputFormat::Csv,
        1,
        Arc::new(MemoryDiagnostics::new()),
    );
    let report = driver.run(&["örnek-başlık--1".to_string()]).await;

    let thread = report
        .thread("örnek-başlık--1")
        .expect("Thread missing from report");
    assert_eq!(thread.page_count, 3);
    assert_eq!(thread.entries, 6);

    let path = output_dir.path().join("örnek-başlık--1.csv");
    let records = read_records(&path, OutputFormat::Csv).expect("Failed to read export");
    let contents: Vec<String> = records.into_iter().map(|r| r.content).collect();
    assert_eq!(contents, expected_contents(3, 2));
}

#[tokio::test]
async fn test_thread_budget_bounds_batch() {
    let mut source = SlowSource::default();
    let threads: Vec<String> = (1..=6).map(|i| format!("konu--{}", i)).collect();
    for thread in &threads {
        add_thread(&mut source, thread, 2, 1);
    }
    let source = Arc::new(source);
    let output_dir = TempDir::new().expect("Failed to create temp dir");

    // One page at a time per thread, two threads at a time
    let driver = BatchDriver::new(
        scraper(Arc::clone(&source), 1),
        Arc::new(FileWriter::new(output_dir.path())),
        OutputFormat::Json,
        2,
        Arc::new(MemoryDiagnostics::new()),
    );
    let report = driver.run(&threads).await;

    assert_eq!(report.threads.len(), 6);
    assert_eq!(report.failures().count(), 0);
    assert!(source.max_in_flight() <= 2);

    for thread in &threads {
        let path = output_dir.path().join(format!("{}.json", thread));
        let records = read_records(&path, OutputFormat::Json).expect("Failed to read export");
        assert_eq!(records.len(), 2);
    }
}
