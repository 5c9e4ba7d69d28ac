//! End-to-end export tests
//!
//! These tests use wiremock to stand in for the site and run whole batches
//! through the real HTTP client, writing into a temporary directory.

use eksi_export::config::Config;
use eksi_export::diagnostics::{DiagnosticEvent, MemoryDiagnostics};
use eksi_export::output::{read_records, CSV_HEADER, NO_EDIT_PLACEHOLDER};
use eksi_export::scraper::scrape_batch;
use eksi_export::OutputFormat;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, output_dir: &TempDir, format: OutputFormat) -> Config {
    let mut config = Config::default();
    config.scraper.base_url = format!("{}/", server.uri());
    config.scraper.max_concurrent_pages = 3;
    config.scraper.max_concurrent_threads = 2;
    config.scraper.parse_workers = 2;
    config.retry.max_attempts = 3;
    config.retry.backoff_base_ms = 10;
    config.retry.max_elapsed_secs = 10;
    config.http.timeout_secs = 5;
    config.output.directory = output_dir.path().display().to_string();
    config.output.format = format;
    config
}

/// Renders a thread page with the given (content, author, date) entries
fn thread_page(entries: &[(&str, &str, &str)], page_count: u32) -> String {
    let items: String = entries
        .iter()
        .map(|(content, author, date)| {
            format!(
                r#"<li id="entry-item">
                    <div class="content">{}</div>
                    <footer><a class="entry-author">{}</a><a class="entry-date">{}</a></footer>
                </li>"#,
                content, author, date
            )
        })
        .collect();

    format!(
        r#"<html><head><title>thread</title></head><body>
        <div class="pager" data-pagecount="{}"></div>
        <ul id="entry-item-list">{}</ul>
        </body></html>"#,
        page_count, items
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts a thread whose pages are served from `pages`, page 1 first
///
/// Query-matched mocks are mounted before the bare path so they win.
async fn mount_thread(server: &MockServer, thread: &str, pages: &[String]) {
    let route = format!("/{}", thread);
    for (index, body) in pages.iter().enumerate().skip(1) {
        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .and(query_param("p", (index + 1).to_string().as_str()))
            .respond_with(html(body.clone()))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(route.as_str()))
        .respond_with(html(pages[0].clone()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_export_json() {
    let server = MockServer::start().await;
    let output_dir = TempDir::new().expect("Failed to create temp dir");

    let pages = vec![
        thread_page(
            &[
                ("ilk entry", "yazar1", "01.02.2003 10:00"),
                ("ikinci entry", "yazar2", "01.02.2003 11:00 ~ 12:30"),
            ],
            3,
        ),
        thread_page(&[("üçüncü entry", "yazar3", "05.02.2003 09:00")], 3),
        thread_page(&[("son entry", "yazar1", "06.02.2003 23:59")], 3),
    ];
    mount_thread(&server, "pena--31782", &pages).await;

    let config = create_test_config(&server, &output_dir, OutputFormat::Json);
    let diagnostics = Arc::new(MemoryDiagnostics::new());
    let threads = vec!["pena--31782".to_string()];

    let report = scrape_batch(&config, &threads, diagnostics.clone())
        .await
        .expect("Batch failed to start");

    let thread = report.thread("pena--31782").expect("Thread missing from report");
    assert_eq!(thread.page_count, 3);
    assert_eq!(thread.entries, 4);
    assert!(thread.degraded_pages.is_empty());

    let path = output_dir.path().join("pena--31782.json");
    assert_eq!(thread.output, Ok(path.clone()));

    let records = read_records(&path, OutputFormat::Json).expect("Failed to read export");
    let contents: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(
        contents,
        vec!["ilk entry", "ikinci entry", "üçüncü entry", "son entry"]
    );
    assert_eq!(records[0].last_changed, NO_EDIT_PLACEHOLDER);
    assert_eq!(records[1].date_created, "01.02.2003 11:00");
    assert_eq!(records[1].last_changed, "12:30");

    // Non-ASCII text is written as-is
    let raw = std::fs::read_to_string(&path).expect("Failed to read export");
    assert!(raw.contains("üçüncü entry"));

    assert!(diagnostics.events().contains(&DiagnosticEvent::ThreadSucceeded {
        thread: "pena--31782".to_string(),
        entries: 4,
        destination: path.display().to_string(),
    }));
}

#[tokio::test]
async fn test_full_export_csv() {
    let server = MockServer::start().await;
    let output_dir = TempDir::new().expect("Failed to create temp dir");

    let pages = vec![thread_page(
        &[("virgül, içeren \"entry\"", "yazar", "01.01.2020 ~ 02.01.2020")],
        1,
    )];
    mount_thread(&server, "csv--1", &pages).await;

    let config = create_test_config(&server, &output_dir, OutputFormat::Csv);
    let threads = vec!["csv--1".to_string()];

    let report = scrape_batch(&config, &threads, Arc::new(MemoryDiagnostics::new()))
        .await
        .expect("Batch failed to start");
    assert_eq!(report.failures().count(), 0);

    let path = output_dir.path().join("csv--1.csv");
    let raw = std::fs::read_to_string(&path).expect("Failed to read export");
    assert!(raw.starts_with(&CSV_HEADER.join(",")));

    let records = read_records(&path, OutputFormat::Csv).expect("Failed to read export");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content, "virgül, içeren \"entry\"");
    assert_eq!(records[0].date_created, "01.01.2020");
    assert_eq!(records[0].last_changed, "02.01.2020");
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;
    let output_dir = TempDir::new().expect("Failed to create temp dir");

    // Page 2 fails twice before succeeding
    Mock::given(method("GET"))
        .and(path("/retry--1"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/retry--1"))
        .and(query_param("p", "2"))
        .respond_with(html(thread_page(&[("geç gelen", "b", "02.01.2020")], 2)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/retry--1"))
        .respond_with(html(thread_page(&[("hemen gelen", "a", "01.01.2020")], 2)))
        .mount(&server)
        .await;

    let config = create_test_config(&server, &output_dir, OutputFormat::Json);
    let diagnostics = Arc::new(MemoryDiagnostics::new());
    let threads = vec!["retry--1".to_string()];

    let report = scrape_batch(&config, &threads, diagnostics.clone())
        .await
        .expect("Batch failed to start");

    let thread = report.thread("retry--1").expect("Thread missing from report");
    assert_eq!(thread.entries, 2);
    assert!(thread.degraded_pages.is_empty());
    assert!(diagnostics.failed_pages("retry--1").is_empty());

    let records = read_records(&output_dir.path().join("retry--1.json"), OutputFormat::Json)
        .expect("Failed to read export");
    assert_eq!(records[0].content, "hemen gelen");
    assert_eq!(records[1].content, "geç gelen");
}

#[tokio::test]
async fn test_missing_page_degrades_to_empty() {
    let server = MockServer::start().await;
    let output_dir = TempDir::new().expect("Failed to create temp dir");

    // A 404 is permanent and must not be retried
    Mock::given(method("GET"))
        .and(path("/gap--1"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gap--1"))
        .and(query_param("p", "3"))
        .respond_with(html(thread_page(&[("üç", "c", "03.01.2020")], 3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gap--1"))
        .respond_with(html(thread_page(&[("bir", "a", "01.01.2020")], 3)))
        .mount(&server)
        .await;

    let config = create_test_config(&server, &output_dir, OutputFormat::Json);
    let diagnostics = Arc::new(MemoryDiagnostics::new());
    let threads = vec!["gap--1".to_string()];

    let report = scrape_batch(&config, &threads, diagnostics.clone())
        .await
        .expect("Batch failed to start");

    let thread = report.thread("gap--1").expect("Thread missing from report");
    assert_eq!(thread.page_count, 3);
    assert_eq!(thread.degraded_pages, vec![2]);
    assert!(thread.output.is_ok());
    assert_eq!(diagnostics.failed_pages("gap--1"), vec![2]);

    let records = read_records(&output_dir.path().join("gap--1.json"), OutputFormat::Json)
        .expect("Failed to read export");
    let contents: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["bir", "üç"]);
}

#[tokio::test]
async fn test_unknown_thread_still_writes_file() {
    let server = MockServer::start().await;
    let output_dir = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(&server, &output_dir, OutputFormat::Json);
    let diagnostics = Arc::new(MemoryDiagnostics::new());
    let threads = vec!["yok--0".to_string()];

    let report = scrape_batch(&config, &threads, diagnostics.clone())
        .await
        .expect("Batch failed to start");

    let thread = report.thread("yok--0").expect("Thread missing from report");
    assert_eq!(thread.page_count, 1);
    assert_eq!(thread.entries, 0);

    let path = output_dir.path().join("yok--0.json");
    let records = read_records(&path, OutputFormat::Json).expect("Failed to read export");
    assert!(records.is_empty());

    assert!(diagnostics
        .events()
        .iter()
        .any(|e| matches!(e, DiagnosticEvent::PageCountFallback { thread, .. } if thread == "yok--0")));
}

#[tokio::test]
async fn test_multiple_threads_in_one_batch() {
    let server = MockServer::start().await;
    let output_dir = TempDir::new().expect("Failed to create temp dir");

    for (thread, author) in [("a--1", "x"), ("b--2", "y"), ("c--3", "z")] {
        let pages = vec![
            thread_page(&[("p1", author, "01.01.2020")], 2),
            thread_page(&[("p2", author, "02.01.2020")], 2),
        ];
        mount_thread(&server, thread, &pages).await;
    }

    let config = create_test_config(&server, &output_dir, OutputFormat::Csv);
    let threads: Vec<String> = ["a--1", "b--2", "c--3"].iter().map(|s| s.to_string()).collect();

    let report = scrape_batch(&config, &threads, Arc::new(MemoryDiagnostics::new()))
        .await
        .expect("Batch failed to start");

    assert_eq!(report.threads.len(), 3);
    assert_eq!(report.failures().count(), 0);
    assert!(report.finished_at >= report.started_at);

    for (thread, author) in [("a--1", "x"), ("b--2", "y"), ("c--3", "z")] {
        let records = read_records(
            &output_dir.path().join(format!("{}.csv", thread)),
            OutputFormat::Csv,
        )
        .expect("Failed to read export");
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.author == author));
        assert_eq!(records[0].content, "p1");
        assert_eq!(records[1].content, "p2");
    }
}
