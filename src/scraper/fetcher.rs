//! HTTP fetcher implementation
//!
//! This module handles every request the scraper makes:
//! - Building the HTTP client with the static browser-like headers
//! - The [`PageSource`] transport seam and its reqwest implementation
//! - Page-count discovery for a thread (single attempt, falls back to 1)
//! - Gated, retried page fetches that degrade to an empty page on failure

use crate::config::{HttpConfig, DEFAULT_PAGE_LIMIT};
use crate::scraper::gate::ConcurrencyGate;
use crate::scraper::parser::{parse_entries, parse_page_count, Entry};
use crate::scraper::pool::ParsePool;
use crate::scraper::retry::{retry_with_backoff, RetryError, RetryPolicy};
use crate::{ConfigError, FetchError, FetchResult, ScrapeError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Source of raw page markup
///
/// The scraper only needs "give me the body at this URL"; tests substitute
/// scripted sources for the real HTTP client.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches the body of `url`
    async fn fetch(&self, url: &str) -> FetchResult<String>;
}

/// Builds an HTTP client with the configured static headers
///
/// # Example
///
/// ```no_run
/// use eksi_export::config::HttpConfig;
/// use eksi_export::scraper::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, ScrapeError> {
    let accept = HeaderValue::from_str(&config.accept).map_err(|e| {
        ConfigError::Validation(format!("Invalid accept header '{}': {}", config.accept, e))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, accept);

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// [`PageSource`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_transport_error(url, e))
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_transport_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() || error.is_request() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else if error.is_body() {
        // The connection dropped while the body was streaming in
        FetchError::Interrupted {
            url: url.to_string(),
            message: error_chain(&error),
        }
    } else if let Some(status) = error.status() {
        FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else {
        FetchError::Body {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Joins an error with its sources, e.g. the hyper cause behind a body error
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Address of a thread's landing page
pub fn thread_url(base_url: &str, thread: &str) -> String {
    format!("{}{}", base_url, thread)
}

/// Address of one page of a thread
///
/// Page 1 is the landing page itself; later pages use the `p` query
/// parameter.
pub fn page_url(base_url: &str, thread: &str, page: u32) -> String {
    if page <= 1 {
        thread_url(base_url, thread)
    } else {
        format!("{}?p={}", thread_url(base_url, thread), page)
    }
}

/// Outcome of page-count discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCount {
    /// The pager declared this many pages
    Declared(u32),

    /// Discovery failed; the thread is treated as single-page
    Assumed { reason: String },
}

impl PageCount {
    /// Number of pages to fetch
    pub fn get(&self) -> u32 {
        match self {
            PageCount::Declared(count) => *count,
            PageCount::Assumed { .. } => 1,
        }
    }
}

/// Discovers how many pages a thread has
///
/// The landing page is fetched exactly once. Any failure, from transport
/// errors to a missing or malformed pager, yields [`PageCount::Assumed`].
/// A declared count above the page limit counts as malformed.
#[derive(Clone)]
pub struct PageCountResolver {
    source: Arc<dyn PageSource>,
    pool: ParsePool,
    page_limit: u32,
}

impl PageCountResolver {
    pub fn new(source: Arc<dyn PageSource>, pool: ParsePool) -> Self {
        Self {
            source,
            pool,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Sets the largest page count accepted from a pager (minimum 1)
    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    /// Resolves the page count of the thread at `url`
    pub async fn resolve(&self, url: &str) -> PageCount {
        let body = match self.source.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                return PageCount::Assumed {
                    reason: e.to_string(),
                }
            }
        };

        match self.pool.run(move || parse_page_count(&body)).await {
            Ok(Some(count)) if count > self.page_limit => PageCount::Assumed {
                reason: format!(
                    "declared page count {} exceeds limit {}",
                    count, self.page_limit
                ),
            },
            Ok(Some(count)) => PageCount::Declared(count),
            Ok(None) => PageCount::Assumed {
                reason: "pager missing or malformed".to_string(),
            },
            Err(e) => PageCount::Assumed {
                reason: e.to_string(),
            },
        }
    }
}

/// Fetches and parses pages with bounded retries
///
/// Each attempt holds one slot of the caller's gate for the fetch and the
/// parse, and gives it back before any backoff sleep.
#[derive(Clone)]
pub struct RetryingFetcher {
    source: Arc<dyn PageSource>,
    pool: ParsePool,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(source: Arc<dyn PageSource>, pool: ParsePool, policy: RetryPolicy) -> Self {
        Self {
            source,
            pool,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url` and parses its entries, retrying transient failures
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Entry>)` - Entries in document order, possibly empty
    /// * `Err(RetryError)` - Permanent failure or retries exhausted
    pub async fn fetch_entries(
        &self,
        url: &str,
        gate: &ConcurrencyGate,
    ) -> Result<Vec<Entry>, RetryError> {
        retry_with_backoff(&self.policy, url, |attempt| async move {
            tracing::debug!(url, attempt, "Fetching page");
            let _permit = gate.acquire().await.map_err(|e| FetchError::Cancelled {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            self.attempt(url).await
        })
        .await
    }

    /// One fetch-and-parse attempt
    async fn attempt(&self, url: &str) -> FetchResult<Vec<Entry>> {
        let body = self.source.fetch(url).await?;

        self.pool
            .run(move || parse_entries(&body))
            .await
            .map_err(|e| FetchError::Parse {
                url: url.to_string(),
                message: e.to_string(),
            })?
            .map_err(|message| FetchError::Parse {
                url: url.to_string(),
                message,
            })
    }
}
