use crate::output::OutputFormat;
use crate::scraper::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Default mirror of the site; the canonical host is blocked in some regions
pub const DEFAULT_BASE_URL: &str = "https://eksisozluk111.com/";

/// Browser-like user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Accept header sent with every request
pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Largest page count a pager may declare before it is treated as malformed
pub const DEFAULT_PAGE_LIMIT: u32 = 10_000;

/// Main configuration structure for Eksi-Export
///
/// Every section is optional in the TOML file; missing keys take the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub retry: RetryConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
}

/// Scraping behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Base URL that thread identifiers are appended to
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum number of concurrent page fetches within one thread
    #[serde(rename = "max-concurrent-pages")]
    pub max_concurrent_pages: u32,

    /// Maximum number of threads scraped concurrently within one batch
    #[serde(rename = "max-concurrent-threads")]
    pub max_concurrent_threads: u32,

    /// Number of blocking workers available for HTML parsing
    #[serde(rename = "parse-workers")]
    pub parse_workers: u32,

    /// Declared page counts above this fall back to a single page
    #[serde(rename = "page-limit")]
    pub page_limit: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent_pages: 15,
            max_concurrent_threads: 30,
            parse_workers: 10,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Retry and backoff configuration for page fetches
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per page, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds), doubled on each retry
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Upper bound on time spent retrying one page (seconds)
    #[serde(rename = "max-elapsed-secs")]
    pub max_elapsed_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            backoff_base_ms: 1000,
            max_elapsed_secs: 300,
        }
    }
}

impl RetryConfig {
    /// Builds the immutable policy consulted by the fetcher
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            max_elapsed_time: Duration::from_secs(self.max_elapsed_secs),
        }
    }
}

/// Static HTTP request configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    pub accept: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the per-thread files are written into
    pub directory: String,

    /// Export format for every thread in the batch
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            format: OutputFormat::Csv,
        }
    }
}
