//! Eksi-Export: a concurrent thread exporter for eksisozluk
//!
//! This crate fetches every page of a discussion thread, parses the entries
//! out of each page and writes one row-per-entry export per thread. Page
//! fetches run under a per-thread concurrency gate with exponential backoff
//! on transient failures, and threads run under a second, batch-level bound.

pub mod config;
pub mod diagnostics;
pub mod output;
pub mod scraper;

use thiserror::Error;

/// Main error type for Eksi-Export operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// Any of these aborts the invocation before network activity starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Failed to read thread list {path}: {source}")]
    ThreadFile {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid thread identifier '{0}'")]
    InvalidThread(String),
}

/// Errors raised while fetching or parsing a single page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Connection lost while reading {url}: {message}")]
    Interrupted { url: String, message: String },

    #[error("Failed to decode body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("HTML parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Fetch of {url} cancelled: {reason}")]
    Cancelled { url: String, reason: String },
}

impl FetchError {
    /// Returns true for transport-level failures worth retrying
    ///
    /// Connection errors, timeouts, bodies cut off mid-read and 5xx
    /// responses are transient. Client errors, body decoding problems and
    /// parse failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Connect { .. }
            | FetchError::Timeout { .. }
            | FetchError::Interrupted { .. } => true,
            FetchError::Status { status, .. } => (500..600).contains(status),
            FetchError::Body { .. } | FetchError::Parse { .. } | FetchError::Cancelled { .. } => {
                false
            }
        }
    }
}

/// Result type alias for Eksi-Export operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for page fetches
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use output::OutputFormat;
pub use scraper::{BatchDriver, BatchReport, Entry, ThreadResult, ThreadScraper};
