use crate::config::types::{Config, HttpConfig, OutputConfig, RetryConfig, ScraperConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_retry_config(&config.retry)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates scraper configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    validate_base_url(&config.base_url)?;

    if config.max_concurrent_pages < 1 || config.max_concurrent_pages > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_pages must be between 1 and 100, got {}",
            config.max_concurrent_pages
        )));
    }

    if config.max_concurrent_threads < 1 || config.max_concurrent_threads > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_threads must be between 1 and 100, got {}",
            config.max_concurrent_threads
        )));
    }

    if config.parse_workers < 1 || config.parse_workers > 64 {
        return Err(ConfigError::Validation(format!(
            "parse_workers must be between 1 and 64, got {}",
            config.parse_workers
        )));
    }

    if config.page_limit < 1 || config.page_limit > 1_000_000 {
        return Err(ConfigError::Validation(format!(
            "page_limit must be between 1 and 1000000, got {}",
            config.page_limit
        )));
    }

    Ok(())
}

/// Validates the base URL thread identifiers are appended to
///
/// The URL must be absolute http(s) and end with `/`, because identifiers
/// are concatenated directly onto it.
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use http or https",
            base_url
        )));
    }

    if !base_url.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must end with '/'",
            base_url
        )));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(
            "max_attempts must be >= 1".to_string(),
        ));
    }

    if config.backoff_base_ms < 1 {
        return Err(ConfigError::Validation(
            "backoff_base_ms must be >= 1ms".to_string(),
        ));
    }

    if config.max_elapsed_secs < 1 {
        return Err(ConfigError::Validation(
            "max_elapsed_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got timeout={}s connect={}s",
            config.timeout_secs, config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a single thread identifier
///
/// The identifier becomes both a URL path segment and a file name, so it
/// cannot carry separators, query or fragment markers, or whitespace.
pub fn validate_thread(thread: &str) -> Result<(), ConfigError> {
    if thread.is_empty()
        || thread == "."
        || thread == ".."
        || thread
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '?' | '#'))
    {
        return Err(ConfigError::InvalidThread(thread.to_string()));
    }

    Ok(())
}
