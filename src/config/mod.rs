//! Configuration module for Eksi-Export
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and reading thread lists supplied on the command line
//! or in a newline-delimited file.
//!
//! # Example
//!
//! ```no_run
//! use eksi_export::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("eksi.toml")).unwrap();
//! println!("Pages in flight per thread: {}", config.scraper.max_concurrent_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, HttpConfig, OutputConfig, RetryConfig, ScraperConfig, DEFAULT_ACCEPT,
    DEFAULT_BASE_URL, DEFAULT_PAGE_LIMIT, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    collect_threads, compute_config_hash, load_config, load_config_with_hash, read_thread_file,
};
pub use validation::{validate, validate_thread};
