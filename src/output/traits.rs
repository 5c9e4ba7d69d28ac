//! Output writer traits and types
//!
//! This module defines the writer interface the batch driver hands finished
//! threads to, along with the flat record layout shared by every format.

use crate::scraper::Entry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Literal written in place of a missing last-edited timestamp
pub const NO_EDIT_PLACEHOLDER: &str = "null";

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    /// File extension used for exports in this format
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One exported row
///
/// Field names match the export header, and the edit time is always a
/// string so that CSV and JSON exports carry identical values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    #[serde(rename = "Content")]
    pub content: String,

    #[serde(rename = "Author")]
    pub author: String,

    #[serde(rename = "Date Created")]
    pub date_created: String,

    #[serde(rename = "Last Changed")]
    pub last_changed: String,
}

impl From<&Entry> for EntryRecord {
    fn from(entry: &Entry) -> Self {
        Self {
            content: entry.content.clone(),
            author: entry.author.clone(),
            date_created: entry.created_at.clone(),
            last_changed: entry
                .last_edited_at
                .clone()
                .unwrap_or_else(|| NO_EDIT_PLACEHOLDER.to_string()),
        }
    }
}

/// Builds the path a thread's export is written to
pub fn output_path(directory: &Path, thread: &str, format: OutputFormat) -> PathBuf {
    directory.join(format!("{}.{}", thread, format.extension()))
}

/// Trait for thread result writers
///
/// Implementations must be thread-safe: the batch driver calls `write`
/// from concurrently running thread tasks.
pub trait DataWriter: Send + Sync {
    /// Writes all entries of one thread, returning where they were written
    ///
    /// # Arguments
    ///
    /// * `thread` - The thread identifier, used to name the output
    /// * `entries` - Entries in page order
    /// * `format` - The export format
    fn write(&self, thread: &str, entries: &[Entry], format: OutputFormat)
        -> OutputResult<PathBuf>;
}
