//! Output module for writing thread exports
//!
//! This module handles:
//! - Writing one file per thread in CSV or JSON format
//! - Reading exports back for verification
//! - Printing batch run statistics

mod csv_output;
mod json_output;
pub mod stats;
mod traits;

pub use csv_output::{read_csv, render_csv, write_csv, CSV_HEADER};
pub use json_output::{read_json, render_json, write_json};
pub use stats::print_report;
pub use traits::{
    output_path, DataWriter, EntryRecord, OutputError, OutputFormat, OutputResult,
    NO_EDIT_PLACEHOLDER,
};

use crate::scraper::Entry;
use std::path::{Path, PathBuf};

/// Writes thread exports as `{directory}/{thread}.{format}`
#[derive(Debug, Clone)]
pub struct FileWriter {
    directory: PathBuf,
}

impl FileWriter {
    /// Creates a writer targeting `directory`
    ///
    /// The directory is created lazily on first write.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// The directory exports are written into
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl DataWriter for FileWriter {
    fn write(
        &self,
        thread: &str,
        entries: &[Entry],
        format: OutputFormat,
    ) -> OutputResult<PathBuf> {
        std::fs::create_dir_all(&self.directory)?;
        let path = output_path(&self.directory, thread, format);

        match format {
            OutputFormat::Csv => write_csv(&path, entries)?,
            OutputFormat::Json => write_json(&path, entries)?,
        }

        tracing::debug!("Wrote {} entries to {}", entries.len(), path.display());
        Ok(path)
    }
}

/// Reads an export back into records, dispatching on format
pub fn read_records(path: &Path, format: OutputFormat) -> OutputResult<Vec<EntryRecord>> {
    match format {
        OutputFormat::Csv => read_csv(path),
        OutputFormat::Json => read_json(path),
    }
}
