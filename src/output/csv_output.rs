//! CSV export
//!
//! Rows are serialized into memory first and the file is written in one
//! call, so a finished export is never observed half-written by this crate.

use crate::output::traits::{EntryRecord, OutputError, OutputResult};
use crate::scraper::Entry;
use std::path::Path;

/// Header row of every CSV export
pub const CSV_HEADER: [&str; 4] = ["Content", "Author", "Date Created", "Last Changed"];

/// Renders entries as CSV bytes, header first
pub fn render_csv(entries: &[Entry]) -> OutputResult<Vec<u8>> {
    // Written by hand so an empty thread still gets a header row.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for entry in entries {
        writer.serialize(EntryRecord::from(entry))?;
    }

    writer
        .into_inner()
        .map_err(|e| OutputError::Write(e.to_string()))
}

/// Writes entries to a CSV file at `path`
pub fn write_csv(path: &Path, entries: &[Entry]) -> OutputResult<()> {
    let bytes = render_csv(entries)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Reads records back from a CSV export
pub fn read_csv(path: &Path) -> OutputResult<Vec<EntryRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}
