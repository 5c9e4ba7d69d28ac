//! JSON export

use crate::output::traits::{EntryRecord, OutputResult};
use crate::scraper::Entry;
use std::path::Path;

/// Renders entries as a pretty-printed JSON array
///
/// Non-ASCII text is emitted as UTF-8, not as `\u` escapes.
pub fn render_json(entries: &[Entry]) -> OutputResult<String> {
    let records: Vec<EntryRecord> = entries.iter().map(EntryRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Writes entries to a JSON file at `path`
pub fn write_json(path: &Path, entries: &[Entry]) -> OutputResult<()> {
    let text = render_json(entries)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Reads records back from a JSON export
pub fn read_json(path: &Path) -> OutputResult<Vec<EntryRecord>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
