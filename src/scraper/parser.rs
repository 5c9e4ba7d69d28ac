//! HTML parser for extracting entries and pagination
//!
//! This module handles parsing thread pages to extract:
//! - The declared page count from the pager element
//! - Every entry on a page (content, author, creation and edit dates)
//!
//! Every accessor returns an `Option`; the only defaults applied are a page
//! count of 1 and skipping an incomplete entry.

use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Pager element carrying the page count
const PAGER_SELECTOR: &str = "div.pager";

/// Attribute on the pager holding the page count
const PAGE_COUNT_ATTR: &str = "data-pagecount";

/// Repeated entry node
const ENTRY_SELECTOR: &str = "#entry-item";

const CONTENT_SELECTOR: &str = ".content";
const AUTHOR_SELECTOR: &str = ".entry-author";
const DATE_SELECTOR: &str = ".entry-date";

/// Separates the creation and edit timestamps in the date field
const DATE_DELIMITER: char = '~';

/// One entry extracted from a thread page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub content: String,
    pub author: String,
    pub created_at: String,
    /// `None` when the entry was never edited
    pub last_edited_at: Option<String>,
}

/// Compiled selectors for entry extraction
struct EntrySelectors {
    entry: Selector,
    content: Selector,
    author: Selector,
    date: Selector,
}

/// Compiled once per process and shared by every parse worker
static ENTRY_SELECTORS: OnceLock<Result<EntrySelectors, String>> = OnceLock::new();

impl EntrySelectors {
    fn new() -> Result<Self, String> {
        Ok(Self {
            entry: selector(ENTRY_SELECTOR)?,
            content: selector(CONTENT_SELECTOR)?,
            author: selector(AUTHOR_SELECTOR)?,
            date: selector(DATE_SELECTOR)?,
        })
    }

    fn shared() -> Result<&'static Self, String> {
        ENTRY_SELECTORS
            .get_or_init(Self::new)
            .as_ref()
            .map_err(Clone::clone)
    }
}

fn selector(source: &str) -> Result<Selector, String> {
    Selector::parse(source).map_err(|e| format!("invalid selector '{}': {:?}", source, e))
}

/// Parses a page and extracts its entries in document order
///
/// Entries missing any of the content, author or date nodes are skipped.
/// A page without entry nodes yields an empty list.
///
/// # Example
///
/// ```
/// use eksi_export::scraper::parse_entries;
///
/// let html = r#"<ul><li id="entry-item">
///     <div class="content"> merhaba </div>
///     <a class="entry-author">yazar</a>
///     <a class="entry-date">05.01.2020 10:00</a>
/// </li></ul>"#;
/// let entries = parse_entries(html).unwrap();
/// assert_eq!(entries[0].content, "merhaba");
/// assert_eq!(entries[0].last_edited_at, None);
/// ```
pub fn parse_entries(html: &str) -> Result<Vec<Entry>, String> {
    let selectors = EntrySelectors::shared()?;
    let document = Html::parse_document(html);

    let entries = document
        .select(&selectors.entry)
        .filter_map(|node| {
            let entry = parse_entry(node, selectors);
            if entry.is_none() {
                tracing::debug!("Skipping entry with missing fields");
            }
            entry
        })
        .collect();

    Ok(entries)
}

/// Extracts a single entry from its node
fn parse_entry(node: ElementRef<'_>, selectors: &EntrySelectors) -> Option<Entry> {
    let content = child_text(node, &selectors.content)?;
    let author = child_text(node, &selectors.author)?;
    let date_text = child_text(node, &selectors.date)?;
    let (created_at, last_edited_at) = split_dates(&date_text);

    Some(Entry {
        content,
        author,
        created_at,
        last_edited_at,
    })
}

/// Returns the trimmed text of the first descendant matching `selector`
fn child_text(node: ElementRef<'_>, selector: &Selector) -> Option<String> {
    node.select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

/// Splits the combined date field into creation and edit timestamps
///
/// `"05.01.2020 10:00 ~ 06.01.2020 11:00"` splits on the first `~`; both
/// halves are trimmed. Without a delimiter the whole text is the creation
/// time and there is no edit time.
pub fn split_dates(text: &str) -> (String, Option<String>) {
    match text.split_once(DATE_DELIMITER) {
        Some((created, edited)) => (created.trim().to_string(), Some(edited.trim().to_string())),
        None => (text.trim().to_string(), None),
    }
}

/// Extracts the declared page count from a thread page
///
/// Returns `None` when the pager or its attribute is absent, or when the
/// value is not a positive integer.
pub fn parse_page_count(html: &str) -> Option<u32> {
    static PAGER: OnceLock<Option<Selector>> = OnceLock::new();

    let pager = PAGER
        .get_or_init(|| Selector::parse(PAGER_SELECTOR).ok())
        .as_ref()?;
    let document = Html::parse_document(html);

    document
        .select(pager)
        .next()
        .and_then(|element| element.value().attr(PAGE_COUNT_ATTR))
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|count| *count >= 1)
}
