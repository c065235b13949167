//! Source attribution for retained chunks.
//!
//! Derives structured citation metadata (section or page locators, chunk
//! labels) from a match's text and stored note.

use crate::types::{ScoredMatch, SourceInfo};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SECTION_PATTERN: Regex =
        Regex::new(r"Section (\d+\.\d+(?:\.\d+)?)").unwrap();
    static ref PAGE_PATTERN: Regex = Regex::new(r"Page (\d+)").unwrap();
}

/// Source label used when the index stored none.
const UNKNOWN_SOURCE: &str = "unknown";

/// A locator discovered in chunk text or notes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Locator {
    Section(String),
    Page(String),
}

fn find_section(text: &str) -> Option<String> {
    SECTION_PATTERN
        .captures(text)
        .map(|c| c[1].to_string())
}

fn find_page(text: &str) -> Option<String> {
    PAGE_PATTERN.captures(text).map(|c| c[1].to_string())
}

/// Locate a section or page reference, checking chunk text before the
/// stored note for each pattern. A section match anywhere wins over a page
/// match, even when the page reference appears first lexically.
fn find_locator(text: &str, note: &str) -> Option<Locator> {
    find_section(text)
        .or_else(|| find_section(note))
        .map(Locator::Section)
        .or_else(|| find_page(text).or_else(|| find_page(note)).map(Locator::Page))
}

/// Derive the numeric chunk label from a match identifier.
///
/// Ingested ids look like `chunk_{n}_{uuid}`; the second `_`-delimited token
/// is the chunk number. Identifiers without a delimiter fall back to the
/// match's position in the filtered set.
fn chunk_label(id: &str, position: usize) -> String {
    match id.split('_').nth(1) {
        Some(token) => format!("Chunk {}", token),
        None => format!("Chunk {}", position + 1),
    }
}

/// Build the citation for one retained match.
///
/// `position` is the match's zero-based index in the filtered set, used only
/// when the identifier carries no chunk number.
pub fn attribute(m: &ScoredMatch, position: usize) -> SourceInfo {
    let note = m.metadata.notes.trim();
    let (section, page) = match find_locator(&m.metadata.text, note) {
        Some(Locator::Section(s)) => (Some(s), None),
        Some(Locator::Page(p)) => (None, Some(p)),
        None => (None, None),
    };

    let source = if m.metadata.source.is_empty() {
        UNKNOWN_SOURCE.to_string()
    } else {
        m.metadata.source.clone()
    };

    SourceInfo {
        id: chunk_label(&m.id, position),
        source,
        section,
        page,
        note: (!note.is_empty()).then(|| note.to_string()),
    }
}
