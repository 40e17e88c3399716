//! Document and item fixtures.

use crate::citation::{Creator, ItemMetadata};
use crate::document::MemoryDocument;

/// Body container width used by fixtures, wide enough that short entries
/// never wrap.
pub const FIXTURE_WIDTH: f64 = 1000.0;

/// Body container height used by fixtures.
pub const FIXTURE_HEIGHT: f64 = 300.0;

/// A document with one page per text, each holding one body container
/// (id 2) with that text. Pages are numbered from 256.
#[must_use]
pub fn sample_document(texts: &[&str]) -> MemoryDocument {
    let mut doc = MemoryDocument::new();
    for (i, text) in texts.iter().enumerate() {
        let title = format!("Slide {}", i + 1);
        let page = doc.add_page(Some(&title), "title-and-content");
        if let Err(e) = doc.add_container(page, text, FIXTURE_WIDTH, FIXTURE_HEIGHT) {
            panic!("fixture page {page} vanished: {e}");
        }
    }
    doc
}

/// Item metadata with the given creator surnames, date and title.
#[must_use]
pub fn item(key: &str, surnames: &[&str], date: &str, title: &str) -> ItemMetadata {
    ItemMetadata {
        key: key.to_string(),
        item_type: Some("journalArticle".to_string()),
        title: (!title.is_empty()).then(|| title.to_string()),
        creators: surnames.iter().map(|s| Creator::person(*s)).collect(),
        date: (!date.is_empty()).then(|| date.to_string()),
        url: None,
    }
}
