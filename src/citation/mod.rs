//! Citation annotations inside document text.
//!
//! - [`item`] - Item metadata and author-year labels
//! - [`signature`] - Grouping signatures and suffix planning
//! - [`tags`] - Per-container citation tags (the tag store)
//! - [`normalize`] - Applying suffix plans across the document
//! - [`numbering`] - Placeholder numbering for numbered styles
//! - [`collect_keys`] - Rebuilding the cited key list from the document

pub mod item;
pub mod normalize;
pub mod numbering;
pub mod signature;
pub mod tags;

pub use item::{Creator, ItemMetadata};
pub use numbering::Numbering;
pub use signature::Signature;
pub use tags::CitationTag;

use crate::core::ZpError;
use crate::document::DocumentProvider;

/// Cited keys of the whole document, deduplicated, in first-appearance order
/// (page, container, tag index). Prunes every container on the way.
pub fn collect_keys(doc: &mut dyn DocumentProvider) -> Result<Vec<String>, ZpError> {
    let mut keys: Vec<String> = Vec::new();
    for (_, tags) in normalize::collect_pruned(doc)? {
        for tag in tags {
            if !tag.key.is_empty() && !keys.contains(&tag.key) {
                keys.push(tag.key);
            }
        }
    }
    Ok(keys)
}

/// The display text already used for `key` anywhere in the document, with
/// its signature.
pub fn existing_citation(
    doc: &mut dyn DocumentProvider,
    key: &str,
) -> Result<Option<(String, Signature)>, ZpError> {
    for (_, tags) in normalize::collect_pruned(doc)? {
        if let Some(tag) = tags.into_iter().find(|t| t.key == key && !t.sig.is_empty()) {
            return Ok(Some((tag.cite, tag.sig)));
        }
    }
    Ok(None)
}
