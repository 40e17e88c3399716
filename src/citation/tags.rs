//! Per-container citation tags.
//!
//! Every container carries a JSON list of [`CitationTag`]s under the tag key
//! [`CITATION_TAG_KEY`]. A tag links one occurrence of display text in the
//! container to the item it cites. Tags are only valid while their display
//! text still occurs in the container text; [`prune`] is the single deletion
//! path and must run before tags are read for grouping or key collection.
//!
//! Rewriting display text goes through [`rewrite`]: every tag, in index
//! order, claims the earliest occurrence of its display text that no earlier
//! tag has claimed. Two tags with identical text therefore never claim the
//! same occurrence.

use crate::constants::CITATION_TAG_KEY;
use crate::core::ZpError;
use crate::document::{ContainerRef, DocumentProvider, HostError};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, warn};

use super::signature::Signature;

/// Durable annotation of one citation occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationTag {
    /// Cited item key
    pub key: String,
    /// Display text as it occurs in the container
    pub cite: String,
    /// Grouping signature; empty for numbered citations
    #[serde(default)]
    pub sig: Signature,
}

impl CitationTag {
    /// Create a tag.
    pub fn new(key: impl Into<String>, cite: impl Into<String>, sig: Signature) -> Self {
        Self {
            key: key.into(),
            cite: cite.into(),
            sig,
        }
    }
}

/// Load the tags of a container. Corrupt JSON reads as an empty list.
pub fn load(doc: &dyn DocumentProvider, container: &ContainerRef) -> Result<Vec<CitationTag>, HostError> {
    let Some(raw) = doc.tag(container, CITATION_TAG_KEY)? else {
        return Ok(Vec::new());
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str(&raw) {
        Ok(tags) => Ok(tags),
        Err(e) => {
            let corrupt = ZpError::CorruptState {
                location: format!("citation tags of container {container}"),
                reason: e.to_string(),
            };
            warn!("{}; treating as empty", corrupt);
            Ok(Vec::new())
        }
    }
}

/// Overwrite the tags of a container.
pub fn save(doc: &mut dyn DocumentProvider, container: &ContainerRef, tags: &[CitationTag]) -> Result<(), ZpError> {
    let json = serde_json::to_string(tags).map_err(|e| ZpError::Other {
        message: format!("Failed to serialize citation tags: {e}"),
    })?;
    doc.set_tag(container, CITATION_TAG_KEY, &json)?;
    Ok(())
}

/// Append one tag to a container's list.
pub fn append(doc: &mut dyn DocumentProvider, container: &ContainerRef, tag: CitationTag) -> Result<(), ZpError> {
    let mut tags = load(doc, container)?;
    tags.push(tag);
    save(doc, container, &tags)
}

/// Insert `tag` at `index` of a container's list.
///
/// Indexes past the end append.
pub fn insert(
    doc: &mut dyn DocumentProvider,
    container: &ContainerRef,
    index: usize,
    tag: CitationTag,
) -> Result<(), ZpError> {
    let mut tags = load(doc, container)?;
    tags.insert(index.min(tags.len()), tag);
    save(doc, container, &tags)
}

/// List position for a citation about to be inserted at char `offset`.
///
/// Prunes the container, then counts the tags whose claimed occurrence
/// starts before `offset`. Inserting the new tag there keeps tag order equal
/// to the order of occurrences in the text.
pub fn position_for(doc: &mut dyn DocumentProvider, container: &ContainerRef, offset: usize) -> Result<usize, ZpError> {
    let tags = prune(doc, container)?;
    if tags.is_empty() {
        return Ok(0);
    }
    let text = doc.text(container)?;
    let byte = text.char_indices().nth(offset).map_or(text.len(), |(i, _)| i);
    let needles: Vec<&str> = tags.iter().map(|t| t.cite.as_str()).collect();
    let before = locate(&text, &needles)
        .into_iter()
        .flatten()
        .filter(|range| range.start < byte)
        .count();
    Ok(before)
}

/// Drop tags whose display text no longer occurs in the container text,
/// persist the result if anything changed, and return the kept tags.
pub fn prune(doc: &mut dyn DocumentProvider, container: &ContainerRef) -> Result<Vec<CitationTag>, ZpError> {
    prune_split(doc, container).map(|(kept, _)| kept)
}

/// Like [`prune`], also returning the dropped tags.
pub fn prune_split(
    doc: &mut dyn DocumentProvider,
    container: &ContainerRef,
) -> Result<(Vec<CitationTag>, Vec<CitationTag>), ZpError> {
    let tags = load(doc, container)?;
    if tags.is_empty() {
        return Ok((tags, Vec::new()));
    }
    let text = doc.text(container)?;
    let (kept, dropped): (Vec<CitationTag>, Vec<CitationTag>) =
        tags.into_iter().partition(|t| !t.cite.is_empty() && text.contains(&t.cite));

    if !dropped.is_empty() {
        debug!("Pruned {} stale citation tag(s) in container {}", dropped.len(), container);
        save(doc, container, &kept)?;
    }
    Ok((kept, dropped))
}

/// Claim an occurrence of each needle in `text`, in order.
///
/// Each needle takes the earliest occurrence that does not overlap an
/// occurrence claimed by an earlier needle. Returns byte ranges; `None` for
/// empty needles and needles with no unclaimed occurrence left.
#[must_use]
pub fn locate(text: &str, needles: &[&str]) -> Vec<Option<Range<usize>>> {
    let mut claimed: Vec<Range<usize>> = Vec::new();
    let mut found = Vec::with_capacity(needles.len());

    for needle in needles {
        if needle.is_empty() {
            found.push(None);
            continue;
        }
        let mut from = 0;
        let mut hit = None;
        while let Some(offset) = text[from..].find(needle) {
            let start = from + offset;
            let range = start..start + needle.len();
            if claimed.iter().any(|c| c.start < range.end && range.start < c.end) {
                // advance by one char to stay on a UTF-8 boundary
                from = start + text[start..].chars().next().map_or(1, char::len_utf8);
                continue;
            }
            hit = Some(range);
            break;
        }
        if let Some(range) = &hit {
            claimed.push(range.clone());
        }
        found.push(hit);
    }
    found
}

/// Replace byte ranges of `text` in one pass. Ranges must not overlap.
#[must_use]
pub fn splice(text: &str, mut replacements: Vec<(Range<usize>, String)>) -> String {
    replacements.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, replacement) in replacements {
        out.push_str(&text[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Rewrite the display text of tags in one container.
///
/// `target` maps a tag (by index) to its new display text, or `None` to keep
/// it. Every tag claims its occurrence in index order against one working
/// copy of the text; changed occurrences are replaced and the tag's `cite`
/// updated. Text and tags are each written once, only if something changed.
/// Returns the number of rewritten occurrences.
pub fn rewrite<F>(doc: &mut dyn DocumentProvider, container: &ContainerRef, mut target: F) -> Result<usize, ZpError>
where
    F: FnMut(usize, &CitationTag) -> Option<String>,
{
    let mut tags = load(doc, container)?;
    if tags.is_empty() {
        return Ok(0);
    }
    let text = doc.text(container)?;
    let needles: Vec<&str> = tags.iter().map(|t| t.cite.as_str()).collect();
    let ranges = locate(&text, &needles);

    let mut replacements = Vec::new();
    let mut updates = Vec::new();
    for (index, (tag, range)) in tags.iter().zip(ranges).enumerate() {
        let Some(new_cite) = target(index, tag) else {
            continue;
        };
        if new_cite == tag.cite {
            continue;
        }
        // A tag without an unclaimed occurrence keeps its text; the next prune drops it.
        if let Some(range) = range {
            replacements.push((range, new_cite.clone()));
            updates.push((index, new_cite));
        }
    }

    if replacements.is_empty() {
        return Ok(0);
    }
    let count = replacements.len();
    doc.set_text(container, &splice(&text, replacements))?;
    for (index, new_cite) in updates {
        tags[index].cite = new_cite;
    }
    save(doc, container, &tags)?;
    debug!("Rewrote {} citation(s) in container {}", count, container);
    Ok(count)
}
