//! Numbered (IEEE-like) citations.
//!
//! A numbered citation is first inserted as a placeholder ` ⟦zp:KEY⟧`.
//! [`renumber`] then scans the whole document in order, collecting both
//! pending placeholders and citations that were numbered earlier (tags whose
//! display text is `[n]`), assigns numbers by first appearance of each
//! distinct key starting at 1, and rewrites every occurrence to `[n]`.
//! Placeholders are consumed in the same pass, so a second run finds none and
//! only re-confirms the numbers already shown.

use crate::core::ZpError;
use crate::document::{ContainerRef, DocumentProvider};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;
use tracing::debug;

use super::normalize::collect_pruned;
use super::signature::Signature;
use super::tags::{self, CitationTag};

fn placeholder_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"⟦zp:([A-Za-z0-9]+)⟧").ok()).as_ref()
}

/// Text inserted at the cursor for a numbered citation of `key`.
#[must_use]
pub fn placeholder(key: &str) -> String {
    format!(" ⟦zp:{key}⟧")
}

/// Whether `key` can be carried by a placeholder.
#[must_use]
pub fn is_placeholder_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric())
}

/// The number shown by a numbered citation text such as `[3]`.
#[must_use]
pub fn parse_number(cite: &str) -> Option<usize> {
    let inner = cite.strip_prefix('[')?.strip_suffix(']')?;
    if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}

fn is_numbered(tag: &CitationTag) -> bool {
    tag.sig.is_empty() && parse_number(&tag.cite).is_some()
}

/// Citation numbers per item key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Numbering {
    entries: Vec<(String, usize)>,
}

impl Numbering {
    /// Number assigned to `key`.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<usize> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, n)| *n)
    }

    /// Keys in numbering order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is numbered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number `keys` 1, 2, ... in order, skipping repeats.
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut numbering = Self::default();
        for key in keys {
            numbering.assign(key);
        }
        numbering
    }

    fn assign(&mut self, key: &str) -> usize {
        if let Some(n) = self.number(key) {
            return n;
        }
        let n = self.entries.len() + 1;
        self.entries.push((key.to_string(), n));
        n
    }
}

/// One numbered citation occurrence inside a container's text.
struct Hit {
    range: Range<usize>,
    key: String,
}

struct ContainerScan {
    container: ContainerRef,
    text: String,
    other_tags: Vec<CitationTag>,
    hits: Vec<Hit>,
}

fn scan_container(container: ContainerRef, text: String, tags: Vec<CitationTag>) -> ContainerScan {
    let (numbered, other_tags): (Vec<CitationTag>, Vec<CitationTag>) = tags.into_iter().partition(is_numbered);

    let needles: Vec<&str> = numbered.iter().map(|t| t.cite.as_str()).collect();
    let mut hits: Vec<Hit> = numbered
        .iter()
        .zip(tags::locate(&text, &needles))
        .filter_map(|(tag, range)| {
            range.map(|range| Hit {
                range,
                key: tag.key.clone(),
            })
        })
        .collect();

    if let Some(re) = placeholder_pattern() {
        for caps in re.captures_iter(&text) {
            if let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) {
                hits.push(Hit {
                    range: whole.range(),
                    key: key.as_str().to_string(),
                });
            }
        }
    }
    hits.sort_by_key(|h| h.range.start);

    ContainerScan {
        container,
        text,
        other_tags,
        hits,
    }
}

fn scan_document(doc: &mut dyn DocumentProvider) -> Result<Vec<ContainerScan>, ZpError> {
    let mut scans = Vec::new();
    for (container, tags) in collect_pruned(doc)? {
        let text = doc.text(&container)?;
        scans.push(scan_container(container, text, tags));
    }
    Ok(scans)
}

/// Number all placeholders and numbered citations by first appearance and
/// rewrite them to `[n]`.
pub fn renumber(doc: &mut dyn DocumentProvider) -> Result<Numbering, ZpError> {
    let scans = scan_document(doc)?;

    let mut numbering = Numbering::from_keys(scans.iter().flat_map(|s| s.hits.iter().map(|h| h.key.as_str())));

    for scan in scans {
        if scan.hits.is_empty() {
            continue;
        }
        let mut replacements = Vec::with_capacity(scan.hits.len());
        let mut new_tags = scan.other_tags;
        for hit in scan.hits {
            let cite = format!("[{}]", numbering.assign(&hit.key));
            new_tags.push(CitationTag::new(hit.key, cite.clone(), Signature::default()));
            replacements.push((hit.range, cite));
        }

        let new_text = tags::splice(&scan.text, replacements);
        if new_text != scan.text {
            doc.set_text(&scan.container, &new_text)?;
        }
        if tags::load(doc, &scan.container)? != new_tags {
            tags::save(doc, &scan.container, &new_tags)?;
        }
    }

    debug!("Numbered {} distinct citation key(s)", numbering.len());
    Ok(numbering)
}

/// Numbers currently shown by numbered citations, without rewriting anything.
pub fn current_numbering(doc: &mut dyn DocumentProvider) -> Result<Numbering, ZpError> {
    let mut numbering = Numbering::default();
    for (_, tags) in collect_pruned(doc)? {
        for tag in tags.iter().filter(|t| t.sig.is_empty()) {
            if numbering.number(&tag.key).is_some() {
                continue;
            }
            if let Some(n) = parse_number(&tag.cite) {
                numbering.entries.push((tag.key.clone(), n));
            }
        }
    }
    Ok(numbering)
}
