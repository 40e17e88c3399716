//! Citation signatures and suffix disambiguation.
//!
//! Author-year styles render different works by the same author in the same
//! year identically, e.g. two `(Smith, 2019)`. A [`Signature`] is the grouping
//! key for such collisions (`"Smith|2019"`). [`plan_suffixes`] decides the
//! display text of every key in a group:
//!
//! - a group with one distinct key shows the plain base form `(Smith, 2019)`
//! - a group with several keys shows `(Smith, 2019a)`, `(Smith, 2019b)`, ...
//!   with letters assigned by first appearance in document order
//!
//! Planning is pure; applying a plan to container text lives in
//! [`normalize`](super::normalize).

use crate::constants::{NO_DATE, UNKNOWN_AUTHOR};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use super::item::author_label;

/// Grouping key derived from author label and year.
///
/// Distinct item keys may share a signature. The empty signature marks
/// citations that never take part in disambiguation (numbered citations).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Build a signature from an author label and an optional year.
    #[must_use]
    pub fn new(author: &str, year: Option<&str>) -> Self {
        Self(format!("{}|{}", author, year.filter(|y| !y.is_empty()).unwrap_or(NO_DATE)))
    }

    /// The signature string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the empty (non-grouping) signature.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Signature {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Signature for a list of author names and an optional year.
#[must_use]
pub fn group_signature(authors: &[String], year: Option<&str>) -> Signature {
    Signature::new(&author_label(authors), year)
}

/// Placeholder base for citations whose text has no usable base form.
fn fallback_base() -> String {
    format!("({UNKNOWN_AUTHOR})")
}

fn suffix_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d{4}|n\.d\.)[a-z]+\)$").ok()).as_ref()
}

/// Remove a disambiguation suffix: `(Smith, 2019b)` becomes `(Smith, 2019)`,
/// `(Smith, n.d.a)` becomes `(Smith, n.d.)`.
#[must_use]
pub fn strip_suffix(cite: &str) -> String {
    match suffix_pattern() {
        Some(re) => re.replace(cite, "${1})").into_owned(),
        None => cite.to_string(),
    }
}

/// Suffix letters for the `index`-th key of a group: `a`..`z`, then `aa`, `ab`, ...
#[must_use]
pub fn suffix_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'a' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Insert the suffix for `index` before the closing delimiter of `base`.
#[must_use]
pub fn apply_suffix(base: &str, index: usize) -> String {
    let letters = suffix_letters(index);
    match base.strip_suffix(')') {
        Some(stem) => format!("{stem}{letters})"),
        None => format!("{base}{letters}"),
    }
}

/// One citation occurrence, in document order.
#[derive(Debug, Clone, Copy)]
pub struct Occurrence<'a> {
    /// Signature of the cited item
    pub sig: &'a Signature,
    /// Cited item key
    pub key: &'a str,
    /// Display text currently in the document
    pub cite: &'a str,
}

/// Target display text per item key for the given occurrences.
///
/// Occurrences must be in document order (page, container, tag index).
/// Occurrences with an empty signature, key or display text are ignored.
#[must_use]
pub fn plan_suffixes(occurrences: &[Occurrence<'_>]) -> HashMap<String, String> {
    // signature -> distinct keys in first-appearance order
    let mut groups: Vec<(&Signature, Vec<&str>)> = Vec::new();
    let mut bases: HashMap<&str, String> = HashMap::new();

    for occ in occurrences {
        if occ.sig.is_empty() || occ.key.is_empty() || occ.cite.is_empty() {
            continue;
        }
        bases.entry(occ.key).or_insert_with(|| {
            let base = strip_suffix(occ.cite);
            if base.trim().is_empty() { fallback_base() } else { base }
        });
        match groups.iter_mut().find(|(sig, _)| *sig == occ.sig) {
            Some((_, keys)) => {
                if !keys.contains(&occ.key) {
                    keys.push(occ.key);
                }
            }
            None => groups.push((occ.sig, vec![occ.key])),
        }
    }

    let mut plan = HashMap::new();
    for (_, keys) in groups {
        if let [only] = keys.as_slice() {
            let base = bases.get(only).cloned().unwrap_or_else(fallback_base);
            plan.insert((*only).to_string(), base);
            continue;
        }
        for (index, key) in keys.iter().enumerate() {
            let base = bases.get(key).cloned().unwrap_or_else(fallback_base);
            plan.insert((*key).to_string(), apply_suffix(&base, index));
        }
    }
    plan
}
