//! Bibliographic item metadata as returned by the citation provider.
//!
//! Only the fields needed to build author-year citations are modelled. The
//! structure follows the `data` object of a Zotero item.

use super::signature::{Signature, group_signature};
use crate::constants::{NO_DATE, UNKNOWN_AUTHOR};
use serde::{Deserialize, Serialize};

/// One creator (author, editor, ...) of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    /// Role, e.g. `author` or `editor`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_type: Option<String>,
    /// Given name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Single-field name, used for institutions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Creator {
    /// A person with the given family name.
    pub fn person(last_name: impl Into<String>) -> Self {
        Self {
            creator_type: Some("author".to_string()),
            last_name: Some(last_name.into()),
            ..Self::default()
        }
    }

    /// Family name, or the single-field name for institutions.
    #[must_use]
    pub fn surname(&self) -> Option<&str> {
        [self.last_name.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// Metadata of a bibliographic item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    /// Provider-issued item key
    #[serde(default)]
    pub key: String,
    /// Item type, e.g. `journalArticle`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    /// Title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Creators in order
    #[serde(default)]
    pub creators: Vec<Creator>,
    /// Free-form date, e.g. `2019-03` or `March 2019`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Landing page URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ItemMetadata {
    /// Surnames of all named creators, in order.
    #[must_use]
    pub fn surnames(&self) -> Vec<String> {
        self.creators.iter().filter_map(Creator::surname).map(str::to_string).collect()
    }

    /// Names used for the author label: creator surnames, or the title when
    /// the item has no named creators.
    fn label_names(&self) -> Vec<String> {
        let names = self.surnames();
        if !names.is_empty() {
            return names;
        }
        self.title.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).map(str::to_string).collect()
    }

    /// Author label as shown in a citation.
    #[must_use]
    pub fn author_label(&self) -> String {
        author_label(&self.label_names())
    }

    /// First four-digit year in the date field.
    #[must_use]
    pub fn year(&self) -> Option<String> {
        self.date.as_deref().and_then(extract_year)
    }

    /// Grouping signature of this item.
    #[must_use]
    pub fn signature(&self) -> Signature {
        group_signature(&self.label_names(), self.year().as_deref())
    }

    /// Author-year citation text without a disambiguation suffix.
    #[must_use]
    pub fn base_citation(&self) -> String {
        let year = self.year();
        format!("({}, {})", self.author_label(), year.as_deref().unwrap_or(NO_DATE))
    }

    /// One-line description for search listings.
    #[must_use]
    pub fn summary(&self) -> String {
        let title = self.title.as_deref().unwrap_or("");
        match self.year() {
            Some(year) => format!("{} ({}) {}", self.author_label(), year, title).trim_end().to_string(),
            None => format!("{} {}", self.author_label(), title).trim_end().to_string(),
        }
    }
}

/// Author label for a list of names.
///
/// One name is used as is, two are joined with `&`, three or more collapse to
/// `et al.`. An empty list yields the unknown-author placeholder.
#[must_use]
pub fn author_label(names: &[String]) -> String {
    match names {
        [] => UNKNOWN_AUTHOR.to_string(),
        [one] => one.clone(),
        [first, second] => format!("{first} & {second}"),
        [first, ..] => format!("{first} et al."),
    }
}

/// First run of four ASCII digits in `date`.
#[must_use]
pub fn extract_year(date: &str) -> Option<String> {
    let bytes = date.as_bytes();
    bytes.windows(4).position(|w| w.iter().all(u8::is_ascii_digit)).map(|i| date[i..i + 4].to_string())
}
