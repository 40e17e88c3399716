//! Citation style identifiers.
//!
//! The set of styles is fixed. Each style carries two behaviour flags: whether
//! author-year citations sharing a [`Signature`](crate::citation::Signature)
//! are disambiguated with suffix letters, and whether citations are numbered
//! through the placeholder flow.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported citation style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CitationStyle {
    /// American Psychological Association (author-year).
    #[default]
    #[serde(rename = "apa")]
    Apa,
    /// IEEE (numbered).
    #[serde(rename = "ieee")]
    Ieee,
    /// Chicago Manual of Style, author-date variant.
    #[serde(rename = "chicago-author-date")]
    ChicagoAuthorDate,
    /// Harvard (author-year).
    #[serde(rename = "harvard1")]
    Harvard,
    /// Modern Language Association.
    #[serde(rename = "mla")]
    Mla,
}

impl CitationStyle {
    /// Every style, in menu order.
    pub const ALL: [Self; 5] = [Self::Apa, Self::Ieee, Self::ChicagoAuthorDate, Self::Harvard, Self::Mla];

    /// Identifier sent to the citation provider and stored in document state.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Apa => "apa",
            Self::Ieee => "ieee",
            Self::ChicagoAuthorDate => "chicago-author-date",
            Self::Harvard => "harvard1",
            Self::Mla => "mla",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Apa => "APA",
            Self::Ieee => "IEEE",
            Self::ChicagoAuthorDate => "Chicago (author-date)",
            Self::Harvard => "Harvard",
            Self::Mla => "MLA",
        }
    }

    /// Whether citations in this style get signature-based suffix letters.
    #[must_use]
    pub const fn disambiguates(self) -> bool {
        matches!(self, Self::Apa | Self::Harvard)
    }

    /// Whether citations in this style are numbered placeholders.
    #[must_use]
    pub const fn is_numbered(self) -> bool {
        matches!(self, Self::Ieee)
    }

    /// Parse a stored code, falling back to the default style for unknown values.
    #[must_use]
    pub fn from_code_lenient(code: &str) -> Self {
        code.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown citation style '{}', falling back to {}", code, Self::default());
            Self::default()
        })
    }
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unknown style code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown citation style '{0}' (expected one of: apa, ieee, chicago-author-date, harvard1, mla)")]
pub struct UnknownStyle(pub String);

impl FromStr for CitationStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.code() == normalized)
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}
