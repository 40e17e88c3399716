//! Citation providers.
//!
//! A [`CitationProvider`] turns item keys into formatted bibliography entries
//! and item metadata, and searches the library. The engine treats every
//! provider failure for a single key as recoverable: the bibliography shows a
//! placeholder for that key and the rest renders normally.
//!
//! [`ZoteroProvider`] talks to the Zotero Web API. Tests use the scripted
//! provider from `test_utils`.

pub mod zotero;

pub use zotero::ZoteroProvider;

use crate::citation::ItemMetadata;
use crate::style::CitationStyle;
use std::future::Future;
use thiserror::Error;

/// Failure of a citation provider call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The request could not be sent or the response not read.
    #[error("Request to {url} failed: {reason}")]
    Transport {
        /// Requested URL
        url: String,
        /// Transport error message
        reason: String,
    },

    /// The provider answered with an unsuccessful status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// The item does not exist in the library.
    #[error("Item '{key}' not found")]
    NotFound {
        /// Requested item key
        key: String,
    },

    /// The response body could not be interpreted.
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether retrying the request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::NotFound { .. } | Self::InvalidResponse(_) => false,
        }
    }
}

/// Source of formatted bibliography entries and item metadata.
pub trait CitationProvider: Send + Sync {
    /// Formatted bibliography entry of `key` in `style`, as plain text.
    fn fetch_formatted_entry(
        &self,
        key: &str,
        style: CitationStyle,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;

    /// Metadata of `key`.
    fn get_item(&self, key: &str) -> impl Future<Output = Result<ItemMetadata, ProviderError>> + Send;

    /// Items matching `query`, most recently modified first, at most `limit`.
    fn search(&self, query: &str, limit: usize) -> impl Future<Output = Result<Vec<ItemMetadata>, ProviderError>> + Send;
}
