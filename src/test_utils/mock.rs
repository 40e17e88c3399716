//! Scripted citation provider.

use crate::citation::ItemMetadata;
use crate::provider::zotero::fallback_entry;
use crate::provider::{CitationProvider, ProviderError};
use crate::style::CitationStyle;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A [`CitationProvider`] answering from fixed data.
///
/// Formatted entries come from [`with_entry`](Self::with_entry), or are
/// built from item metadata like the Zotero JSON fallback. Keys registered
/// with [`with_failure`](Self::with_failure) fail every call with a
/// transport error. Clones share the call counter.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    entries: HashMap<String, String>,
    items: Vec<ItemMetadata>,
    failures: HashSet<String>,
    latency: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item and its formatted entry.
    #[must_use]
    pub fn with_item(mut self, item: ItemMetadata, entry: impl Into<String>) -> Self {
        self.entries.insert(item.key.clone(), entry.into());
        self.items.push(item);
        self
    }

    /// Register a formatted entry without metadata.
    #[must_use]
    pub fn with_entry(mut self, key: &str, entry: impl Into<String>) -> Self {
        self.entries.insert(key.to_string(), entry.into());
        self
    }

    /// Make every call for `key` fail.
    #[must_use]
    pub fn with_failure(mut self, key: &str) -> Self {
        self.failures.insert(key.to_string());
        self
    }

    /// Delay every search by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of provider calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, key: &str) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.contains(key) {
            return Err(ProviderError::Transport {
                url: format!("mock://items/{key}"),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(())
    }

    fn find(&self, key: &str) -> Option<&ItemMetadata> {
        self.items.iter().find(|item| item.key == key)
    }
}

impl CitationProvider for MockProvider {
    async fn fetch_formatted_entry(&self, key: &str, _style: CitationStyle) -> Result<String, ProviderError> {
        self.check(key)?;
        if let Some(entry) = self.entries.get(key) {
            return Ok(entry.clone());
        }
        self.find(key).map(fallback_entry).ok_or_else(|| ProviderError::NotFound {
            key: key.to_string(),
        })
    }

    async fn get_item(&self, key: &str) -> Result<ItemMetadata, ProviderError> {
        self.check(key)?;
        self.find(key).cloned().ok_or_else(|| ProviderError::NotFound {
            key: key.to_string(),
        })
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ItemMetadata>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let needle = query.to_lowercase();
        Ok(self
            .items
            .iter()
            .filter(|item| item.summary().to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }
}
