//! Search-as-you-type coordination.
//!
//! Every search issues a new generation token together with the query it
//! was started for. A finished search is applied only if its token is still
//! the latest one and the input still reads the same; anything else is stale
//! and silently discarded.

use crate::citation::ItemMetadata;
use crate::provider::{CitationProvider, ProviderError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Identity of one issued search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchToken {
    generation: u64,
    query: String,
}

impl SearchToken {
    /// Query this search was issued for.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Tracks the latest issued search and the current input.
#[derive(Debug, Default)]
pub struct SearchCoordinator {
    generation: AtomicU64,
    input: Mutex<String>,
}

impl SearchCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `query` as the current input and issue a token for it.
    pub fn issue(&self, query: &str) -> SearchToken {
        let mut input = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        query.clone_into(&mut input);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        SearchToken {
            generation,
            query: query.to_string(),
        }
    }

    /// Record a change of input without starting a search.
    pub fn set_input(&self, query: &str) {
        let mut input = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        query.clone_into(&mut input);
    }

    /// Whether results for `token` may still be applied.
    pub fn is_current(&self, token: &SearchToken) -> bool {
        let input = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        token.generation == self.generation.load(Ordering::SeqCst) && token.query == *input
    }

    /// Search `provider` for `query`.
    ///
    /// Returns `Ok(None)` when a newer search was issued (or the input
    /// changed) while this one ran, whatever its outcome. An empty query
    /// yields no results without calling the provider.
    pub async fn search<C: CitationProvider>(
        &self,
        provider: &C,
        query: &str,
        limit: usize,
    ) -> Result<Option<Vec<ItemMetadata>>, ProviderError> {
        let token = self.issue(query);
        let result = if query.trim().is_empty() {
            Ok(Vec::new())
        } else {
            provider.search(query, limit).await
        };

        if !self.is_current(&token) {
            debug!("Discarding stale results for '{}'", token.query);
            return Ok(None);
        }
        result.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockProvider, fixtures};
    use std::time::Duration;

    fn provider() -> MockProvider {
        MockProvider::new()
            .with_item(fixtures::item("AAA", &["Smith"], "2019", "Alpha"), "Smith (2019) Alpha")
            .with_item(fixtures::item("BBB", &["Smythe"], "2020", "Beta"), "Smythe (2020) Beta")
    }

    #[test]
    fn test_newer_token_supersedes() {
        let coordinator = SearchCoordinator::new();
        let first = coordinator.issue("smi");
        assert!(coordinator.is_current(&first));

        let second = coordinator.issue("smith");
        assert!(!coordinator.is_current(&first));
        assert!(coordinator.is_current(&second));
        assert_eq!(second.query(), "smith");
    }

    #[test]
    fn test_changed_input_invalidates() {
        let coordinator = SearchCoordinator::new();
        let token = coordinator.issue("smith");
        coordinator.set_input("smithe");
        assert!(!coordinator.is_current(&token));
    }

    #[tokio::test]
    async fn test_empty_query_skips_provider() {
        let provider = provider();
        let coordinator = SearchCoordinator::new();
        let results = coordinator.search(&provider, "  ", 10).await.unwrap();
        assert_eq!(results, Some(Vec::new()));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_results_are_discarded() {
        let provider = provider().with_latency(Duration::from_millis(50));
        let coordinator = SearchCoordinator::new();

        let (stale, fresh) = tokio::join!(coordinator.search(&provider, "sm", 10), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            coordinator.search(&provider, "smith", 10).await
        });

        assert_eq!(stale.unwrap(), None);
        let fresh = fresh.unwrap().unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].key, "AAA");
    }
}
