//! User-facing citation actions.
//!
//! A [`Session`] pairs a [`DocumentHost`] with an optional citation provider
//! and implements the actions a user triggers: inserting citations, choosing
//! the bibliography target, updating, cleaning up and renumbering.
//!
//! Each action performs its document work in one host closure (prune and
//! re-plan groups that lost an occurrence, mutate, persist, flush) and only
//! then contacts the provider to re-render the bibliography. When the
//! provider is needed but not configured, the local changes are already saved
//! and [`ZpError::MissingCredentials`] is returned.

use crate::bibliography::anchor::{self, has_anchor, resolve};
use crate::bibliography::fitter::FontRange;
use crate::bibliography::sync::{self, RenderReport, resync};
use crate::citation::numbering::{self, current_numbering, is_placeholder_key, placeholder};
use crate::citation::{CitationTag, ItemMetadata, Numbering, existing_citation, normalize, tags};
use crate::constants::DEFAULT_MAX_RESULTS;
use crate::core::ZpError;
use crate::document::{ContainerRef, DocumentHost, DocumentProvider, Selection, container_exists};
use crate::provider::{CitationProvider, ProviderError};
use crate::search::SearchCoordinator;
use crate::state::DocumentState;
use crate::style::CitationStyle;
use std::fmt;
use tracing::{debug, info};

/// One-line summary of a document's citation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Active style
    pub style: CitationStyle,
    /// Number of cited keys
    pub citations: usize,
    /// Number of resolved bibliography containers
    pub targets: usize,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Style: {} | Citations: {} | Bibliography target: ", self.style.code().to_uppercase(), self.citations)?;
        if self.targets == 0 {
            write!(f, "NOT set")
        } else {
            write!(f, "set ({} container(s))", self.targets)
        }
    }
}

/// Result of inserting a citation.
#[derive(Debug, Clone)]
pub struct Insertion {
    /// Text inserted at the cursor
    pub inserted: String,
    /// Display text of the citation after disambiguation or numbering
    pub cite: String,
    /// Cited keys after the insertion
    pub keys: Vec<String>,
    /// Bibliography render, if a target exists
    pub rendered: Option<RenderReport>,
}

/// Result of setting the bibliography target.
#[derive(Debug, Clone)]
pub struct Anchoring {
    /// Resolved target set
    pub containers: Vec<ContainerRef>,
    /// Bibliography render, if anything is cited
    pub rendered: Option<RenderReport>,
}

/// Result of a cleanup.
#[derive(Debug, Clone)]
pub struct Cleanup {
    /// Citation occurrences rewritten
    pub rewritten: usize,
    /// Cited keys after cleanup
    pub keys: Vec<String>,
    /// Bibliography render, if a target exists
    pub rendered: Option<RenderReport>,
}

/// Result of renumbering.
#[derive(Debug, Clone)]
pub struct Renumbering {
    /// Assigned numbers
    pub numbering: Numbering,
    /// Bibliography render, if a target exists
    pub rendered: Option<RenderReport>,
}

/// Citation actions on one document.
pub struct Session<C> {
    host: DocumentHost,
    provider: Option<C>,
    fonts: FontRange,
    max_results: usize,
    search: SearchCoordinator,
}

impl<C: CitationProvider> Session<C> {
    /// Create a session. Without a provider, actions that fetch fail with
    /// [`ZpError::MissingCredentials`] after their local changes are saved.
    pub fn new(host: DocumentHost, provider: Option<C>) -> Self {
        Self {
            host,
            provider,
            fonts: FontRange::default(),
            max_results: DEFAULT_MAX_RESULTS,
            search: SearchCoordinator::new(),
        }
    }

    /// Use `fonts` for bibliography layout.
    #[must_use]
    pub const fn with_fonts(mut self, fonts: FontRange) -> Self {
        self.fonts = fonts;
        self
    }

    /// Limit search results to `max_results`.
    #[must_use]
    pub const fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// The document host.
    pub const fn host(&self) -> &DocumentHost {
        &self.host
    }

    fn provider(&self) -> Result<&C, ZpError> {
        self.provider.as_ref().ok_or(ZpError::MissingCredentials)
    }

    /// Current style, cited key count and target state.
    pub async fn status(&self) -> Result<Status, ZpError> {
        self.host
            .run(|doc| -> Result<Status, ZpError> {
                let state = DocumentState::load(doc)?;
                let targets = resolve(doc, &state)?.len();
                Ok(Status {
                    style: state.style,
                    citations: state.bib_keys.len(),
                    targets,
                })
            })
            .await?
    }

    /// Active citation style.
    pub async fn style(&self) -> Result<CitationStyle, ZpError> {
        Ok(self.host.run(|doc| DocumentState::load(doc).map(|s| s.style)).await??)
    }

    /// Persist `style` as the document's citation style.
    pub async fn set_style(&self, style: CitationStyle) -> Result<(), ZpError> {
        self.host
            .run(move |doc| -> Result<(), ZpError> {
                let mut state = DocumentState::load(doc)?;
                state.style = style;
                state.save(doc)?;
                doc.flush()?;
                Ok(())
            })
            .await??;
        info!("Citation style set to {}", style.label());
        Ok(())
    }

    /// Insert a citation of `key` at the selection, fetching its metadata
    /// from the provider for author-year styles.
    pub async fn cite_key(&self, selection: Selection, key: &str) -> Result<Insertion, ZpError> {
        if selection.cursor.is_none() {
            return Err(ZpError::NoInsertionPoint);
        }
        let item = if self.style().await?.is_numbered() {
            ItemMetadata {
                key: key.to_string(),
                ..Default::default()
            }
        } else {
            self.provider()?.get_item(key).await.map_err(|e| provider_failure(key, &e))?
        };
        self.insert_citation(selection, item).await
    }

    /// Insert a citation of `item` at the selection.
    ///
    /// Author-year styles insert the author-year text, re-plan suffixes of the
    /// item's signature group (APA, Harvard) and re-render. The numbered style
    /// inserts a placeholder and renumbers the whole document.
    pub async fn insert_citation(&self, selection: Selection, item: ItemMetadata) -> Result<Insertion, ZpError> {
        let Some(offset) = selection.cursor else {
            return Err(ZpError::NoInsertionPoint);
        };
        let container = selection.container;

        let (mut insertion, style, numbering) = self
            .host
            .run(move |doc| insert_into(doc, &container, offset, &item))
            .await??;

        insertion.rendered = self.refresh(&insertion.keys, style, numbering.as_ref()).await?;
        info!("Inserted {} into {}", insertion.cite, container);
        Ok(insertion)
    }

    /// Make `container` the bibliography target and render into it.
    pub async fn set_anchor(&self, container: ContainerRef) -> Result<Anchoring, ZpError> {
        let (containers, keys, style, numbering) = self
            .host
            .run(move |doc| -> Result<_, ZpError> {
                let style = DocumentState::load(doc)?.style;
                settle(doc, style)?;
                let containers = anchor::set_anchor(doc, &container)?;
                let keys = resync(doc)?;
                let numbering = if style.is_numbered() { Some(current_numbering(doc)?) } else { None };
                doc.flush()?;
                Ok((containers, keys, style, numbering))
            })
            .await??;

        let rendered = if keys.is_empty() {
            debug!("Nothing cited yet; bibliography left empty");
            None
        } else {
            self.refresh(&keys, style, numbering.as_ref()).await?
        };
        Ok(Anchoring {
            containers,
            rendered,
        })
    }

    /// Re-derive the cited keys and re-render the bibliography.
    pub async fn update_bibliography(&self) -> Result<RenderReport, ZpError> {
        let (keys, style, numbering) = self
            .host
            .run(|doc| -> Result<_, ZpError> {
                let style = DocumentState::load(doc)?.style;
                settle(doc, style)?;
                let keys = resync(doc)?;
                doc.flush()?;
                let state = DocumentState::load(doc)?;
                if !has_anchor(doc, &state)? {
                    return Err(ZpError::NoTargetSelected);
                }
                let numbering = if state.style.is_numbered() { Some(current_numbering(doc)?) } else { None };
                Ok((keys, state.style, numbering))
            })
            .await??;

        self.refresh(&keys, style, numbering.as_ref()).await?.ok_or(ZpError::NoTargetSelected)
    }

    /// Prune stale tags, re-plan every signature group (or renumber) and
    /// re-render.
    pub async fn cleanup(&self) -> Result<Cleanup, ZpError> {
        let (rewritten, keys, style, numbering) = self
            .host
            .run(|doc| -> Result<_, ZpError> {
                resync(doc)?;
                let style = DocumentState::load(doc)?.style;
                let mut rewritten = 0;
                let mut numbering = None;
                if style.disambiguates() {
                    rewritten = normalize::renormalize_all(doc)?;
                } else if style.is_numbered() {
                    numbering = Some(numbering::renumber(doc)?);
                }
                let keys = resync(doc)?;
                doc.flush()?;
                Ok((rewritten, keys, style, numbering))
            })
            .await??;

        info!("Cleanup: {} citation(s), {} rewrite(s)", keys.len(), rewritten);
        let rendered = self.refresh(&keys, style, numbering.as_ref()).await?;
        Ok(Cleanup {
            rewritten,
            keys,
            rendered,
        })
    }

    /// Number placeholders and numbered citations by first appearance and
    /// re-render.
    pub async fn renumber(&self) -> Result<Renumbering, ZpError> {
        let (numbering, keys, style) = self
            .host
            .run(|doc| -> Result<_, ZpError> {
                let style = DocumentState::load(doc)?.style;
                settle(doc, style)?;
                let numbering = numbering::renumber(doc)?;
                let keys = resync(doc)?;
                doc.flush()?;
                Ok((numbering, keys, style))
            })
            .await??;

        let rendered = self.refresh(&keys, style, Some(&numbering)).await?;
        Ok(Renumbering {
            numbering,
            rendered,
        })
    }

    /// Search the library. Returns `None` if the results went stale.
    pub async fn search(&self, query: &str) -> Result<Option<Vec<ItemMetadata>>, ZpError> {
        if query.trim().is_empty() {
            return Ok(Some(Vec::new()));
        }
        self.search
            .search(self.provider()?, query, self.max_results)
            .await
            .map_err(|e| provider_failure(query, &e))
    }

    /// Render the bibliography if a target exists, then flush.
    async fn refresh(
        &self,
        keys: &[String],
        style: CitationStyle,
        numbering: Option<&Numbering>,
    ) -> Result<Option<RenderReport>, ZpError> {
        let anchored = self
            .host
            .run(|doc| -> Result<bool, ZpError> {
                let state = DocumentState::load(doc)?;
                Ok(has_anchor(doc, &state)?)
            })
            .await??;
        if !anchored {
            debug!("No bibliography target; the bibliography is written once a target is set");
            return Ok(None);
        }

        let provider = self.provider()?;
        let rendered = sync::render(&self.host, provider, keys, style, numbering, self.fonts).await;
        // entries placed before a failure stay in the document
        self.host.run(|doc| doc.flush()).await??;
        rendered
    }
}

fn provider_failure(key: &str, error: &ProviderError) -> ZpError {
    ZpError::ProviderTransient {
        key: key.to_string(),
        reason: error.to_string(),
    }
}

/// Prune every container and, for disambiguating styles, re-plan the groups
/// that lost an occurrence.
fn settle(doc: &mut dyn DocumentProvider, style: CitationStyle) -> Result<(), ZpError> {
    if style.disambiguates() {
        let rewritten = normalize::replan_pruned(doc)?;
        if rewritten > 0 {
            debug!("Re-planned suffixes after deletions: {} rewrite(s)", rewritten);
        }
    } else {
        normalize::prune_all(doc)?;
    }
    Ok(())
}

/// Document side of a citation insertion.
fn insert_into(
    doc: &mut dyn DocumentProvider,
    container: &ContainerRef,
    offset: usize,
    item: &ItemMetadata,
) -> Result<(Insertion, CitationStyle, Option<Numbering>), ZpError> {
    if !container_exists(doc, container)? {
        return Err(ZpError::UnknownContainer {
            container: *container,
        });
    }
    let style = DocumentState::load(doc)?.style;
    settle(doc, style)?;

    if style.is_numbered() {
        if !is_placeholder_key(&item.key) {
            return Err(ZpError::Other {
                message: format!("Item key '{}' must be alphanumeric", item.key),
            });
        }
        let inserted = placeholder(&item.key);
        doc.insert_text(container, offset, &inserted)?;
        let numbering = numbering::renumber(doc)?;
        let keys = resync(doc)?;
        doc.flush()?;

        let cite = numbering.number(&item.key).map(|n| format!("[{n}]")).unwrap_or_default();
        let insertion = Insertion {
            inserted,
            cite,
            keys,
            rendered: None,
        };
        return Ok((insertion, style, Some(numbering)));
    }

    let reused = if style.disambiguates() { existing_citation(doc, &item.key)? } else { None };
    let (cite, sig) = reused.unwrap_or_else(|| (item.base_citation(), item.signature()));

    let index = tags::position_for(doc, container, offset)?;
    doc.insert_text(container, offset, &cite)?;
    tags::insert(doc, container, index, CitationTag::new(item.key.clone(), cite.clone(), sig.clone()))?;
    if style.disambiguates() {
        normalize::normalize_group(doc, &sig)?;
    }
    let keys = resync(doc)?;
    doc.flush()?;

    let current = tags::load(doc, container)?
        .into_iter()
        .nth(index)
        .map_or_else(|| cite.clone(), |t| t.cite);
    let insertion = Insertion {
        inserted: cite,
        cite: current,
        keys,
        rendered: None,
    };
    Ok((insertion, style, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ContainerId, PageId};
    use crate::test_utils::{MockProvider, fixtures, init_test_logging};

    fn body(page: u32) -> ContainerRef {
        ContainerRef::new(PageId(page), ContainerId(2))
    }

    fn provider() -> MockProvider {
        MockProvider::new()
            .with_item(fixtures::item("SMITH1", &["Smith"], "2019", "First"), "Smith, A. (2019). First.")
            .with_item(fixtures::item("SMITH2", &["Smith"], "2019-06", "Second"), "Smith, B. (2019). Second.")
            .with_item(fixtures::item("JONES1", &["Jones", "Lee"], "", "Third"), "Jones, C., & Lee, D. (n.d.). Third.")
    }

    async fn session(pages: &[&'static str], provider: Option<MockProvider>) -> Session<MockProvider> {
        init_test_logging(None);
        let texts: Vec<&'static str> = pages.to_vec();
        let host = DocumentHost::spawn(move || Ok(fixtures::sample_document(&texts))).await.unwrap();
        Session::new(host, provider)
    }

    async fn text(session: &Session<MockProvider>, container: ContainerRef) -> String {
        session.host().run(move |doc| doc.text(&container)).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_status_line() {
        let session = session(&["Intro"], Some(provider())).await;
        assert_eq!(
            session.status().await.unwrap().to_string(),
            "Style: APA | Citations: 0 | Bibliography target: NOT set"
        );

        session.set_anchor(body(256)).await.unwrap();
        assert_eq!(
            session.status().await.unwrap().to_string(),
            "Style: APA | Citations: 0 | Bibliography target: set (1 container(s))"
        );
    }

    #[tokio::test]
    async fn test_insert_without_cursor() {
        let provider = provider();
        let session = session(&["Intro"], Some(provider.clone())).await;
        let result = session.cite_key(Selection::container(body(256)), "SMITH1").await;
        assert!(matches!(result, Err(ZpError::NoInsertionPoint)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_insert_into_unknown_container() {
        let session = session(&["Intro"], Some(provider())).await;
        let item = fixtures::item("SMITH1", &["Smith"], "2019", "First");
        let result = session.insert_citation(Selection::at(body(300), 0), item).await;
        assert!(matches!(result, Err(ZpError::UnknownContainer { .. })));
    }

    #[tokio::test]
    async fn test_insert_disambiguates_same_signature() {
        let session = session(&["As shown ", "Also "], Some(provider())).await;

        let first = session.cite_key(Selection::at(body(256), 9), "SMITH1").await.unwrap();
        assert_eq!(first.cite, "(Smith, 2019)");
        assert!(first.rendered.is_none());

        let second = session.cite_key(Selection::at(body(257), 5), "SMITH2").await.unwrap();
        assert_eq!(second.cite, "(Smith, 2019b)");
        assert_eq!(second.keys, vec!["SMITH1", "SMITH2"]);
        assert_eq!(text(&session, body(256)).await, "As shown (Smith, 2019a)");
        assert_eq!(text(&session, body(257)).await, "Also (Smith, 2019b)");
    }

    #[tokio::test]
    async fn test_insert_reuses_existing_citation_text() {
        let session = session(&["A ", "B "], Some(provider())).await;
        session.cite_key(Selection::at(body(256), 2), "SMITH1").await.unwrap();
        session.cite_key(Selection::at(body(256), 0), "SMITH2").await.unwrap();

        // SMITH2 now appears first, so it holds the "a" suffix
        assert_eq!(text(&session, body(256)).await, "(Smith, 2019a)A (Smith, 2019b)");

        let again = session.cite_key(Selection::at(body(257), 2), "SMITH1").await.unwrap();
        assert_eq!(again.inserted, "(Smith, 2019b)");
        assert_eq!(again.keys, vec!["SMITH2", "SMITH1"]);
    }

    #[tokio::test]
    async fn test_insert_before_existing_citation_claims_own_text() {
        let session = session(&["X "], Some(provider())).await;
        session.cite_key(Selection::at(body(256), 2), "SMITH1").await.unwrap();

        let inserted = session.cite_key(Selection::at(body(256), 0), "SMITH2").await.unwrap();
        assert_eq!(inserted.cite, "(Smith, 2019a)");
        assert_eq!(text(&session, body(256)).await, "(Smith, 2019a)X (Smith, 2019b)");

        let tags = session.host().run(|doc| tags::load(doc, &body(256))).await.unwrap().unwrap();
        let pairs: Vec<(&str, &str)> = tags.iter().map(|t| (t.key.as_str(), t.cite.as_str())).collect();
        assert_eq!(pairs, vec![("SMITH2", "(Smith, 2019a)"), ("SMITH1", "(Smith, 2019b)")]);

        // deleting the text just inserted drops its own key
        session.host().run(|doc| doc.set_text(&body(256), "X (Smith, 2019b)")).await.unwrap().unwrap();
        let cleanup = session.cleanup().await.unwrap();
        assert_eq!(cleanup.keys, vec!["SMITH1"]);
        assert_eq!(text(&session, body(256)).await, "X (Smith, 2019)");
    }

    #[tokio::test]
    async fn test_deleted_citation_releases_suffix_on_next_action() {
        let session = session(&["A ", "B ", "C "], Some(provider())).await;
        session.cite_key(Selection::at(body(256), 2), "SMITH1").await.unwrap();
        session.cite_key(Selection::at(body(257), 2), "SMITH2").await.unwrap();
        assert_eq!(text(&session, body(257)).await, "B (Smith, 2019b)");

        session.host().run(|doc| doc.set_text(&body(256), "A ")).await.unwrap().unwrap();
        let unrelated = session.cite_key(Selection::at(body(258), 2), "JONES1").await.unwrap();
        assert_eq!(unrelated.keys, vec!["SMITH2", "JONES1"]);
        assert_eq!(text(&session, body(257)).await, "B (Smith, 2019)");
    }

    #[tokio::test]
    async fn test_update_replans_after_deletion() {
        let session = session(&["A ", "B ", ""], Some(provider())).await;
        session.cite_key(Selection::at(body(256), 2), "SMITH1").await.unwrap();
        session.cite_key(Selection::at(body(257), 2), "SMITH2").await.unwrap();
        session.set_anchor(body(258)).await.unwrap();

        session.host().run(|doc| doc.set_text(&body(257), "B ")).await.unwrap().unwrap();
        let report = session.update_bibliography().await.unwrap();
        assert_eq!(report.entries, 1);
        assert_eq!(text(&session, body(256)).await, "A (Smith, 2019)");
        assert_eq!(text(&session, body(258)).await, "Smith, A. (2019). First.");
    }

    #[tokio::test]
    async fn test_insert_renders_when_anchored() {
        let session = session(&["Text ", ""], Some(provider())).await;
        session.set_anchor(body(257)).await.unwrap();

        let insertion = session.cite_key(Selection::at(body(256), 5), "JONES1").await.unwrap();
        assert_eq!(insertion.cite, "(Jones & Lee, n.d.)");
        assert!(insertion.rendered.is_some());
        assert_eq!(text(&session, body(257)).await, "Jones, C., & Lee, D. (n.d.). Third.");
    }

    #[tokio::test]
    async fn test_missing_provider_keeps_local_changes() {
        let session = session(&["Text ", ""], None).await;
        session.set_style(CitationStyle::Ieee).await.unwrap();
        session.set_anchor(body(257)).await.unwrap();

        let result = session.cite_key(Selection::at(body(256), 5), "ABCD2345").await;
        assert!(matches!(result, Err(ZpError::MissingCredentials)));
        assert_eq!(text(&session, body(256)).await, "Text  [1]");
        assert_eq!(session.status().await.unwrap().citations, 1);
    }

    #[tokio::test]
    async fn test_ieee_insert_and_numbered_render() {
        let session = session(&["Intro ", ""], Some(provider())).await;
        session.set_style(CitationStyle::Ieee).await.unwrap();
        session.set_anchor(body(257)).await.unwrap();

        session.cite_key(Selection::at(body(256), 6), "SMITH2").await.unwrap();
        let second = session.cite_key(Selection::at(body(256), 0), "SMITH1").await.unwrap();
        assert_eq!(second.cite, "[1]");

        assert_eq!(text(&session, body(256)).await, " [1]Intro  [2]");
        assert_eq!(
            text(&session, body(257)).await,
            "[1] Smith, A. (2019). First.\n[2] Smith, B. (2019). Second."
        );
    }

    #[tokio::test]
    async fn test_update_without_target() {
        let session = session(&["Intro"], Some(provider())).await;
        assert!(matches!(session.update_bibliography().await, Err(ZpError::NoTargetSelected)));
    }

    #[tokio::test]
    async fn test_cleanup_rolls_back_suffixes() {
        let session = session(&["See ", ""], Some(provider())).await;
        session.set_anchor(body(257)).await.unwrap();
        session.cite_key(Selection::at(body(256), 4), "SMITH1").await.unwrap();
        session.cite_key(Selection::at(body(256), 100), "SMITH2").await.unwrap();
        assert_eq!(text(&session, body(256)).await, "See (Smith, 2019a)(Smith, 2019b)");

        session
            .host()
            .run(|doc| doc.set_text(&body(256), "See (Smith, 2019b)"))
            .await
            .unwrap()
            .unwrap();

        let cleanup = session.cleanup().await.unwrap();
        assert_eq!(cleanup.keys, vec!["SMITH2"]);
        assert_eq!(cleanup.rewritten, 1);
        assert_eq!(text(&session, body(256)).await, "See (Smith, 2019)");
        assert_eq!(text(&session, body(257)).await, "Smith, B. (2019). Second.");
    }

    #[tokio::test]
    async fn test_search_requires_provider_for_non_empty_query() {
        let session = session(&["Intro"], None).await;
        assert_eq!(session.search("").await.unwrap(), Some(Vec::new()));
        assert!(matches!(session.search("smith").await, Err(ZpError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_search_results() {
        let session = session(&["Intro"], Some(provider())).await.with_max_results(1);
        let results = session.search("smith").await.unwrap().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].key, "SMITH1");
    }

    #[tokio::test]
    async fn test_set_anchor_unknown_container() {
        let session = session(&["Intro"], Some(provider())).await;
        assert!(matches!(session.set_anchor(body(999)).await, Err(ZpError::NoTargetSelected)));
    }
}
