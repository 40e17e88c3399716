//! Keeping the bibliography in step with the document.
//!
//! [`resync`] rebuilds the cited key list from the tags of every container.
//! [`render`] fetches one formatted entry per key and hands them to
//! [`distribute`], which pages them through the anchor containers in
//! resolution order, creating continuation containers while entries remain.
//!
//! Fetching runs on the async runtime; everything touching the document runs
//! inside a single [`DocumentHost::run`] closure per step.

use super::anchor::{extend_anchor_set, has_anchor, resolve};
use super::fitter::{FitOutcome, FontRange, fit};
use crate::citation::{Numbering, collect_keys};
use crate::constants::MAX_CONCURRENT_FETCHES;
use crate::core::ZpError;
use crate::document::{ContainerRef, DocumentHost, DocumentProvider};
use crate::provider::CitationProvider;
use crate::state::DocumentState;
use crate::style::CitationStyle;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// What a render wrote, and where.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Number of entries rendered, placeholders included
    pub entries: usize,
    /// Containers holding entries, in order, with their fit results
    pub filled: Vec<(ContainerRef, FitOutcome)>,
    /// Continuation containers created during this render
    pub created: Vec<ContainerRef>,
    /// Anchor containers emptied because no entries were left for them
    pub cleared: Vec<ContainerRef>,
    /// Keys whose entry could not be fetched
    pub unavailable: Vec<String>,
}

impl RenderReport {
    /// Whether any container holds more than it can show.
    #[must_use]
    pub fn overflowed(&self) -> bool {
        self.filled.iter().any(|(_, outcome)| outcome.overflowed)
    }
}

/// Placeholder entry for a key the provider could not format.
#[must_use]
pub fn unavailable_entry(key: &str) -> String {
    format!("[bibliography unavailable: {key}]")
}

/// Rebuild the cited key list from the document and store it in the state.
pub fn resync(doc: &mut dyn DocumentProvider) -> Result<Vec<String>, ZpError> {
    let keys = collect_keys(doc)?;
    let mut state = DocumentState::load(doc)?;
    state.bib_keys.clone_from(&keys);
    state.save(doc)?;
    debug!("Resynced {} cited key(s)", keys.len());
    Ok(keys)
}

/// Write `entries` across the bibliography target set.
///
/// Existing anchors are filled in resolution order; when they run out a
/// continuation is created after the last one. Anchors left without entries
/// are cleared. Does nothing when no anchor resolves.
///
/// # Errors
///
/// [`ZpError::ContainerCreationFailed`] if a continuation cannot be created.
/// Entries placed before the failure stay in the document.
pub fn distribute(
    doc: &mut dyn DocumentProvider,
    entries: &[String],
    fonts: FontRange,
) -> Result<RenderReport, ZpError> {
    let mut state = DocumentState::load(doc)?;
    let mut anchors = resolve(doc, &state)?;
    let mut report = RenderReport {
        entries: entries.len(),
        ..Default::default()
    };
    if anchors.is_empty() {
        debug!("No bibliography target; skipping distribution");
        return Ok(report);
    }
    let guid = state.ensure_guid();

    let mut remaining = entries;
    let mut used = 0;
    while !remaining.is_empty() {
        if used == anchors.len() {
            let last = anchors[used - 1];
            let created = extend_anchor_set(doc, &last, &guid)?;
            anchors.push(created);
            report.created.push(created);
        }
        let container = anchors[used];
        let outcome = fit(doc, &container, remaining, fonts)?;
        remaining = &remaining[outcome.placed..];
        report.filled.push((container, outcome));
        used += 1;
    }

    for container in &anchors[used..] {
        fit(doc, container, &[], fonts)?;
        report.cleared.push(*container);
    }

    state.last_rendered = Some(Utc::now());
    state.save(doc)?;
    debug!(
        "Distributed {} entries over {} container(s), {} created, {} cleared",
        entries.len(),
        report.filled.len(),
        report.created.len(),
        report.cleared.len()
    );
    Ok(report)
}

/// Formatted entries for `keys`, in key order, with the keys that failed.
///
/// A failing key yields [`unavailable_entry`]. With `numbering`, each
/// numbered key's entry is prefixed with `[n] `.
pub async fn fetch_entries<C: CitationProvider>(
    provider: &C,
    keys: &[String],
    style: CitationStyle,
    numbering: Option<&Numbering>,
) -> (Vec<String>, Vec<String>) {
    let fetched: Vec<_> = stream::iter(keys)
        .map(|key| async move { (key, provider.fetch_formatted_entry(key, style).await) })
        .buffered(MAX_CONCURRENT_FETCHES)
        .collect()
        .await;

    let mut entries = Vec::with_capacity(fetched.len());
    let mut unavailable = Vec::new();
    for (key, result) in fetched {
        let text = match result {
            Ok(text) => text,
            Err(e) => {
                let soft = ZpError::ProviderTransient {
                    key: key.clone(),
                    reason: e.to_string(),
                };
                warn!("{}", soft);
                unavailable.push(key.clone());
                unavailable_entry(key)
            }
        };
        entries.push(match numbering.and_then(|n| n.number(key)) {
            Some(n) => format!("[{n}] {text}"),
            None => text,
        });
    }
    (entries, unavailable)
}

/// Fetch and lay out the bibliography for `keys`.
///
/// Returns `None` without contacting the provider when the document has no
/// bibliography target.
pub async fn render<C: CitationProvider>(
    host: &DocumentHost,
    provider: &C,
    keys: &[String],
    style: CitationStyle,
    numbering: Option<&Numbering>,
    fonts: FontRange,
) -> Result<Option<RenderReport>, ZpError> {
    let anchored = host
        .run(|doc| -> Result<bool, ZpError> {
            let state = DocumentState::load(doc)?;
            Ok(has_anchor(doc, &state)?)
        })
        .await??;
    if !anchored {
        debug!("No bibliography target; nothing to render");
        return Ok(None);
    }

    let (entries, unavailable) = fetch_entries(provider, keys, style, numbering).await;
    let mut report = host.run(move |doc| distribute(doc, &entries, fonts)).await??;
    report.unavailable = unavailable;

    info!(
        "Rendered {} bibliography entries into {} container(s)",
        report.entries,
        report.filled.len()
    );
    if !report.unavailable.is_empty() {
        warn!("{} entries are unavailable: {}", report.unavailable.len(), report.unavailable.join(", "));
    }
    Ok(Some(report))
}
