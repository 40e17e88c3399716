//! Bibliography target resolution.
//!
//! The bibliography target is a *set* of containers sharing one durable guid.
//! Its identity is kept in two places:
//!
//! - the document state: the guid, plus a positional pointer
//!   (`bib_anchor`) to the container the user selected
//! - the containers themselves: a key/value tag and an alternate-text marker
//!   carrying the guid (hosts persist one or the other unreliably)
//!
//! [`resolve`] always reconciles both tiers: the positional pointer first,
//! then a full scan for either marker. Continuation containers created for
//! overflow only carry the markers, so the scan is never skipped.

use crate::constants::{BIB_ALT_TEXT_PREFIX, BIB_GUID_TAG_KEY};
use crate::core::{BestEffort, ZpError};
use crate::document::{ContainerRef, DocumentProvider, HostError, container_exists, containers_in_order};
use crate::state::DocumentState;
use std::collections::HashSet;
use tracing::{debug, info};

/// Alternate-text marker for `guid`.
#[must_use]
pub fn alt_text_marker(guid: &str) -> String {
    format!("{BIB_ALT_TEXT_PREFIX}{guid}")
}

/// Containers of the bibliography target set, deduplicated, positional hit
/// first and then marker hits in document order.
pub fn resolve(doc: &dyn DocumentProvider, state: &DocumentState) -> Result<Vec<ContainerRef>, HostError> {
    let mut resolved = Vec::new();
    let mut seen = HashSet::new();

    if let Some(anchor) = state.bib_anchor {
        let target = ContainerRef::from(anchor);
        if doc.pages()?.contains(&target.page) && doc.containers(target.page)?.contains(&target) {
            seen.insert(target);
            resolved.push(target);
        }
    }

    if let Some(guid) = state.bib_guid.as_deref().filter(|g| !g.is_empty()) {
        let marker = alt_text_marker(guid);
        for container in containers_in_order(doc)? {
            if seen.contains(&container) {
                continue;
            }
            let by_alt = doc
                .alt_text(&container)
                .best_effort("read alternate text")
                .flatten()
                .is_some_and(|alt| alt.trim() == marker);
            let matched = by_alt
                || doc
                    .tag(&container, BIB_GUID_TAG_KEY)
                    .best_effort("read bibliography tag")
                    .flatten()
                    .is_some_and(|tag| tag == guid);
            if matched {
                seen.insert(container);
                resolved.push(container);
            }
        }
    }

    debug!("Resolved {} bibliography container(s)", resolved.len());
    Ok(resolved)
}

/// Whether any bibliography container resolves.
pub fn has_anchor(doc: &dyn DocumentProvider, state: &DocumentState) -> Result<bool, HostError> {
    Ok(!resolve(doc, state)?.is_empty())
}

/// Write both durable markers onto `container`. Each marker is best effort.
pub fn stamp_markers(doc: &mut dyn DocumentProvider, container: &ContainerRef, guid: &str) {
    doc.set_tag(container, BIB_GUID_TAG_KEY, guid).best_effort("stamp bibliography tag");
    doc.set_alt_text(container, &alt_text_marker(guid)).best_effort("stamp bibliography alternate text");
}

/// Make `container` the bibliography target.
///
/// Keeps an existing guid, records the positional pointer, stamps the
/// markers, then re-reads the state from the document and verifies the
/// target resolves. Returns the resolved target set.
///
/// # Errors
///
/// - [`ZpError::NoTargetSelected`] if the container does not exist
/// - [`ZpError::AnchorIntegrity`] if the target cannot be found again
pub fn set_anchor(doc: &mut dyn DocumentProvider, container: &ContainerRef) -> Result<Vec<ContainerRef>, ZpError> {
    if !container_exists(doc, container)? {
        return Err(ZpError::NoTargetSelected);
    }

    let mut state = DocumentState::load(doc)?;
    let guid = state.ensure_guid();
    state.bib_anchor = Some((*container).into());
    state.save(doc)?;

    stamp_markers(doc, container, &guid);

    let stored = DocumentState::load(doc)?;
    let anchors = resolve(doc, &stored)?;
    if anchors.is_empty() {
        return Err(ZpError::AnchorIntegrity);
    }
    info!("Bibliography target set to {} ({} container(s))", container, anchors.len());
    Ok(anchors)
}

/// Create a continuation of the target set after `last`.
///
/// The new container duplicates `last`'s layout on a new page, takes over the
/// source page title (best effort), starts empty and carries the markers.
pub fn extend_anchor_set(
    doc: &mut dyn DocumentProvider,
    last: &ContainerRef,
    guid: &str,
) -> Result<ContainerRef, ZpError> {
    let created = doc.duplicate_container(last).map_err(|e| ZpError::ContainerCreationFailed {
        reason: e.to_string(),
    })?;

    if let Some(title) = doc.page_title(last.page).best_effort("read page title").flatten() {
        if !title.is_empty() {
            doc.set_page_title(created.page, &title).best_effort("copy page title");
        }
    }
    doc.set_text(&created, "")?;
    stamp_markers(doc, &created, guid);

    debug!("Created bibliography continuation {} after {}", created, last);
    Ok(created)
}
