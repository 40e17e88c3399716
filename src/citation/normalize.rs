//! Document-wide application of suffix plans.
//!
//! [`normalize_group`] re-plans one signature group over the whole document
//! and rewrites every affected occurrence. It runs after each insertion for
//! the inserted item's signature, and through [`replan_pruned`] for every
//! group that lost an occurrence since the last action. [`renormalize_all`]
//! runs it for every signature present and backs the explicit cleanup action.

use crate::core::ZpError;
use crate::document::{ContainerRef, DocumentProvider, containers_in_order};
use tracing::debug;

use super::signature::{Occurrence, Signature, plan_suffixes};
use super::tags::{self, CitationTag};

/// Pruned tags of every container, in document order.
pub fn collect_pruned(doc: &mut dyn DocumentProvider) -> Result<Vec<(ContainerRef, Vec<CitationTag>)>, ZpError> {
    let mut all = Vec::new();
    for container in containers_in_order(doc)? {
        let kept = tags::prune(doc, &container)?;
        all.push((container, kept));
    }
    Ok(all)
}

/// Prune every container. Returns the signatures of the dropped tags.
pub fn prune_all(doc: &mut dyn DocumentProvider) -> Result<Vec<Signature>, ZpError> {
    let mut touched: Vec<Signature> = Vec::new();
    for container in containers_in_order(doc)? {
        let (_, dropped) = tags::prune_split(doc, &container)?;
        for tag in dropped {
            if !tag.sig.is_empty() && !touched.contains(&tag.sig) {
                touched.push(tag.sig);
            }
        }
    }
    Ok(touched)
}

/// Prune every container and re-plan each group that lost an occurrence.
///
/// Must run before anything else prunes, or the dropped signatures are lost.
pub fn replan_pruned(doc: &mut dyn DocumentProvider) -> Result<usize, ZpError> {
    let mut rewritten = 0;
    for sig in prune_all(doc)? {
        rewritten += normalize_group(doc, &sig)?;
    }
    Ok(rewritten)
}

/// Re-plan the suffixes of one signature group and rewrite its occurrences.
///
/// Returns the number of rewritten occurrences.
pub fn normalize_group(doc: &mut dyn DocumentProvider, sig: &Signature) -> Result<usize, ZpError> {
    if sig.is_empty() {
        return Ok(0);
    }
    let snapshot = collect_pruned(doc)?;

    let occurrences: Vec<Occurrence<'_>> = snapshot
        .iter()
        .flat_map(|(_, tags)| tags.iter())
        .filter(|t| &t.sig == sig)
        .map(|t| Occurrence {
            sig: &t.sig,
            key: &t.key,
            cite: &t.cite,
        })
        .collect();
    if occurrences.is_empty() {
        return Ok(0);
    }
    let plan = plan_suffixes(&occurrences);

    let mut rewritten = 0;
    for (container, container_tags) in &snapshot {
        if !container_tags.iter().any(|t| &t.sig == sig) {
            continue;
        }
        rewritten += tags::rewrite(doc, container, |_, tag| {
            if &tag.sig == sig { plan.get(&tag.key).cloned() } else { None }
        })?;
    }
    debug!("Normalized signature group '{}': {} rewrite(s)", sig, rewritten);
    Ok(rewritten)
}

/// Normalize every signature group present in the document.
pub fn renormalize_all(doc: &mut dyn DocumentProvider) -> Result<usize, ZpError> {
    let mut signatures: Vec<Signature> = Vec::new();
    for (_, tags) in collect_pruned(doc)? {
        for tag in tags {
            if !tag.sig.is_empty() && !signatures.contains(&tag.sig) {
                signatures.push(tag.sig);
            }
        }
    }

    let mut rewritten = 0;
    for sig in &signatures {
        rewritten += normalize_group(doc, sig)?;
    }
    Ok(rewritten)
}
