//! Bibliography target resolution, fitting and pagination.

use anyhow::Result;
use zpcite_cli::bibliography::sync::unavailable_entry;
use zpcite_cli::bibliography::{FitOutcome, FontRange, distribute, fit, resolve, set_anchor};
use zpcite_cli::core::ZpError;
use zpcite_cli::document::{ContainerRef, DocumentProvider, MemoryDocument, PageId, Selection};
use zpcite_cli::state::DocumentState;
use zpcite_cli::test_utils::{MockProvider, fixtures};

use crate::common::{TestWorkspace, body, memory_session, text};

fn entries(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("Author{i} (20{i:02}) Title {i}.")).collect()
}

/// A document with one slide of body text and a references page whose body
/// container is `height` points tall.
fn deck_with_references(height: f64) -> MemoryDocument {
    let mut doc = fixtures::sample_document(&["Body "]);
    let page = doc.add_page(Some("References"), "title-and-content");
    if let Err(e) = doc.add_container(page, "", fixtures::FIXTURE_WIDTH, height) {
        panic!("references page vanished: {e}");
    }
    doc
}

fn provider(keys: usize) -> MockProvider {
    (1..=keys).fold(MockProvider::new(), |provider, i| {
        let surname = format!("Author{i}");
        let year = format!("20{i:02}");
        provider.with_item(
            fixtures::item(&format!("KEY{i}"), &[surname.as_str()], &year, &format!("Title {i}")),
            format!("{surname} ({year}) Title {i}."),
        )
    })
}

#[test]
fn test_resolution_is_stable_between_calls() -> Result<()> {
    let mut doc = deck_with_references(40.0);
    set_anchor(&mut doc, &body(257))?;
    distribute(&mut doc, &entries(5), FontRange::default())?;

    let state = DocumentState::load(&doc)?;
    let first = resolve(&doc, &state)?;
    let second = resolve(&doc, &state)?;
    assert_eq!(first, second);
    assert_eq!(first, vec![body(257), body(258)]);
    Ok(())
}

#[test]
fn test_fit_prefers_more_entries_at_smaller_size() -> Result<()> {
    // Lines are 16.8pt at 14pt and 12pt at 10pt; 63 - 2 holds three or five.
    let mut doc = deck_with_references(63.0);
    let outcome = fit(&mut doc, &body(257), &entries(5), FontRange::default())?;
    assert_eq!(
        outcome,
        FitOutcome {
            placed: 5,
            font_size: 10,
            overflowed: false
        }
    );
    assert_eq!(doc.text(&body(257))?, entries(5).join("\n"));
    Ok(())
}

#[test]
fn test_fit_never_places_zero_entries() -> Result<()> {
    let mut doc = deck_with_references(5.0);
    let outcome = fit(&mut doc, &body(257), &entries(2), FontRange::default())?;
    assert_eq!((outcome.placed, outcome.font_size), (1, 10));
    assert!(outcome.overflowed);
    assert_eq!(doc.text(&body(257))?, entries(1)[0]);
    Ok(())
}

#[tokio::test]
async fn test_overflow_creates_persistent_continuation_pages() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    workspace.write_document(deck_with_references(40.0))?;

    {
        let session = workspace.session(Some(provider(5))).await?;
        session.set_anchor(body(257)).await?;
        for i in 1..=5 {
            session.cite_key(Selection::at(body(256), usize::MAX), &format!("KEY{i}")).await?;
        }
        let report = session.update_bibliography().await?;
        assert_eq!(report.entries, 5);
        assert_eq!(report.filled.len(), 2);
        assert!(report.created.is_empty(), "continuation already exists from earlier renders");
    }

    let saved = workspace.reload()?;
    let state = DocumentState::load(&saved)?;
    assert_eq!(state.bib_keys.len(), 5);
    assert!(state.last_rendered.is_some());

    let targets = resolve(&saved, &state)?;
    assert_eq!(targets, vec![body(257), body(258)]);
    assert_eq!(saved.page_title(PageId(258))?.as_deref(), Some("References"));

    let rendered: Vec<String> =
        targets.iter().map(|c| saved.text(c)).collect::<Result<Vec<_>, _>>()?;
    assert_eq!(rendered.join("\n"), entries(5).join("\n"));
    Ok(())
}

#[tokio::test]
async fn test_shrinking_bibliography_clears_continuations() -> Result<()> {
    let session = memory_session(&["Body ", ""], Some(provider(5))).await?;
    session
        .host()
        .run(|doc| -> Result<Vec<ContainerRef>, ZpError> {
            let anchors = set_anchor(doc, &body(257))?;
            distribute(doc, &entries(40), FontRange::default())?;
            Ok(anchors)
        })
        .await??;

    session.cite_key(Selection::at(body(256), usize::MAX), "KEY1").await?;
    let report = session.update_bibliography().await?;

    assert_eq!(report.entries, 1);
    assert_eq!(report.filled.len(), 1);
    assert!(!report.cleared.is_empty());
    assert_eq!(text(&session, body(257)).await?, "Author1 (2001) Title 1.");
    for cleared in &report.cleared {
        assert_eq!(text(&session, *cleared).await?, "");
    }
    Ok(())
}

#[tokio::test]
async fn test_unavailable_entry_keeps_its_place() -> Result<()> {
    let session = memory_session(&["Body ", ""], Some(provider(3).with_failure("KEY2"))).await?;
    session.set_anchor(body(257)).await?;

    session.cite_key(Selection::at(body(256), usize::MAX), "KEY1").await?;
    session.cite_key(Selection::at(body(256), usize::MAX), "KEY3").await?;
    session
        .insert_citation(
            Selection::at(body(256), usize::MAX),
            fixtures::item("KEY2", &["Author2"], "2002", "Title 2"),
        )
        .await?;

    let report = session.update_bibliography().await?;
    assert_eq!(report.unavailable, vec!["KEY2"]);
    assert_eq!(
        text(&session, body(257)).await?,
        format!("Author1 (2001) Title 1.\nAuthor3 (2003) Title 3.\n{}", unavailable_entry("KEY2"))
    );
    Ok(())
}

#[test]
fn test_anchor_survives_positional_pointer_loss() -> Result<()> {
    let mut doc = deck_with_references(300.0);
    set_anchor(&mut doc, &body(257))?;

    let mut state = DocumentState::load(&doc)?;
    state.bib_anchor = None;
    state.save(&mut doc)?;

    let state = DocumentState::load(&doc)?;
    assert_eq!(resolve(&doc, &state)?, vec![body(257)]);
    Ok(())
}
