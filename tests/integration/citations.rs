//! Author-year citations: suffixes, rollback, pruning and key order.

use anyhow::Result;
use zpcite_cli::bibliography::resync;
use zpcite_cli::citation::{CitationTag, Signature, tags};
use zpcite_cli::document::{DocumentProvider, MemoryDocument, Selection, containers_in_order};
use zpcite_cli::state::DocumentState;
use zpcite_cli::test_utils::{MockProvider, fixtures};

use crate::common::{TestWorkspace, body, edit, memory_session, text};

fn mueller_provider() -> MockProvider {
    MockProvider::new()
        .with_item(fixtures::item("MUELLER1", &["Müller"], "2020", "Erstes"), "Müller, A. (2020). Erstes.")
        .with_item(fixtures::item("MUELLER2", &["Müller"], "2020-03-01", "Zweites"), "Müller, B. (2020). Zweites.")
}

fn tag(key: &str, cite: &str, sig: &str) -> CitationTag {
    CitationTag::new(key, cite, Signature::from(sig))
}

#[tokio::test]
async fn test_shared_signature_suffixes_follow_insertion_order() -> Result<()> {
    let session = memory_session(&["Erstens ", "Zweitens "], Some(mueller_provider())).await?;

    let first = session.cite_key(Selection::at(body(256), usize::MAX), "MUELLER1").await?;
    assert_eq!(first.inserted, "(Müller, 2020)");
    assert_eq!(first.cite, "(Müller, 2020)");

    let second = session.cite_key(Selection::at(body(257), usize::MAX), "MUELLER2").await?;
    assert_eq!(second.cite, "(Müller, 2020b)");
    assert_eq!(text(&session, body(256)).await?, "Erstens (Müller, 2020a)");
    assert_eq!(text(&session, body(257)).await?, "Zweitens (Müller, 2020b)");

    let stored = session.host().run(|doc| tags::load(doc, &body(257))).await??;
    assert_eq!(stored[0].sig, Signature::new("Müller", Some("2020")));

    edit(&session, body(256), "Erstens ").await?;
    let cleanup = session.cleanup().await?;
    assert_eq!(cleanup.keys, vec!["MUELLER2"]);
    assert_eq!(text(&session, body(257)).await?, "Zweitens (Müller, 2020)");
    Ok(())
}

#[tokio::test]
async fn test_suffix_rolls_back_on_next_action_without_cleanup() -> Result<()> {
    let provider = mueller_provider()
        .with_item(fixtures::item("SCHMIDT1", &["Schmidt"], "2018", "Drittes"), "Schmidt, C. (2018). Drittes.");
    let session = memory_session(&["A ", "B ", "C ", ""], Some(provider)).await?;

    session.cite_key(Selection::at(body(256), usize::MAX), "MUELLER1").await?;
    session.cite_key(Selection::at(body(257), usize::MAX), "MUELLER2").await?;
    assert_eq!(text(&session, body(257)).await?, "B (Müller, 2020b)");

    edit(&session, body(256), "A ").await?;
    let unrelated = session.cite_key(Selection::at(body(258), usize::MAX), "SCHMIDT1").await?;
    assert_eq!(unrelated.keys, vec!["MUELLER2", "SCHMIDT1"]);
    assert_eq!(text(&session, body(257)).await?, "B (Müller, 2020)");

    session.set_anchor(body(259)).await?;
    session.update_bibliography().await?;
    assert_eq!(text(&session, body(257)).await?, "B (Müller, 2020)");
    assert_eq!(
        text(&session, body(259)).await?,
        "Müller, B. (2020). Zweites.\nSchmidt, C. (2018). Drittes."
    );
    Ok(())
}

#[tokio::test]
async fn test_deleting_first_citation_rolls_back_suffix_on_file_document() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    workspace.write_document(fixtures::sample_document(&["See "]))?;
    let provider = MockProvider::new()
        .with_item(fixtures::item("SMITHA", &["Smith"], "2019", "Alpha"), "Smith (2019) Alpha")
        .with_item(fixtures::item("SMITHB", &["Smith"], "2019", "Beta"), "Smith (2019) Beta");

    {
        let session = workspace.session(Some(provider.clone())).await?;
        session.cite_key(Selection::at(body(256), usize::MAX), "SMITHA").await?;
        session.cite_key(Selection::at(body(256), usize::MAX), "SMITHB").await?;
    }
    let saved = workspace.reload()?;
    assert_eq!(saved.text(&body(256))?, "See (Smith, 2019a)(Smith, 2019b)");

    let session = workspace.session(Some(provider)).await?;
    edit(&session, body(256), "See (Smith, 2019b)").await?;
    session.cleanup().await?;
    drop(session);

    let saved = workspace.reload()?;
    assert_eq!(saved.text(&body(256))?, "See (Smith, 2019)");
    let remaining = tags::load(&saved, &body(256))?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].key, "SMITHB");
    assert_eq!(remaining[0].cite, "(Smith, 2019)");
    Ok(())
}

#[test]
fn test_prune_is_idempotent() -> Result<()> {
    let mut doc = fixtures::sample_document(&["Kept (Jones, 2001) and (Lee, 1999)"]);
    tags::save(
        &mut doc,
        &body(256),
        &[
            tag("JONES", "(Jones, 2001)", "Jones|2001"),
            tag("GONE", "(Gone, 2010)", "Gone|2010"),
            tag("LEE", "(Lee, 1999)", "Lee|1999"),
        ],
    )?;

    let first = tags::prune(&mut doc, &body(256))?;
    let stored_after_first = tags::load(&doc, &body(256))?;
    let second = tags::prune(&mut doc, &body(256))?;

    assert_eq!(first, second);
    assert_eq!(stored_after_first, tags::load(&doc, &body(256))?);
    assert_eq!(first.iter().map(|t| t.key.as_str()).collect::<Vec<_>>(), vec!["JONES", "LEE"]);
    Ok(())
}

/// Keys in first-appearance order, computed without the engine's helpers.
fn scan_keys(doc: &MemoryDocument) -> Result<Vec<String>> {
    let mut keys: Vec<String> = Vec::new();
    for container in containers_in_order(doc)? {
        let content = doc.text(&container)?;
        for tag in tags::load(doc, &container)? {
            if content.contains(&tag.cite) && !keys.contains(&tag.key) {
                keys.push(tag.key);
            }
        }
    }
    Ok(keys)
}

#[test]
fn test_resync_matches_direct_scan() -> Result<()> {
    let mut doc = fixtures::sample_document(&["(C, 3) then (A, 1)", "(B, 2)", "(A, 1) (D, 4)"]);
    tags::save(&mut doc, &body(256), &[tag("C", "(C, 3)", "C|3"), tag("A", "(A, 1)", "A|1")])?;
    // Tag order, not text order, decides within one container
    tags::save(&mut doc, &body(257), &[tag("X", "(X, 9)", "X|9"), tag("B", "(B, 2)", "B|2")])?;
    tags::save(&mut doc, &body(258), &[tag("D", "(D, 4)", "D|4"), tag("A", "(A, 1)", "A|1")])?;

    let expected = scan_keys(&doc)?;
    assert_eq!(expected, vec!["C", "A", "B", "D"]);

    let keys = resync(&mut doc)?;
    assert_eq!(keys, expected);
    assert_eq!(DocumentState::load(&doc)?.bib_keys, expected);
    Ok(())
}

#[tokio::test]
async fn test_styles_without_disambiguation_keep_base_text() -> Result<()> {
    let session = memory_session(&["A ", "B "], Some(mueller_provider())).await?;
    session.set_style(zpcite_cli::style::CitationStyle::Mla).await?;

    session.cite_key(Selection::at(body(256), usize::MAX), "MUELLER1").await?;
    session.cite_key(Selection::at(body(257), usize::MAX), "MUELLER2").await?;

    assert_eq!(text(&session, body(256)).await?, "A (Müller, 2020)");
    assert_eq!(text(&session, body(257)).await?, "B (Müller, 2020)");
    assert_eq!(session.status().await?.citations, 2);
    Ok(())
}
