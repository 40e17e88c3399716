//! Numbered citations across document edits.

use anyhow::Result;
use zpcite_cli::citation::numbering::{placeholder, renumber};
use zpcite_cli::document::{DocumentProvider, Selection};
use zpcite_cli::style::CitationStyle;
use zpcite_cli::test_utils::{MockProvider, fixtures};

use crate::common::{body, edit, memory_session, text};

fn numbers(numbering: &zpcite_cli::citation::Numbering) -> Vec<(String, usize)> {
    numbering.keys().map(|k| (k.to_string(), numbering.number(k).unwrap_or_default())).collect()
}

#[test]
fn test_numbers_follow_first_appearance_across_pages() -> Result<()> {
    let first = format!("Intro{} and{}", placeholder("BETA"), placeholder("ALPHA"));
    let second = format!("More{}{}", placeholder("ALPHA"), placeholder("GAMMA"));
    let mut doc = fixtures::sample_document(&[&first, &second]);

    let numbering = renumber(&mut doc)?;
    assert_eq!(
        numbers(&numbering),
        vec![("BETA".to_string(), 1), ("ALPHA".to_string(), 2), ("GAMMA".to_string(), 3)]
    );
    assert_eq!(doc.text(&body(256))?, "Intro [1] and [2]");
    assert_eq!(doc.text(&body(257))?, "More [2] [3]");

    let again = renumber(&mut doc)?;
    assert_eq!(again, numbering);
    assert_eq!(doc.text(&body(256))?, "Intro [1] and [2]");
    Ok(())
}

#[test]
fn test_reordering_renumbers_by_new_first_appearance() -> Result<()> {
    let first = format!("Intro{} and{}", placeholder("BETA"), placeholder("ALPHA"));
    let second = format!("More{}{}", placeholder("ALPHA"), placeholder("GAMMA"));
    let mut doc = fixtures::sample_document(&[&first, &second]);
    renumber(&mut doc)?;

    doc.set_text(&body(256), "Intro [2] and [1]")?;
    let numbering = renumber(&mut doc)?;

    assert_eq!(
        numbers(&numbering),
        vec![("ALPHA".to_string(), 1), ("BETA".to_string(), 2), ("GAMMA".to_string(), 3)]
    );
    assert_eq!(doc.text(&body(256))?, "Intro [1] and [2]");
    assert_eq!(doc.text(&body(257))?, "More [1] [3]");
    Ok(())
}

#[test]
fn test_reordering_within_first_appearance_keeps_numbers() -> Result<()> {
    let first = format!("A{} B{}", placeholder("ONE"), placeholder("TWO"));
    let second = format!("C{}", placeholder("ONE"));
    let mut doc = fixtures::sample_document(&[&first, &second]);
    let before = renumber(&mut doc)?;

    // A later duplicate moves, first appearances stay put
    doc.set_text(&body(257), "Moved: [1]")?;
    let after = renumber(&mut doc)?;

    assert_eq!(after, before);
    assert_eq!(doc.text(&body(256))?, "A [1] B [2]");
    assert_eq!(doc.text(&body(257))?, "Moved: [1]");
    Ok(())
}

#[tokio::test]
async fn test_session_renumbers_and_renders_numbered_bibliography() -> Result<()> {
    let provider = MockProvider::new()
        .with_entry("ALPHA", "Alpha, A. Paper.")
        .with_entry("BETA", "Beta, B. Book.");
    let session = memory_session(&["Text ", ""], Some(provider)).await?;
    session.set_style(CitationStyle::Ieee).await?;
    session.set_anchor(body(257)).await?;

    session.cite_key(Selection::at(body(256), usize::MAX), "ALPHA").await?;
    session.cite_key(Selection::at(body(256), 0), "BETA").await?;
    assert_eq!(text(&session, body(256)).await?, " [1]Text  [2]");

    edit(&session, body(256), "Text  [2] [1]").await?;
    let renumbering = session.renumber().await?;
    assert_eq!(renumbering.numbering.number("ALPHA"), Some(1));
    assert_eq!(text(&session, body(256)).await?, "Text  [1] [2]");
    assert_eq!(text(&session, body(257)).await?, "[1] Alpha, A. Paper.\n[2] Beta, B. Book.");
    Ok(())
}
