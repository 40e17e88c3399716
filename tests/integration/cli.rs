//! Command-line workflows against a document file.
//!
//! Every test runs the `zpcite` binary in its own temporary directory with
//! the configuration path pointed into it and the Zotero variables removed,
//! so no test reaches the network.

use anyhow::Result;
use predicates::prelude::*;
use serial_test::serial;
use zpcite_cli::citation::tags;
use zpcite_cli::document::DocumentProvider;
use zpcite_cli::state::DocumentState;
use zpcite_cli::style::CitationStyle;

use crate::common::{TestWorkspace, body};

#[test]
#[serial]
fn test_doc_init_and_show() -> Result<()> {
    let workspace = TestWorkspace::new()?;

    workspace
        .zpcite()
        .args(["doc", "init", "--pages", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("with 2 page(s)"));
    assert!(workspace.document_path().exists());

    workspace
        .zpcite()
        .args(["doc", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Slide 1").and(predicate::str::contains("Page 257")));

    workspace.zpcite().args(["doc", "init"]).assert().failure().stderr(predicate::str::contains("--force"));
    Ok(())
}

#[test]
#[serial]
fn test_missing_document_suggests_init() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    workspace.zpcite().arg("status").assert().failure().stderr(predicate::str::contains("zpcite doc init"));
    Ok(())
}

#[test]
#[serial]
fn test_status_and_style() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    workspace.zpcite().args(["doc", "init"]).assert().success();

    workspace
        .zpcite()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Style: APA | Citations: 0 | Bibliography target: NOT set"));

    workspace.zpcite().args(["style", "ieee"]).assert().success();
    workspace.zpcite().arg("style").assert().success().stdout(predicate::str::contains("* ieee"));
    workspace
        .zpcite()
        .args(["style", "vancouver"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("vancouver"));

    let doc = workspace.reload()?;
    assert_eq!(DocumentState::load(&doc)?.style, CitationStyle::Ieee);
    Ok(())
}

#[test]
#[serial]
fn test_numbered_citation_without_credentials() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    workspace.zpcite().args(["doc", "init", "--pages", "2"]).assert().success();
    workspace.zpcite().args(["style", "ieee"]).assert().success();

    workspace
        .zpcite()
        .args(["cite", "ABCD2345", "--page", "256", "--container", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Inserted [1]"));

    let doc = workspace.reload()?;
    assert_eq!(doc.text(&body(256))?, " [1]");
    assert_eq!(tags::load(&doc, &body(256))?[0].key, "ABCD2345");

    // Rendering needs the provider once something is cited
    workspace
        .zpcite()
        .args(["anchor", "--page", "257", "--container", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("credentials"));

    workspace
        .zpcite()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Style: IEEE | Citations: 1 | Bibliography target: set (1 container(s))"));
    Ok(())
}

#[test]
#[serial]
fn test_anchor_on_empty_document_needs_no_provider() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    workspace.zpcite().args(["doc", "init"]).assert().success();

    workspace
        .zpcite()
        .args(["anchor", "--page", "258", "--container", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing cited yet"));

    workspace
        .zpcite()
        .args(["anchor", "--page", "999", "--container", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No bibliography target selected"));
    Ok(())
}

#[test]
#[serial]
fn test_search_without_credentials_fails() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    workspace.zpcite().args(["doc", "init"]).assert().success();
    workspace.zpcite().args(["search", "smith"]).assert().failure().stderr(predicate::str::contains("credentials"));
    Ok(())
}

#[test]
#[serial]
fn test_config_set_show_and_path() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    let config_path = workspace.config_path();

    workspace
        .zpcite()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(config_path.to_string_lossy().as_ref()));

    workspace
        .zpcite()
        .args(["config", "set", "--api-key", "P9NiFoyLeZu2bZNvvuQPDWsd", "--library-id", "475425"])
        .assert()
        .success();
    assert!(config_path.exists());

    workspace
        .zpcite()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****DWsd").and(predicate::str::contains("P9NiFoy").not()));

    workspace
        .zpcite()
        .args(["config", "set", "--library-type", "team"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("library_type"));

    let explicit = workspace.root().join("other.toml");
    workspace
        .zpcite()
        .args(["--config", explicit.to_string_lossy().as_ref(), "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("other.toml"));
    Ok(())
}
