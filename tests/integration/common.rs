//! Shared helpers for the integration tests.

// Not every helper is used by every test module
#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zpcite_cli::document::{
    ContainerId, ContainerRef, DocumentHost, DocumentProvider, FileDocument, MemoryDocument, PageId,
};
use zpcite_cli::session::Session;
use zpcite_cli::test_utils::{MockProvider, fixtures, init_test_logging};

/// Body container (id 2) on `page`.
pub fn body(page: u32) -> ContainerRef {
    ContainerRef::new(PageId(page), ContainerId(2))
}

/// A session on an in-memory document with one page per text.
pub async fn memory_session(texts: &[&str], provider: Option<MockProvider>) -> Result<Session<MockProvider>> {
    init_test_logging(None);
    let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
    let host = DocumentHost::spawn(move || {
        let texts: Vec<&str> = owned.iter().map(String::as_str).collect();
        Ok(fixtures::sample_document(&texts))
    })
    .await?;
    Ok(Session::new(host, provider))
}

/// Text of `container` as seen through the session.
pub async fn text(session: &Session<MockProvider>, container: ContainerRef) -> Result<String> {
    Ok(session.host().run(move |doc| doc.text(&container)).await??)
}

/// Replace the text of `container` as a user edit would.
pub async fn edit(session: &Session<MockProvider>, container: ContainerRef, new_text: &str) -> Result<()> {
    let new_text = new_text.to_string();
    session.host().run(move |doc| doc.set_text(&container, &new_text)).await??;
    Ok(())
}

/// A temporary directory holding a document file and a config file path.
pub struct TestWorkspace {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        init_test_logging(None);
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();
        Ok(Self {
            _temp_dir: temp_dir,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self) -> PathBuf {
        self.root.join("document.json")
    }

    /// Config path that does not exist unless a test writes it.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("zpcite").join("config.toml")
    }

    /// Write `doc` as the workspace document.
    pub fn write_document(&self, doc: MemoryDocument) -> Result<()> {
        FileDocument::create(self.document_path(), doc)?;
        Ok(())
    }

    /// Start a session on the workspace document file.
    pub async fn session(&self, provider: Option<MockProvider>) -> Result<Session<MockProvider>> {
        let path = self.document_path();
        let host = DocumentHost::spawn(move || FileDocument::open(path)).await?;
        Ok(Session::new(host, provider))
    }

    /// Reload the document file from disk.
    pub fn reload(&self) -> Result<MemoryDocument> {
        Ok(FileDocument::open(self.document_path())?.document().clone())
    }

    /// The `zpcite` binary, isolated from the user's config and credentials.
    pub fn zpcite(&self) -> Command {
        let mut cmd = Command::cargo_bin("zpcite").unwrap_or_else(|e| panic!("zpcite binary not built: {e}"));
        cmd.current_dir(&self.root)
            .env("ZPCITE_CONFIG_PATH", self.config_path())
            .env("NO_COLOR", "1")
            .env_remove("ZOTERO_API_KEY")
            .env_remove("ZOTERO_LIBRARY_ID")
            .env_remove("ZOTERO_LIBRARY_TYPE")
            .env_remove("RUST_LOG");
        cmd
    }
}
