//! Common utilities for CLI commands

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::CliConfig;
use crate::bibliography::RenderReport;
use crate::config::GlobalConfig;
use crate::document::{ContainerId, ContainerRef, DocumentHost, FileDocument, PageId};
use crate::provider::ZoteroProvider;
use crate::session::Session;

/// Configuration and document location shared by commands that open a
/// citation session.
#[derive(Debug)]
pub struct CommandContext {
    /// Loaded configuration with environment overrides applied
    pub config: GlobalConfig,
    /// Document file
    pub document_path: PathBuf,
}

impl CommandContext {
    /// Load and validate the configuration for `cli`.
    ///
    /// # Errors
    /// Returns an error if the configuration file cannot be parsed or is invalid
    pub async fn load(cli: &CliConfig) -> Result<Self> {
        let mut config = GlobalConfig::load_with_optional(cli.config_path.clone()).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(Self {
            config,
            document_path: cli.document_path.clone(),
        })
    }

    /// A Zotero provider, or `None` when no credentials are configured.
    pub fn provider(&self) -> Result<Option<ZoteroProvider>> {
        if !self.config.has_credentials() {
            debug!("No Zotero credentials configured");
            return Ok(None);
        }
        let credentials = self.config.credentials()?;
        let provider = ZoteroProvider::new(credentials, self.config.timeout())
            .context("Failed to create the Zotero client")?;
        Ok(Some(provider))
    }

    /// Open the document and start a session on it.
    ///
    /// # Errors
    /// Returns an error if the document file does not exist or cannot be parsed
    pub async fn open_session(&self) -> Result<Session<ZoteroProvider>> {
        let host = open_document(&self.document_path).await?;
        Ok(Session::new(host, self.provider()?)
            .with_fonts(self.config.font_range())
            .with_max_results(self.config.search.max_results))
    }
}

/// Start a document host for the JSON document at `path`.
pub async fn open_document(path: &Path) -> Result<DocumentHost> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Document {} not found. Run 'zpcite doc init' to create one.",
            path.display()
        ));
    }
    let owned = path.to_path_buf();
    DocumentHost::spawn(move || FileDocument::open(owned))
        .await
        .with_context(|| format!("Failed to open document {}", path.display()))
}

/// Container address from command-line ids.
#[must_use]
pub const fn container_ref(page: u32, container: u32) -> ContainerRef {
    ContainerRef::new(PageId(page), ContainerId(container))
}

/// Print what a bibliography render did.
pub fn print_render(report: Option<&RenderReport>) {
    let Some(report) = report else {
        println!(
            "{}",
            "No bibliography target set; run 'zpcite anchor' to choose where the bibliography goes.".dimmed()
        );
        return;
    };

    println!(
        "{} Bibliography updated: {} entr{} in {} container(s)",
        "✓".green(),
        report.entries,
        if report.entries == 1 { "y" } else { "ies" },
        report.filled.len()
    );
    for created in &report.created {
        println!("  {} continuation container {}", "+".green(), created);
    }
    if !report.unavailable.is_empty() {
        println!(
            "  {} unavailable: {}",
            "⚠".yellow(),
            report.unavailable.join(", ").yellow()
        );
    }
    if report.overflowed() {
        println!("  {} an entry is too long for its container even at the smallest font size", "⚠".yellow());
    }
}
