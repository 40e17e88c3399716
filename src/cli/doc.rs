//! Create and inspect document files.
//!
//! ```bash
//! zpcite doc init --pages 4
//! zpcite doc show
//! ```

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use super::CliConfig;
use super::common::open_document;
use crate::citation::tags;
use crate::constants::BIB_GUID_TAG_KEY;
use crate::document::{DocumentProvider, FileDocument, MemoryDocument, containers_in_order};
use crate::state::DocumentState;

/// Command to create or print the document file.
#[derive(Args)]
pub struct DocCommand {
    #[command(subcommand)]
    command: DocSubcommands,
}

#[derive(Subcommand)]
enum DocSubcommands {
    /// Create a document with empty pages, each with one body container
    Init {
        /// Number of pages
        #[arg(long, default_value_t = 3)]
        pages: usize,

        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },

    /// Print pages, containers, text, citation tags and bibliography markers
    Show,
}

impl DocCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        match self.command {
            DocSubcommands::Init {
                pages,
                force,
            } => init(cli, pages, force),
            DocSubcommands::Show => show(cli).await,
        }
    }
}

fn init(cli: &CliConfig, pages: usize, force: bool) -> Result<()> {
    let path = &cli.document_path;
    if path.exists() && !force {
        return Err(anyhow::anyhow!("Document {} already exists. Use --force to overwrite.", path.display()));
    }
    FileDocument::create(path, MemoryDocument::with_pages(pages))
        .with_context(|| format!("Failed to create document {}", path.display()))?;
    println!("{} Created {} with {} page(s)", "✓".green(), path.display(), pages);
    Ok(())
}

async fn show(cli: &CliConfig) -> Result<()> {
    let host = open_document(&cli.document_path).await?;
    let listing = host.run(render_listing).await??;
    print!("{listing}");
    Ok(())
}

/// Human-readable dump of the document.
fn render_listing(doc: &mut dyn DocumentProvider) -> Result<String, crate::core::ZpError> {
    use std::fmt::Write;

    let state = DocumentState::load(doc)?;
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Style:".bold(), state.style.label());
    if !state.bib_keys.is_empty() {
        let _ = writeln!(out, "{} {}", "Cited keys:".bold(), state.bib_keys.join(", "));
    }

    let mut current_page = None;
    for container in containers_in_order(doc)? {
        if current_page != Some(container.page) {
            current_page = Some(container.page);
            let title = doc.page_title(container.page)?.unwrap_or_default();
            let _ = writeln!(out, "\n{} {} {}", "Page".cyan().bold(), container.page, title.dimmed());
        }

        let metrics = doc.metrics(&container)?;
        let _ = writeln!(
            out,
            "  {} {} ({}x{}, {}pt)",
            "Container".bold(),
            container.container,
            metrics.width,
            metrics.height,
            metrics.font_size
        );
        for line in doc.text(&container)?.lines() {
            let _ = writeln!(out, "    | {line}");
        }
        for tag in tags::load(doc, &container)? {
            let _ = writeln!(out, "    {} {} {}", "cite".green(), tag.key, tag.cite.dimmed());
        }
        if let Some(guid) = doc.tag(&container, BIB_GUID_TAG_KEY)? {
            let _ = writeln!(out, "    {} {}", "bibliography".yellow(), guid.dimmed());
        }
    }
    Ok(out)
}
