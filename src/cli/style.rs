//! `style` and `status` commands.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::open_document;
use crate::provider::ZoteroProvider;
use crate::session::Session;
use crate::style::CitationStyle;

/// Command to show or set the document's citation style.
///
/// ```bash
/// zpcite style          # show the current style and the choices
/// zpcite style ieee     # switch to numbered citations
/// ```
#[derive(Args)]
pub struct StyleCommand {
    /// Style code: apa, ieee, chicago-author-date, harvard1 or mla
    code: Option<String>,
}

impl StyleCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let host = open_document(&cli.document_path).await?;
        let session: Session<ZoteroProvider> = Session::new(host, None);

        let Some(code) = self.code else {
            let current = session.style().await?;
            for style in CitationStyle::ALL {
                let marker = if style == current { "*".green().bold() } else { " ".normal() };
                println!("{marker} {:<20} {}", style.code(), style.label());
            }
            return Ok(());
        };

        let style: CitationStyle = code.parse()?;
        session.set_style(style).await?;
        println!("{} Citation style set to {} ({})", "✓".green(), style.label(), style.code());
        Ok(())
    }
}

/// Command to print the one-line status summary.
#[derive(Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let host = open_document(&cli.document_path).await?;
        let session: Session<ZoteroProvider> = Session::new(host, None);
        println!("{}", session.status().await?);
        Ok(())
    }
}
