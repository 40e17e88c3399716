//! Bibliography maintenance commands: `bib`, `cleanup` and `renumber`.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{CommandContext, print_render};

/// Command to re-derive the cited keys and re-render the bibliography.
#[derive(Args)]
pub struct BibCommand {}

impl BibCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli).await?;
        let session = ctx.open_session().await?;
        let report = session.update_bibliography().await?;
        if report.entries == 0 {
            println!("{}", "No citations in the document; bibliography cleared.".dimmed());
        }
        print_render(Some(&report));
        Ok(())
    }
}

/// Command to prune deleted citations and repair suffixes or numbers.
#[derive(Args)]
pub struct CleanupCommand {}

impl CleanupCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli).await?;
        let session = ctx.open_session().await?;
        let cleanup = session.cleanup().await?;

        if cleanup.keys.is_empty() {
            println!("{} Cleaned up: no citations left in the document", "✓".green());
        } else {
            println!(
                "{} Cleaned up: {} citation(s), {} rewritten",
                "✓".green(),
                cleanup.keys.len(),
                cleanup.rewritten
            );
        }
        print_render(cleanup.rendered.as_ref());
        Ok(())
    }
}

/// Command to renumber numbered citations by first appearance.
#[derive(Args)]
pub struct RenumberCommand {}

impl RenumberCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli).await?;
        let session = ctx.open_session().await?;
        let renumbering = session.renumber().await?;

        println!("{} Numbered {} source(s)", "✓".green(), renumbering.numbering.len());
        for key in renumbering.numbering.keys() {
            if let Some(n) = renumbering.numbering.number(key) {
                println!("  [{n}] {key}");
            }
        }
        print_render(renumbering.rendered.as_ref());
        Ok(())
    }
}
