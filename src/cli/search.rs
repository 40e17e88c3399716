//! Search the citation library.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::CommandContext;

/// Command to search the Zotero library by author, title or year.
///
/// ```bash
/// zpcite search "smith 2019" --limit 5
/// ```
#[derive(Args)]
pub struct SearchCommand {
    /// Search terms
    query: String,

    /// Maximum number of results (defaults to the configured limit)
    #[arg(short, long)]
    limit: Option<usize>,
}

impl SearchCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli).await?;
        let mut session = ctx.open_session().await?;
        if let Some(limit) = self.limit {
            session = session.with_max_results(limit.max(1));
        }

        let Some(results) = session.search(&self.query).await? else {
            return Ok(());
        };
        if results.is_empty() {
            println!("{}", "No matching items.".dimmed());
            return Ok(());
        }
        for item in &results {
            println!("{}  {}", item.key.bold(), item.summary());
        }
        println!("\n{} item(s)", results.len());
        Ok(())
    }
}
