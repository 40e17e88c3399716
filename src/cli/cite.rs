//! Insert a citation.
//!
//! ```bash
//! zpcite cite ABCD2345 --page 256 --container 2           # append to the text
//! zpcite cite ABCD2345 --page 256 --container 2 --at 14   # insert at char 14
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{CommandContext, container_ref, print_render};
use crate::document::Selection;

/// Command to insert a citation of one library item.
#[derive(Args)]
pub struct CiteCommand {
    /// Item key in the citation library
    key: String,

    /// Page id of the target container
    #[arg(long)]
    page: u32,

    /// Container id on that page
    #[arg(long)]
    container: u32,

    /// Char offset to insert at (defaults to the end of the text)
    #[arg(long, value_name = "OFFSET")]
    at: Option<usize>,
}

impl CiteCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli).await?;
        let session = ctx.open_session().await?;

        let selection = Selection::at(container_ref(self.page, self.container), self.at.unwrap_or(usize::MAX));
        let insertion = session.cite_key(selection, &self.key).await?;

        println!("{} Inserted {}", "✓".green(), insertion.cite.bold());
        print_render(insertion.rendered.as_ref());
        Ok(())
    }
}
