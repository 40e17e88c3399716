//! Choose the bibliography target.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{CommandContext, container_ref, print_render};

/// Command to make a container the bibliography target.
///
/// The bibliography is rendered into it right away when anything is cited.
#[derive(Args)]
pub struct AnchorCommand {
    /// Page id of the container
    #[arg(long)]
    page: u32,

    /// Container id on that page
    #[arg(long)]
    container: u32,
}

impl AnchorCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli).await?;
        let session = ctx.open_session().await?;

        let anchoring = session.set_anchor(container_ref(self.page, self.container)).await?;
        println!(
            "{} Bibliography target set ({} container(s) found)",
            "✓".green(),
            anchoring.containers.len()
        );
        if anchoring.rendered.is_some() {
            print_render(anchoring.rendered.as_ref());
        } else {
            println!("{}", "Nothing cited yet.".dimmed());
        }
        Ok(())
    }
}
