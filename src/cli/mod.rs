//! Command-line interface for zpcite.
//!
//! The `zpcite` binary drives the citation engine against a JSON document
//! file (see [`crate::document::memory`]). Each subcommand lives in its own
//! module with its own argument structure and execution logic.
//!
//! # Available Commands
//!
//! ## Document
//! - `doc init` - Create a document file with empty pages
//! - `doc show` - Print pages, containers, text, tags and markers
//!
//! ## Citations
//! - `cite` - Insert a citation at a position in a container
//! - `cleanup` - Prune deleted citations and re-plan suffixes or numbers
//! - `renumber` - Renumber numbered-style citations
//! - `style` - Show or set the document's citation style
//! - `search` - Search the citation library
//!
//! ## Bibliography
//! - `anchor` - Choose the container that holds the bibliography
//! - `bib` - Re-render the bibliography
//! - `status` - One-line summary of style, citations and target
//!
//! ## Configuration
//! - `config` - Manage `~/.zpcite/config.toml`
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug logging
//! - `--quiet` - Disable logging
//! - `--config <PATH>` - Use an alternate configuration file
//! - `--document <PATH>` - Document file to operate on (default `document.json`)
//!
//! # Examples
//!
//! ```bash
//! zpcite doc init --pages 3
//! zpcite config set --api-key KEY --library-id 123456
//! zpcite anchor --page 258 --container 2
//! zpcite cite ABCD2345 --page 256 --container 2
//! zpcite status
//! ```

mod anchor;
mod bib;
mod cite;
pub mod common;
mod config;
mod doc;
mod search;
mod style;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default document file, relative to the working directory.
pub const DEFAULT_DOCUMENT: &str = "document.json";

/// Runtime settings derived from the global flags.
///
/// Passed explicitly to every command instead of going through the process
/// environment, so tests can run commands side by side.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log level for the `zpcite_cli` target, `None` when logging is off.
    pub log_level: Option<String>,
    /// Alternate configuration file.
    pub config_path: Option<PathBuf>,
    /// Document file to operate on.
    pub document_path: PathBuf,
}

/// Main CLI structure for zpcite.
#[derive(Parser)]
#[command(
    name = "zpcite",
    about = "Citation annotation and bibliography pagination for multi-page documents",
    version,
    long_about = "zpcite keeps author-year or numbered citations inside document text in sync \
                  with a paginated bibliography backed by a Zotero library."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress log output.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to an alternate configuration file.
    ///
    /// Takes precedence over `ZPCITE_CONFIG_PATH` and the default location.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Document file to operate on.
    #[arg(short, long, global = true, value_name = "PATH", default_value = DEFAULT_DOCUMENT)]
    document: PathBuf,
}

/// Available zpcite subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create or inspect the document file
    Doc(doc::DocCommand),

    /// Insert a citation into a container
    Cite(cite::CiteCommand),

    /// Set the bibliography target container
    Anchor(anchor::AnchorCommand),

    /// Update the bibliography
    Bib(bib::BibCommand),

    /// Prune deleted citations, re-plan suffixes or numbers and re-render
    Cleanup(bib::CleanupCommand),

    /// Renumber numbered citations by first appearance
    Renumber(bib::RenumberCommand),

    /// Show or set the citation style
    Style(style::StyleCommand),

    /// Show style, citation count and bibliography target
    Status(style::StatusCommand),

    /// Search the citation library
    Search(search::SearchCommand),

    /// Manage the zpcite configuration file
    Config(config::ConfigCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    ///
    /// `--verbose` selects `debug`, `--quiet` turns logging off, and the
    /// default is `info`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
            document_path: self.document.clone(),
        }
    }

    /// Execute the command with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Doc(cmd) => cmd.execute(&config).await,
            Commands::Cite(cmd) => cmd.execute(&config).await,
            Commands::Anchor(cmd) => cmd.execute(&config).await,
            Commands::Bib(cmd) => cmd.execute(&config).await,
            Commands::Cleanup(cmd) => cmd.execute(&config).await,
            Commands::Renumber(cmd) => cmd.execute(&config).await,
            Commands::Style(cmd) => cmd.execute(&config).await,
            Commands::Status(cmd) => cmd.execute(&config).await,
            Commands::Search(cmd) => cmd.execute(&config).await,
            Commands::Config(cmd) => cmd.execute(config.config_path).await,
        }
    }
}
