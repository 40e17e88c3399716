//! Manage the zpcite configuration file.
//!
//! The configuration file (`~/.zpcite/config.toml`) holds the Zotero API key,
//! so it is written with owner-only permissions and the key is masked
//! whenever the file is displayed.
//!
//! # Examples
//!
//! ```bash
//! zpcite config init                                   # write an example file
//! zpcite config set --api-key KEY --library-id 475425  # store credentials
//! zpcite config show                                   # print it, key masked
//! zpcite config path
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{GlobalConfig, LibraryType};

/// Command to manage the configuration file.
///
/// Defaults to `show` when no subcommand is given.
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Write an example configuration with placeholder credentials.
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Display the configuration with the API key masked.
    Show,

    /// Display the path of the configuration file.
    Path,

    /// Update individual settings.
    Set {
        /// Zotero API key
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,

        /// Numeric Zotero library id
        #[arg(long, value_name = "ID")]
        library_id: Option<String>,

        /// Library type: user or group
        #[arg(long, value_name = "TYPE")]
        library_type: Option<String>,
    },
}

impl ConfigCommand {
    /// Execute the config command against `config_path` or the resolved default.
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        match self.command {
            Some(ConfigSubcommands::Init {
                force,
            }) => Self::init(force, config_path).await,
            Some(ConfigSubcommands::Show) | None => Self::show(config_path).await,
            Some(ConfigSubcommands::Path) => Self::show_path(config_path),
            Some(ConfigSubcommands::Set {
                api_key,
                library_id,
                library_type,
            }) => Self::set(api_key, library_id, library_type, config_path).await,
        }
    }

    async fn init(force: bool, config_path: Option<PathBuf>) -> Result<()> {
        let config_path = GlobalConfig::resolve_path(config_path)?;

        if config_path.exists() && !force {
            println!("❌ Config already exists at: {}", config_path.display());
            println!("   Use --force to overwrite");
            return Ok(());
        }

        let config = GlobalConfig::init_example();
        config.save_to(&config_path).await?;

        println!("✅ Created config at: {}", config_path.display());
        println!("\n{}", "Example configuration:".bold());
        println!("{}", toml::to_string_pretty(&masked(&config))?);
        println!("{}", "Next steps:".yellow());
        println!("  1. Create an API key at https://www.zotero.org/settings/keys");
        println!("  2. Run 'zpcite config set --api-key KEY --library-id ID'");

        Ok(())
    }

    async fn show(config_path: Option<PathBuf>) -> Result<()> {
        let config = GlobalConfig::load_with_optional(config_path.clone()).await?;
        let config_path = GlobalConfig::resolve_path(config_path)?;

        println!("{}", "zpcite Configuration".bold());
        println!("Location: {}\n", config_path.display());
        println!("{}", toml::to_string_pretty(&masked(&config))?);

        if !config.has_credentials() {
            println!("{}", "Tip:".yellow());
            println!("  No Zotero credentials set. Run 'zpcite config init' or set ZOTERO_API_KEY and ZOTERO_LIBRARY_ID");
        }
        Ok(())
    }

    fn show_path(config_path: Option<PathBuf>) -> Result<()> {
        let config_path = GlobalConfig::resolve_path(config_path)?;
        println!("{}", config_path.display());
        if !config_path.exists() {
            println!("\n{}", "Note: Config file does not exist yet".yellow());
            println!("  Run 'zpcite config init' to create it");
        }
        Ok(())
    }

    async fn set(
        api_key: Option<String>,
        library_id: Option<String>,
        library_type: Option<String>,
        config_path: Option<PathBuf>,
    ) -> Result<()> {
        if api_key.is_none() && library_id.is_none() && library_type.is_none() {
            return Err(anyhow::anyhow!("Nothing to set. Pass --api-key, --library-id or --library-type."));
        }
        let mut config = GlobalConfig::load_with_optional(config_path.clone()).await?;

        if let Some(kind) = library_type {
            let kind: LibraryType = kind.parse()?;
            config.zotero.library_type = kind.to_string();
        }
        if let Some(id) = library_id {
            config.zotero.library_id = Some(id.trim().to_string());
        }
        if let Some(key) = api_key {
            config.zotero.api_key = Some(key.trim().to_string());
        }
        config.validate()?;

        let save_path = GlobalConfig::resolve_path(config_path)?;
        config.save_to(&save_path).await?;
        println!("✅ Updated config at: {}", save_path.display().to_string().green());
        Ok(())
    }
}

/// Copy of `config` with the API key replaced by a mask.
fn masked(config: &GlobalConfig) -> GlobalConfig {
    let mut shown = config.clone();
    if let Some(key) = shown.zotero.api_key.as_mut() {
        *key = mask_secret(key);
    }
    shown
}

/// Keep the last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
