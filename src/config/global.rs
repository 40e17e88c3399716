//! Global configuration management for zpcite.
//!
//! This module handles the user configuration file (`~/.zpcite/config.toml`)
//! which stores the Zotero credentials and a few layout and search defaults.
//! The file holds an API key, so it is never part of a document and is
//! written with owner-only permissions.
//!
//! # Configuration File Location
//!
//! - **Unix/macOS**: `~/.zpcite/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\zpcite\config.toml`
//!
//! The location can be overridden with the `ZPCITE_CONFIG_PATH` environment
//! variable or the global `--config` flag.
//!
//! # File Format
//!
//! ```toml
//! [zotero]
//! api_key = "P9NiFoyLeZu2bZNvvuQPDWsd"
//! library_id = "475425"
//! library_type = "user"   # or "group"
//!
//! [layout]
//! preferred_font_size = 14
//! min_font_size = 10
//!
//! [search]
//! max_results = 50
//! timeout_secs = 15
//! ```
//!
//! # Credential Resolution Priority
//!
//! 1. Built-in defaults
//! 2. Values from the configuration file
//! 3. Non-empty `ZOTERO_API_KEY`, `ZOTERO_LIBRARY_ID` and `ZOTERO_LIBRARY_TYPE`
//!    environment variables
//!
//! # Examples
//!
//! ```rust,no_run
//! use zpcite_cli::config::GlobalConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut config = GlobalConfig::load().await?;
//! config.apply_env_overrides();
//! let credentials = config.credentials()?;
//! println!("Using library {}", credentials.library_id);
//! # Ok(())
//! # }
//! ```

use crate::bibliography::fitter::FontRange;
use crate::constants::{DEFAULT_MAX_RESULTS, HTTP_TIMEOUT, MIN_FONT_SIZE, PREFERRED_FONT_SIZE};
use crate::core::ZpError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::fs;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "ZPCITE_CONFIG_PATH";
/// Environment variable overriding the Zotero API key.
pub const ENV_API_KEY: &str = "ZOTERO_API_KEY";
/// Environment variable overriding the Zotero library id.
pub const ENV_LIBRARY_ID: &str = "ZOTERO_LIBRARY_ID";
/// Environment variable overriding the Zotero library type.
pub const ENV_LIBRARY_TYPE: &str = "ZOTERO_LIBRARY_TYPE";

/// Kind of Zotero library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LibraryType {
    /// A personal library
    #[default]
    User,
    /// A group library
    Group,
}

impl LibraryType {
    /// Path segment used by the Zotero Web API (`users` or `groups`).
    #[must_use]
    pub const fn api_segment(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Group => "groups",
        }
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Group => "group",
        })
    }
}

impl FromStr for LibraryType {
    type Err = ZpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            other => Err(ZpError::config(format!("library_type must be 'user' or 'group', got '{other}'"))),
        }
    }
}

/// Validated credentials for the Zotero Web API.
#[derive(Clone, PartialEq, Eq)]
pub struct ZoteroCredentials {
    /// API key
    pub api_key: String,
    /// Numeric library id
    pub library_id: String,
    /// Library kind
    pub library_type: LibraryType,
}

impl fmt::Debug for ZoteroCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoteroCredentials")
            .field("api_key", &"<redacted>")
            .field("library_id", &self.library_id)
            .field("library_type", &self.library_type)
            .finish()
    }
}

/// `[zotero]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoteroSection {
    /// API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Library id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_id: Option<String>,
    /// `user` or `group`
    #[serde(default = "default_library_type")]
    pub library_type: String,
}

fn default_library_type() -> String {
    LibraryType::default().to_string()
}

impl Default for ZoteroSection {
    fn default() -> Self {
        Self {
            api_key: None,
            library_id: None,
            library_type: default_library_type(),
        }
    }
}

/// `[layout]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSection {
    /// Font size tried first for bibliography text
    #[serde(default = "default_preferred_font_size")]
    pub preferred_font_size: u32,
    /// Smallest font size for bibliography text
    #[serde(default = "default_min_font_size")]
    pub min_font_size: u32,
}

const fn default_preferred_font_size() -> u32 {
    PREFERRED_FONT_SIZE
}

const fn default_min_font_size() -> u32 {
    MIN_FONT_SIZE
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            preferred_font_size: PREFERRED_FONT_SIZE,
            min_font_size: MIN_FONT_SIZE,
        }
    }
}

/// `[search]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSection {
    /// Maximum number of search results
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

const fn default_timeout_secs() -> u64 {
    HTTP_TIMEOUT.as_secs()
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            timeout_secs: HTTP_TIMEOUT.as_secs(),
        }
    }
}

/// Global configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Zotero credentials
    #[serde(default)]
    pub zotero: ZoteroSection,
    /// Bibliography layout defaults
    #[serde(default)]
    pub layout: LayoutSection,
    /// Search defaults
    #[serde(default)]
    pub search: SearchSection,
}

impl GlobalConfig {
    /// Load the configuration from the resolved default location.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path`, or from the resolved default location when `None`.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load the configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save to the default location.
    pub async fn save(&self) -> Result<()> {
        let path = Self::resolve_path(None)?;
        self.save_to(&path).await
    }

    /// Save as pretty TOML to `path`, creating parent directories.
    ///
    /// On Unix the file is restricted to owner read/write since it holds the
    /// API key.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content).await.with_context(|| format!("Failed to write config to {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(path)
                .await
                .with_context(|| format!("Failed to read permissions for {}", path.display()))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)
                .await
                .with_context(|| format!("Failed to set secure permissions on {}", path.display()))?;
        }

        Ok(())
    }

    /// The platform default configuration path.
    ///
    /// - **Windows**: `%LOCALAPPDATA%\zpcite\config.toml`
    /// - **Unix/macOS**: `~/.zpcite/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("zpcite")
        } else {
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?.join(".zpcite")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Configuration path: explicit path, then `ZPCITE_CONFIG_PATH`, then the default.
    pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
            _ => Self::default_path(),
        }
    }

    /// Apply the `ZOTERO_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.zotero.api_key = Some(key);
        }
        if let Some(id) = get(ENV_LIBRARY_ID) {
            self.zotero.library_id = Some(id);
        }
        if let Some(kind) = get(ENV_LIBRARY_TYPE) {
            self.zotero.library_type = kind;
        }
    }

    /// Whether both an API key and a library id are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.zotero.api_key) && present(&self.zotero.library_id)
    }

    /// Validated Zotero credentials.
    ///
    /// # Errors
    ///
    /// - [`ZpError::MissingCredentials`] if the API key or library id is absent
    /// - [`ZpError::Config`] if the library id is not numeric or the library
    ///   type is unknown
    pub fn credentials(&self) -> Result<ZoteroCredentials, ZpError> {
        if !self.has_credentials() {
            return Err(ZpError::MissingCredentials);
        }
        let api_key = self.zotero.api_key.as_deref().unwrap_or_default().trim().to_string();
        let library_id = self.zotero.library_id.as_deref().unwrap_or_default().trim().to_string();

        if !library_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ZpError::config(format!("library_id must be numeric, got '{library_id}'")));
        }
        let library_type = self.zotero.library_type.parse()?;

        Ok(ZoteroCredentials {
            api_key,
            library_id,
            library_type,
        })
    }

    /// Validate everything except the presence of credentials.
    pub fn validate(&self) -> Result<(), ZpError> {
        if self.layout.min_font_size == 0 || self.layout.preferred_font_size == 0 {
            return Err(ZpError::config("font sizes must be at least 1"));
        }
        if self.layout.min_font_size > self.layout.preferred_font_size {
            return Err(ZpError::config(format!(
                "min_font_size ({}) must not exceed preferred_font_size ({})",
                self.layout.min_font_size, self.layout.preferred_font_size
            )));
        }
        if self.search.max_results == 0 {
            return Err(ZpError::config("max_results must be at least 1"));
        }
        if self.search.timeout_secs == 0 {
            return Err(ZpError::config("timeout_secs must be at least 1"));
        }
        if self.has_credentials() {
            self.credentials()?;
        } else {
            self.zotero.library_type.parse::<LibraryType>()?;
        }
        Ok(())
    }

    /// Font sizes for bibliography pagination.
    #[must_use]
    pub const fn font_range(&self) -> FontRange {
        FontRange {
            preferred: self.layout.preferred_font_size,
            min: self.layout.min_font_size,
        }
    }

    /// HTTP timeout for provider requests.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.search.timeout_secs)
    }

    /// Example configuration with placeholder credentials, written by `config init`.
    #[must_use]
    pub fn init_example() -> Self {
        Self {
            zotero: ZoteroSection {
                api_key: Some("YOUR_API_KEY".to_string()),
                library_id: Some("0".to_string()),
                library_type: default_library_type(),
            },
            ..Self::default()
        }
    }
}
