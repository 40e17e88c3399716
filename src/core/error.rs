//! Error handling for zpcite
//!
//! This module provides the error taxonomy of the citation engine and the
//! user-friendly error reporting used by the CLI. The error system is designed
//! around two core principles:
//! 1. **Strongly-typed errors** so callers can tell a user mistake from a
//!    host failure or a broken configuration
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`ZpError`] - Enumerated error types for every failure the engine reports
//! - [`ErrorKind`] - Coarse classification used to decide how a failure is surfaced
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! # Error Categories
//!
//! - **User action**: [`ZpError::NoInsertionPoint`], [`ZpError::NoTargetSelected`]
//! - **Configuration**: [`ZpError::MissingCredentials`], [`ZpError::Config`]
//! - **Provider**: [`ZpError::ProviderTransient`] (normally recovered locally)
//! - **Integrity**: [`ZpError::AnchorIntegrity`], [`ZpError::ContainerCreationFailed`]
//! - **Corrupt state**: [`ZpError::CorruptState`] (normally recovered locally)
//! - **Host**: [`ZpError::Host`], [`ZpError::HostUnavailable`]
//!
//! Corrupt state and per-key provider failures are recovered where they occur
//! (empty state, placeholder entry). The variants exist so those recoveries can
//! be logged and tested with the same vocabulary.
//!
//! # Examples
//!
//! ```rust,no_run
//! use zpcite_cli::core::{ZpError, user_friendly_error};
//!
//! let ctx = user_friendly_error(anyhow::Error::from(ZpError::NoInsertionPoint));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use crate::document::{ContainerRef, HostError};
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for zpcite operations.
///
/// Each variant represents one failure mode of the citation engine. Use
/// [`ZpError::kind`] to classify a failure instead of matching on variants
/// when only the category matters.
#[derive(Error, Debug)]
pub enum ZpError {
    /// The current selection has no text cursor to insert a citation at.
    #[error("No text cursor found in the selected container")]
    NoInsertionPoint,

    /// No usable container was selected as bibliography target.
    #[error("No bibliography target selected")]
    NoTargetSelected,

    /// The selection names a container the document does not contain.
    #[error("Container {container} does not exist in the document")]
    UnknownContainer {
        /// The container that could not be found
        container: ContainerRef,
    },

    /// Citation provider credentials are missing.
    #[error("Citation provider credentials are not configured")]
    MissingCredentials,

    /// The configuration exists but is invalid or unreadable.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Fetching the formatted entry for one key failed.
    #[error("Failed to fetch bibliography entry for '{key}': {reason}")]
    ProviderTransient {
        /// The item key whose entry could not be fetched
        key: String,
        /// Provider error message
        reason: String,
    },

    /// The bibliography target could not be found right after it was set.
    #[error("Bibliography target could not be verified after it was set")]
    AnchorIntegrity,

    /// A continuation container for bibliography overflow could not be created.
    #[error("Failed to create a continuation container for the bibliography: {reason}")]
    ContainerCreationFailed {
        /// Host error message
        reason: String,
    },

    /// Persisted JSON (document state or a tag list) could not be parsed.
    #[error("Stored data in {location} is corrupt: {reason}")]
    CorruptState {
        /// Where the corrupt data was read from
        location: String,
        /// Parser error message
        reason: String,
    },

    /// A required document host call failed.
    #[error("Document host error: {0}")]
    Host(#[from] HostError),

    /// The document host thread has shut down.
    #[error("Document host is no longer running")]
    HostUnavailable,

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Any other failure.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// Coarse classification of [`ZpError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Surfaced to the user, operation aborted, no state mutated.
    UserAction,
    /// Missing or invalid configuration.
    Configuration,
    /// Recoverable per-key provider failure.
    ProviderTransient,
    /// The host did not keep data the operation depends on.
    Integrity,
    /// Persisted data could not be parsed.
    CorruptState,
    /// A required host call failed.
    Host,
    /// Everything else.
    Internal,
}

impl ZpError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoInsertionPoint | Self::NoTargetSelected | Self::UnknownContainer { .. } => {
                ErrorKind::UserAction
            }
            Self::MissingCredentials | Self::Config { .. } => ErrorKind::Configuration,
            Self::ProviderTransient { .. } => ErrorKind::ProviderTransient,
            Self::AnchorIntegrity | Self::ContainerCreationFailed { .. } => ErrorKind::Integrity,
            Self::CorruptState { .. } => ErrorKind::CorruptState,
            Self::Host(_) | Self::HostUnavailable => ErrorKind::Host,
            Self::IoError(_) | Self::Other { .. } => ErrorKind::Internal,
        }
    }

    /// Shorthand for [`ZpError::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Error context wrapper that provides user-friendly error information.
///
/// `ErrorContext` wraps a [`ZpError`] and adds optional details and a
/// suggestion. It is what the CLI prints when a command fails.
///
/// # Examples
///
/// ```rust,no_run
/// use zpcite_cli::core::{ErrorContext, ZpError};
///
/// let context = ErrorContext::new(ZpError::NoTargetSelected)
///     .with_suggestion("Run 'zpcite anchor --page <ID> --container <ID>' first")
///     .with_details("The bibliography is written into the target container");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying zpcite error
    pub error: ZpError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a [`ZpError`].
    #[must_use]
    pub const fn new(error: ZpError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    ///
    /// Suggestions are displayed in green in the terminal.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    ///
    /// Details are displayed in yellow in the terminal.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions.
///
/// Recognizes [`ZpError`] (directly or anywhere in the `anyhow` chain) and
/// [`std::io::Error`]; everything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(zp_error) = error.chain().find_map(|cause| cause.downcast_ref::<ZpError>()) {
        return create_error_context(zp_error);
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ZpError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check the ownership and permissions of the document and config files");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ZpError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion(
                    "Check the --document path, or create a document with 'zpcite doc init'",
                );
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ZpError::Other {
        message,
    })
}

/// Map each [`ZpError`] variant to an [`ErrorContext`] with tailored suggestions.
fn create_error_context(error: &ZpError) -> ErrorContext {
    // ZpError is not Clone (it wraps io::Error); rebuild the displayed error from its message.
    let shown = ZpError::Other {
        message: error.to_string(),
    };

    match error {
        ZpError::NoInsertionPoint => ErrorContext::new(shown)
            .with_suggestion("Place the cursor inside a text container (use --at to pick an offset) and try again"),

        ZpError::NoTargetSelected => ErrorContext::new(shown)
            .with_suggestion("Select the bibliography container with 'zpcite anchor --page <ID> --container <ID>'")
            .with_details("The bibliography is written into the target container and its continuations"),

        ZpError::UnknownContainer { .. } => ErrorContext::new(shown)
            .with_suggestion("List pages and containers with 'zpcite doc show'"),

        ZpError::MissingCredentials => ErrorContext::new(shown)
            .with_suggestion("Run 'zpcite config set --api-key <KEY> --library-id <ID>' or set ZOTERO_API_KEY and ZOTERO_LIBRARY_ID")
            .with_details("Zotero credentials are needed to look up items and format bibliography entries"),

        ZpError::Config { .. } => ErrorContext::new(shown)
            .with_suggestion("Check the configuration with 'zpcite config show'"),

        ZpError::AnchorIntegrity => ErrorContext::new(shown)
            .with_suggestion("Select the bibliography container again and retry")
            .with_details("The document host did not keep the bibliography marker"),

        ZpError::ContainerCreationFailed { .. } => ErrorContext::new(shown)
            .with_details("Entries placed before the failure remain in the document")
            .with_suggestion("Make room in the existing bibliography container or add a continuation page manually"),

        _ => match error.kind() {
            ErrorKind::Host => ErrorContext::new(shown)
                .with_suggestion("Check that the document file exists and is writable, or recreate it with 'zpcite doc init --force'"),
            ErrorKind::CorruptState => ErrorContext::new(shown)
                .with_details("Corrupt citation data is read as empty")
                .with_suggestion("Run 'zpcite cleanup' to rebuild tags and the cited key list"),
            ErrorKind::ProviderTransient => ErrorContext::new(shown)
                .with_suggestion("Check the network connection and run 'zpcite bib' again"),
            _ => ErrorContext::new(shown),
        },
    }
}
