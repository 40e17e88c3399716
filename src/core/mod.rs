//! Core types and error handling for zpcite.
//!
//! - [`error`] - The [`ZpError`] taxonomy and user-friendly CLI reporting
//! - [`outcome`] - Explicit required vs best-effort host calls

pub mod error;
pub mod outcome;

pub use error::{ErrorContext, ErrorKind, ZpError, user_friendly_error};
pub use outcome::BestEffort;

/// Result alias used by the citation engine.
pub type Result<T, E = ZpError> = std::result::Result<T, E>;
