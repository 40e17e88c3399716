//! Required vs best-effort host calls.
//!
//! Host object models persist some attributes unreliably (container tags,
//! alternate text, font changes). A failing cosmetic write must never abort
//! the operation around it, while a failing required read or write must.
//!
//! Required calls propagate their [`HostError`] with `?`. Best-effort calls go
//! through [`BestEffort`], which logs the failure with the operation name and
//! hands back an `Option`:
//!
//! ```rust,ignore
//! use zpcite_cli::core::BestEffort;
//!
//! // Required: the caller cannot continue without the text.
//! let text = doc.text(&container)?;
//!
//! // Best effort: a host that refuses the font size still gets the entries.
//! doc.set_font_size(&container, size).best_effort("set bibliography font size");
//! ```

use crate::document::HostError;

/// Extension trait marking a host call as optional.
pub trait BestEffort<T> {
    /// Log and discard a failure, returning the value on success.
    fn best_effort(self, operation: &str) -> Option<T>;
}

impl<T> BestEffort<T> for Result<T, HostError> {
    fn best_effort(self, operation: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Best-effort host call '{}' failed: {}", operation, e);
                None
            }
        }
    }
}
