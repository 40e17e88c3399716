//! Test utilities for zpcite
//!
//! Helpers shared by unit tests and the integration suite:
//!
//! - [`init_test_logging`] - one-time tracing setup writing to the test output
//! - [`fixtures`] - ready-made documents and item metadata
//! - [`MockProvider`] - a scripted [`CitationProvider`](crate::provider::CitationProvider)
//!
//! # Example
//!
//! ```rust,no_run
//! use zpcite_cli::test_utils::{MockProvider, fixtures};
//!
//! let doc = fixtures::sample_document(&["Intro text", "More text"]);
//! let provider = MockProvider::new()
//!     .with_item(fixtures::item("ABCD2345", &["Smith"], "2019", "On Things"), "Smith, A. (2019). On Things.");
//! ```

pub mod fixtures;
pub mod mock;

pub use mock::MockProvider;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Installs a test-writer subscriber once per process. Uses `level` when
/// given, otherwise `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=zpcite_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
