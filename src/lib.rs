//! zpcite - citation annotation and bibliography pagination.
//!
//! zpcite keeps citations typed into a multi-page document in step with a
//! bibliography section rendered from a Zotero library. Citations are
//! recorded as invisible tags on the containers that hold them, so the
//! document itself is the source of truth: deleting a citation's text and
//! running cleanup is enough to drop it from the bibliography.
//!
//! # Architecture Overview
//!
//! - **Citations**: author-year text or numbered placeholders, tagged with a
//!   signature (author label + year) that groups citations needing `a`, `b`,
//!   ... suffixes ([`citation`])
//! - **Bibliography**: a target container set marked with a stable id, filled
//!   entry by entry at the largest font size that fits ([`bibliography`])
//! - **Documents**: an abstract page/container host, single-threaded and
//!   driven through a dedicated thread ([`document`])
//! - **Providers**: formatted entries, item metadata and search from Zotero
//!   ([`provider`])
//!
//! # Core Modules
//!
//! - [`session`] - User actions: insert, anchor, update, cleanup, renumber, search
//! - [`citation`] - Signatures, tag storage, suffix planning and numbering
//! - [`bibliography`] - Anchor resolution, pagination fitting and synchronization
//! - [`document`] - The document host abstraction and its JSON-file implementation
//! - [`provider`] - The citation provider trait and the Zotero Web API client
//! - [`state`] - Per-document state (style, cited keys, bibliography id)
//! - [`search`] - Search-as-you-type staleness tracking
//! - [`style`] - Supported citation styles
//! - [`config`] - User configuration and credentials
//! - [`core`] - Error types and user-facing error formatting
//! - [`cli`] - The `zpcite` command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use zpcite_cli::document::{DocumentHost, FileDocument, Selection, ContainerRef, PageId, ContainerId};
//! use zpcite_cli::provider::ZoteroProvider;
//! use zpcite_cli::config::GlobalConfig;
//! use zpcite_cli::session::Session;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut config = GlobalConfig::load().await?;
//! config.apply_env_overrides();
//! let provider = ZoteroProvider::new(config.credentials()?, config.timeout())?;
//!
//! let host = DocumentHost::spawn(|| FileDocument::open("talk.json")).await?;
//! let session = Session::new(host, Some(provider));
//!
//! session.set_anchor(ContainerRef::new(PageId(260), ContainerId(2))).await?;
//! let body = ContainerRef::new(PageId(256), ContainerId(2));
//! let insertion = session.cite_key(Selection::at(body, 0), "ABCD2345").await?;
//! println!("Inserted {}", insertion.cite);
//! # Ok(())
//! # }
//! ```

pub mod bibliography;
pub mod citation;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod document;
pub mod provider;
pub mod search;
pub mod session;
pub mod state;
pub mod style;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
