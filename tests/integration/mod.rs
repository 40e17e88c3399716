//! Integration test suite for zpcite
//!
//! End-to-end tests that drive the citation engine through [`Session`]s on
//! in-memory and file-backed documents, and the `zpcite` binary through
//! `assert_cmd`. No test talks to a real Zotero server; providers are mocked.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **citations**: Suffix assignment and rollback, tag pruning, key-list reconstruction
//! - **bibliography**: Target resolution, pagination and continuation pages
//! - **numbering**: Numbered citations across edits
//! - **cli**: Command-line workflows against a document file
//!
//! [`Session`]: zpcite_cli::session::Session

mod common;

mod bibliography;
mod citations;
mod cli;
mod numbering;
