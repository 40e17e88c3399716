//! Configuration management for zpcite.
//!
//! zpcite has a single user-level configuration file holding the Zotero
//! credentials and layout/search defaults. Citation state that belongs to a
//! document (style, cited keys, bibliography target) lives in the document
//! itself, see [`crate::state`].
//!
//! # Modules
//!
//! - `global` - The user configuration file, environment overrides and validation

pub mod global;

pub use global::{GlobalConfig, LibraryType, ZoteroCredentials};
