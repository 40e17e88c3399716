//! The document host abstraction.
//!
//! Citations live inside text containers of a multi-page document that is
//! owned by some external host (a presentation program, or the JSON document
//! model in [`memory`]). Everything the engine needs from that host is
//! expressed by the [`DocumentProvider`] trait:
//!
//! - enumerate pages and their text containers in order
//! - read and replace a container's text
//! - read container geometry and measure content height at a font size
//! - duplicate a container onto a new page
//! - read and write per-container key/value tags and alternate text
//! - read and write page titles and document-level properties
//!
//! Host object models are generally not safe for concurrent access, so the
//! provider is owned by a single thread behind a [`DocumentHost`]; see
//! [`host`] for the hand-off.
//!
//! # Identity
//!
//! Containers are addressed by [`ContainerRef`], a `(page, container)` pair.
//! The container id is stable for the container's lifetime but only unique
//! within its page: a duplicated page may reuse the container ids of its
//! source.

pub mod host;
pub mod memory;

pub use host::DocumentHost;
pub use memory::{FileDocument, HostQuirks, MemoryDocument};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Host-assigned page identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub u32);

/// Host-assigned container identifier, unique within a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub u32);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position-independent address of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerRef {
    /// Page holding the container
    pub page: PageId,
    /// Container id within the page
    pub container: ContainerId,
}

impl ContainerRef {
    /// Build a reference from its parts.
    #[must_use]
    pub const fn new(page: PageId, container: ContainerId) -> Self {
        Self {
            page,
            container,
        }
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.page, self.container)
    }
}

/// The user's insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// The selected container
    pub container: ContainerRef,
    /// Cursor position as a char offset into the container text, if the
    /// selection has a text cursor at all
    pub cursor: Option<usize>,
}

impl Selection {
    /// A selection with a text cursor at `offset`.
    #[must_use]
    pub const fn at(container: ContainerRef, offset: usize) -> Self {
        Self {
            container,
            cursor: Some(offset),
        }
    }

    /// A selection of the container as a whole, without a text cursor.
    #[must_use]
    pub const fn container(container: ContainerRef) -> Self {
        Self {
            container,
            cursor: None,
        }
    }
}

/// Geometry and current font of a container, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerMetrics {
    /// Bounding box width
    pub width: f64,
    /// Bounding box height
    pub height: f64,
    /// Font size currently applied to the text
    pub font_size: u32,
}

/// Failure of a document host call.
#[derive(Error, Debug)]
pub enum HostError {
    /// The page does not exist.
    #[error("Page {0} not found")]
    PageNotFound(PageId),

    /// The container does not exist.
    #[error("Container {0} not found")]
    ContainerNotFound(ContainerRef),

    /// The host refused the operation.
    #[error("Host does not support '{operation}'")]
    Unsupported {
        /// Name of the refused operation
        operation: String,
    },

    /// The document could not be read from or written to its backing store.
    #[error("Failed to persist document at {path}: {reason}")]
    Persist {
        /// Backing file
        path: String,
        /// Underlying error message
        reason: String,
    },
}

/// Access to a host document.
///
/// Implementations are driven from a single thread (see [`DocumentHost`]), so
/// the trait requires neither `Send` nor `Sync`. Every method reports failure
/// as a [`HostError`]; whether a failure aborts the caller is decided by the
/// caller, see [`BestEffort`](crate::core::BestEffort).
pub trait DocumentProvider {
    /// Page ids in document order.
    fn pages(&self) -> Result<Vec<PageId>, HostError>;

    /// Text-bearing containers of `page`, in order.
    fn containers(&self, page: PageId) -> Result<Vec<ContainerRef>, HostError>;

    /// Full text of a container.
    fn text(&self, container: &ContainerRef) -> Result<String, HostError>;

    /// Replace the full text of a container.
    fn set_text(&mut self, container: &ContainerRef, text: &str) -> Result<(), HostError>;

    /// Insert `text` at char offset `offset` (clamped to the text length).
    fn insert_text(&mut self, container: &ContainerRef, offset: usize, text: &str) -> Result<(), HostError> {
        let current = self.text(container)?;
        let byte = current.char_indices().nth(offset).map_or(current.len(), |(i, _)| i);
        let mut updated = String::with_capacity(current.len() + text.len());
        updated.push_str(&current[..byte]);
        updated.push_str(text);
        updated.push_str(&current[byte..]);
        self.set_text(container, &updated)
    }

    /// Geometry and current font size.
    fn metrics(&self, container: &ContainerRef) -> Result<ContainerMetrics, HostError>;

    /// Height of the container's current text when rendered at `font_size`.
    fn content_height(&self, container: &ContainerRef, font_size: u32) -> Result<f64, HostError>;

    /// Apply a font size to the whole text of a container.
    fn set_font_size(&mut self, container: &ContainerRef, font_size: u32) -> Result<(), HostError>;

    /// Duplicate the container's page layout onto a new page appended at the
    /// end of the document, returning a new empty container with the same
    /// geometry.
    fn duplicate_container(&mut self, container: &ContainerRef) -> Result<ContainerRef, HostError>;

    /// Read a durable tag value.
    fn tag(&self, container: &ContainerRef, key: &str) -> Result<Option<String>, HostError>;

    /// Write a durable tag value.
    fn set_tag(&mut self, container: &ContainerRef, key: &str, value: &str) -> Result<(), HostError>;

    /// Read the alternate-text field.
    fn alt_text(&self, container: &ContainerRef) -> Result<Option<String>, HostError>;

    /// Write the alternate-text field.
    fn set_alt_text(&mut self, container: &ContainerRef, text: &str) -> Result<(), HostError>;

    /// Read a page title.
    fn page_title(&self, page: PageId) -> Result<Option<String>, HostError>;

    /// Write a page title.
    fn set_page_title(&mut self, page: PageId, title: &str) -> Result<(), HostError>;

    /// Read a document-level custom property.
    fn property(&self, name: &str) -> Result<Option<String>, HostError>;

    /// Write a document-level custom property (whole-value overwrite).
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), HostError>;

    /// Persist pending changes to the backing store.
    fn flush(&mut self) -> Result<(), HostError> {
        Ok(())
    }
}

/// All containers in document order: page order, then container order.
pub fn containers_in_order(doc: &dyn DocumentProvider) -> Result<Vec<ContainerRef>, HostError> {
    let mut all = Vec::new();
    for page in doc.pages()? {
        all.extend(doc.containers(page)?);
    }
    Ok(all)
}

/// Whether `container` currently exists in the document.
pub fn container_exists(doc: &dyn DocumentProvider, container: &ContainerRef) -> Result<bool, HostError> {
    if !doc.pages()?.contains(&container.page) {
        return Ok(false);
    }
    Ok(doc.containers(container.page)?.contains(container))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::sample_document;

    #[test]
    fn test_containers_in_order() {
        let doc = sample_document(&["one", "two"]);
        let all = containers_in_order(&doc).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].page < all[1].page);
    }

    #[test]
    fn test_insert_text_at_char_offset() {
        let mut doc = sample_document(&["Grüße Welt"]);
        let c = containers_in_order(&doc).unwrap()[0];

        doc.insert_text(&c, 5, "!").unwrap();
        assert_eq!(doc.text(&c).unwrap(), "Grüße! Welt");

        doc.insert_text(&c, 999, " (end)").unwrap();
        assert_eq!(doc.text(&c).unwrap(), "Grüße! Welt (end)");
    }

    #[test]
    fn test_container_exists() {
        let doc = sample_document(&["a"]);
        let c = containers_in_order(&doc).unwrap()[0];
        assert!(container_exists(&doc, &c).unwrap());
        assert!(!container_exists(&doc, &ContainerRef::new(PageId(9999), ContainerId(1))).unwrap());
    }
}
