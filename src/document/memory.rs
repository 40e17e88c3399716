//! In-memory and JSON-file document model.
//!
//! [`MemoryDocument`] is a plain serde model of pages and containers that
//! implements [`DocumentProvider`]. [`FileDocument`] wraps it with a path and
//! writes it back on [`flush`](DocumentProvider::flush); it is the document
//! the `zpcite` binary operates on.
//!
//! # Measurement model
//!
//! Text is measured deterministically so pagination is reproducible:
//!
//! - average glyph width is `0.5 × font size`
//! - line height is `1.2 × font size`
//! - every `\n`-separated line wraps at `floor(width / glyph width)` chars and
//!   occupies at least one line
//!
//! # File format
//!
//! ```json
//! {
//!   "pages": [
//!     {
//!       "id": 256,
//!       "title": "Introduction",
//!       "layout": "title-and-content",
//!       "containers": [
//!         { "id": 2, "text": "As shown (Smith, 2019).", "width": 600.0, "height": 300.0,
//!           "font_size": 18, "tags": {}, "alt_text": null }
//!       ]
//!     }
//!   ],
//!   "properties": {}
//! }
//! ```

use super::{ContainerId, ContainerMetrics, ContainerRef, DocumentProvider, HostError, PageId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Id given to the first page of a new document.
const FIRST_PAGE_ID: u32 = 256;

/// Id given to the body container of a generated page.
const BODY_CONTAINER_ID: u32 = 2;

/// Default body container geometry for generated pages.
const DEFAULT_WIDTH: f64 = 600.0;
const DEFAULT_HEIGHT: f64 = 300.0;
const DEFAULT_FONT_SIZE: u32 = 18;

/// Simulated host limitations, used to exercise degraded hosts.
#[derive(Debug, Clone, Default)]
pub struct HostQuirks {
    /// Tag keys the host refuses to store (writes fail).
    pub rejected_tags: BTreeSet<String>,
    /// Alternate-text writes fail.
    pub reject_alt_text: bool,
    /// Container duplication fails.
    pub reject_duplicate: bool,
    /// Property writes report success but are lost.
    pub volatile_properties: bool,
}

/// A page of the document model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page id
    pub id: PageId,
    /// Page title text
    #[serde(default)]
    pub title: Option<String>,
    /// Layout name, copied on duplication
    #[serde(default)]
    pub layout: String,
    /// Containers in order
    #[serde(default)]
    pub containers: Vec<Container>,
}

/// A text container of the document model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    /// Container id, unique within its page
    pub id: ContainerId,
    /// Text content
    #[serde(default)]
    pub text: String,
    /// Bounding box width in points
    pub width: f64,
    /// Bounding box height in points
    pub height: f64,
    /// Font size in points
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// Durable key/value tags
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Alternate text
    #[serde(default)]
    pub alt_text: Option<String>,
}

const fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

/// In-memory document implementing [`DocumentProvider`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    /// Pages in document order
    #[serde(default)]
    pub pages: Vec<Page>,
    /// Document-level custom properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Simulated host limitations
    #[serde(skip)]
    pub quirks: HostQuirks,
}

impl MemoryDocument {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A document with `count` pages, each titled "Slide N" with one empty body container.
    #[must_use]
    pub fn with_pages(count: usize) -> Self {
        let mut doc = Self::new();
        for i in 1..=count {
            let page = doc.add_page(Some(&format!("Slide {i}")), "title-and-content");
            doc.push_container(page, "", DEFAULT_WIDTH, DEFAULT_HEIGHT);
        }
        doc
    }

    /// Append a page and return its id.
    pub fn add_page(&mut self, title: Option<&str>, layout: &str) -> PageId {
        let id = self.next_page_id();
        self.pages.push(Page {
            id,
            title: title.map(str::to_string),
            layout: layout.to_string(),
            containers: Vec::new(),
        });
        id
    }

    /// Append a container to `page`.
    pub fn add_container(
        &mut self,
        page: PageId,
        text: &str,
        width: f64,
        height: f64,
    ) -> Result<ContainerRef, HostError> {
        if !self.pages.iter().any(|p| p.id == page) {
            return Err(HostError::PageNotFound(page));
        }
        Ok(self.push_container(page, text, width, height))
    }

    fn push_container(&mut self, page: PageId, text: &str, width: f64, height: f64) -> ContainerRef {
        let Some(target) = self.pages.iter_mut().find(|p| p.id == page) else {
            return ContainerRef::new(page, ContainerId(BODY_CONTAINER_ID));
        };
        let id = target.containers.iter().map(|c| c.id.0 + 1).max().unwrap_or(BODY_CONTAINER_ID);
        target.containers.push(Container {
            id: ContainerId(id),
            text: text.to_string(),
            width,
            height,
            font_size: DEFAULT_FONT_SIZE,
            tags: BTreeMap::new(),
            alt_text: None,
        });
        ContainerRef::new(page, ContainerId(id))
    }

    fn next_page_id(&self) -> PageId {
        PageId(self.pages.iter().map(|p| p.id.0 + 1).max().unwrap_or(FIRST_PAGE_ID))
    }

    fn page(&self, id: PageId) -> Result<&Page, HostError> {
        self.pages.iter().find(|p| p.id == id).ok_or(HostError::PageNotFound(id))
    }

    fn page_mut(&mut self, id: PageId) -> Result<&mut Page, HostError> {
        self.pages.iter_mut().find(|p| p.id == id).ok_or(HostError::PageNotFound(id))
    }

    /// Look up a container.
    pub fn container(&self, r: &ContainerRef) -> Result<&Container, HostError> {
        self.page(r.page)?
            .containers
            .iter()
            .find(|c| c.id == r.container)
            .ok_or(HostError::ContainerNotFound(*r))
    }

    fn container_mut(&mut self, r: &ContainerRef) -> Result<&mut Container, HostError> {
        self.page_mut(r.page)?
            .containers
            .iter_mut()
            .find(|c| c.id == r.container)
            .ok_or(HostError::ContainerNotFound(*r))
    }
}

/// Height of `text` rendered at `font_size` in a box `width` points wide.
#[must_use]
pub fn measure_text(text: &str, width: f64, font_size: u32) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let size = f64::from(font_size);
    let glyph = 0.5 * size;
    let per_line = ((width / glyph).floor() as usize).max(1);
    let lines: usize = text.split('\n').map(|line| line.chars().count().div_ceil(per_line).max(1)).sum();
    // 1.2 × size per line, kept in integer-friendly order
    lines as f64 * size * 6.0 / 5.0
}

impl DocumentProvider for MemoryDocument {
    fn pages(&self) -> Result<Vec<PageId>, HostError> {
        Ok(self.pages.iter().map(|p| p.id).collect())
    }

    fn containers(&self, page: PageId) -> Result<Vec<ContainerRef>, HostError> {
        Ok(self.page(page)?.containers.iter().map(|c| ContainerRef::new(page, c.id)).collect())
    }

    fn text(&self, container: &ContainerRef) -> Result<String, HostError> {
        Ok(self.container(container)?.text.clone())
    }

    fn set_text(&mut self, container: &ContainerRef, text: &str) -> Result<(), HostError> {
        self.container_mut(container)?.text = text.to_string();
        Ok(())
    }

    fn metrics(&self, container: &ContainerRef) -> Result<ContainerMetrics, HostError> {
        let c = self.container(container)?;
        Ok(ContainerMetrics {
            width: c.width,
            height: c.height,
            font_size: c.font_size,
        })
    }

    fn content_height(&self, container: &ContainerRef, font_size: u32) -> Result<f64, HostError> {
        let c = self.container(container)?;
        Ok(measure_text(&c.text, c.width, font_size))
    }

    fn set_font_size(&mut self, container: &ContainerRef, font_size: u32) -> Result<(), HostError> {
        self.container_mut(container)?.font_size = font_size;
        Ok(())
    }

    fn duplicate_container(&mut self, container: &ContainerRef) -> Result<ContainerRef, HostError> {
        if self.quirks.reject_duplicate {
            return Err(HostError::Unsupported {
                operation: "duplicate_container".to_string(),
            });
        }
        let layout = self.page(container.page)?.layout.clone();
        let source = self.container(container)?;
        let (id, width, height, font_size) = (source.id, source.width, source.height, source.font_size);

        let page = self.add_page(None, &layout);
        let target = self.page_mut(page)?;
        target.containers.push(Container {
            id,
            text: String::new(),
            width,
            height,
            font_size,
            tags: BTreeMap::new(),
            alt_text: None,
        });
        Ok(ContainerRef::new(page, id))
    }

    fn tag(&self, container: &ContainerRef, key: &str) -> Result<Option<String>, HostError> {
        Ok(self.container(container)?.tags.get(key).cloned())
    }

    fn set_tag(&mut self, container: &ContainerRef, key: &str, value: &str) -> Result<(), HostError> {
        if self.quirks.rejected_tags.contains(key) {
            return Err(HostError::Unsupported {
                operation: format!("set_tag({key})"),
            });
        }
        self.container_mut(container)?.tags.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn alt_text(&self, container: &ContainerRef) -> Result<Option<String>, HostError> {
        Ok(self.container(container)?.alt_text.clone())
    }

    fn set_alt_text(&mut self, container: &ContainerRef, text: &str) -> Result<(), HostError> {
        if self.quirks.reject_alt_text {
            return Err(HostError::Unsupported {
                operation: "set_alt_text".to_string(),
            });
        }
        self.container_mut(container)?.alt_text = Some(text.to_string());
        Ok(())
    }

    fn page_title(&self, page: PageId) -> Result<Option<String>, HostError> {
        Ok(self.page(page)?.title.clone())
    }

    fn set_page_title(&mut self, page: PageId, title: &str) -> Result<(), HostError> {
        self.page_mut(page)?.title = Some(title.to_string());
        Ok(())
    }

    fn property(&self, name: &str) -> Result<Option<String>, HostError> {
        Ok(self.properties.get(name).cloned())
    }

    fn set_property(&mut self, name: &str, value: &str) -> Result<(), HostError> {
        if !self.quirks.volatile_properties {
            self.properties.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// A [`MemoryDocument`] backed by a JSON file.
#[derive(Debug)]
pub struct FileDocument {
    path: PathBuf,
    doc: MemoryDocument,
}

impl FileDocument {
    /// Load a document from `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|e| persist_error(&path, &e))?;
        let doc = serde_json::from_str(&content).map_err(|e| persist_error(&path, &e))?;
        Ok(Self {
            path,
            doc,
        })
    }

    /// Write `doc` to `path` and return the file-backed document.
    pub fn create(path: impl AsRef<Path>, doc: MemoryDocument) -> Result<Self, HostError> {
        let mut file = Self {
            path: path.as_ref().to_path_buf(),
            doc,
        };
        file.flush()?;
        Ok(file)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying document model.
    #[must_use]
    pub const fn document(&self) -> &MemoryDocument {
        &self.doc
    }
}

fn persist_error(path: &Path, error: &dyn std::fmt::Display) -> HostError {
    HostError::Persist {
        path: path.display().to_string(),
        reason: error.to_string(),
    }
}

impl DocumentProvider for FileDocument {
    fn pages(&self) -> Result<Vec<PageId>, HostError> {
        self.doc.pages()
    }

    fn containers(&self, page: PageId) -> Result<Vec<ContainerRef>, HostError> {
        self.doc.containers(page)
    }

    fn text(&self, container: &ContainerRef) -> Result<String, HostError> {
        self.doc.text(container)
    }

    fn set_text(&mut self, container: &ContainerRef, text: &str) -> Result<(), HostError> {
        self.doc.set_text(container, text)
    }

    fn metrics(&self, container: &ContainerRef) -> Result<ContainerMetrics, HostError> {
        self.doc.metrics(container)
    }

    fn content_height(&self, container: &ContainerRef, font_size: u32) -> Result<f64, HostError> {
        self.doc.content_height(container, font_size)
    }

    fn set_font_size(&mut self, container: &ContainerRef, font_size: u32) -> Result<(), HostError> {
        self.doc.set_font_size(container, font_size)
    }

    fn duplicate_container(&mut self, container: &ContainerRef) -> Result<ContainerRef, HostError> {
        self.doc.duplicate_container(container)
    }

    fn tag(&self, container: &ContainerRef, key: &str) -> Result<Option<String>, HostError> {
        self.doc.tag(container, key)
    }

    fn set_tag(&mut self, container: &ContainerRef, key: &str, value: &str) -> Result<(), HostError> {
        self.doc.set_tag(container, key, value)
    }

    fn alt_text(&self, container: &ContainerRef) -> Result<Option<String>, HostError> {
        self.doc.alt_text(container)
    }

    fn set_alt_text(&mut self, container: &ContainerRef, text: &str) -> Result<(), HostError> {
        self.doc.set_alt_text(container, text)
    }

    fn page_title(&self, page: PageId) -> Result<Option<String>, HostError> {
        self.doc.page_title(page)
    }

    fn set_page_title(&mut self, page: PageId, title: &str) -> Result<(), HostError> {
        self.doc.set_page_title(page, title)
    }

    fn property(&self, name: &str) -> Result<Option<String>, HostError> {
        self.doc.property(name)
    }

    fn set_property(&mut self, name: &str, value: &str) -> Result<(), HostError> {
        self.doc.set_property(name, value)
    }

    /// Write the document atomically: a synced temp file in the same
    /// directory is renamed over the target, so a failed save leaves the
    /// previous file intact.
    fn flush(&mut self) -> Result<(), HostError> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        std::fs::create_dir_all(&parent).map_err(|e| persist_error(&self.path, &e))?;
        let json = serde_json::to_string_pretty(&self.doc).map_err(|e| persist_error(&self.path, &e))?;

        let mut temp = NamedTempFile::new_in(&parent).map_err(|e| persist_error(&self.path, &e))?;
        temp.write_all(json.as_bytes()).map_err(|e| persist_error(&self.path, &e))?;
        temp.as_file().sync_all().map_err(|e| persist_error(&self.path, &e))?;
        temp.persist(&self.path).map_err(|e| persist_error(&self.path, &e))?;
        Ok(())
    }
}
