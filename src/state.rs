//! Document-level citation state.
//!
//! The state is one JSON object stored in the document property
//! [`DOCUMENT_STATE_PROPERTY`]. It is loaded, modified and saved explicitly at
//! each mutating operation boundary; nothing caches it between operations.
//! Absent or corrupt JSON reads as the default state. Keys this version does
//! not know about are carried through unchanged on save.

use crate::constants::DOCUMENT_STATE_PROPERTY;
use crate::core::ZpError;
use crate::document::{ContainerId, ContainerRef, DocumentProvider, HostError, PageId};
use crate::style::CitationStyle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Positional fast-path pointer to the bibliography target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibAnchor {
    /// Page holding the target container
    pub page_id: PageId,
    /// Target container id
    pub container_id: ContainerId,
}

impl From<ContainerRef> for BibAnchor {
    fn from(r: ContainerRef) -> Self {
        Self {
            page_id: r.page,
            container_id: r.container,
        }
    }
}

impl From<BibAnchor> for ContainerRef {
    fn from(a: BibAnchor) -> Self {
        Self::new(a.page_id, a.container_id)
    }
}

/// Citation state of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentState {
    /// Active citation style
    #[serde(default, deserialize_with = "deserialize_style_lenient")]
    pub style: CitationStyle,

    /// Cited keys, deduplicated, in first-appearance order
    #[serde(default)]
    pub bib_keys: Vec<String>,

    /// Durable identity of the bibliography target set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bib_guid: Option<String>,

    /// Fast-path pointer to the container chosen as bibliography target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bib_anchor: Option<BibAnchor>,

    /// When the bibliography was last rendered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rendered: Option<DateTime<Utc>>,

    /// Unknown keys, preserved across load/save
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn deserialize_style_lenient<'de, D>(deserializer: D) -> Result<CitationStyle, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(code) => CitationStyle::from_code_lenient(&code),
        serde_json::Value::Null => CitationStyle::default(),
        other => {
            warn!("Ignoring non-string citation style {}", other);
            CitationStyle::default()
        }
    })
}

impl DocumentState {
    /// Load the state from the document, treating absent or corrupt data as default.
    pub fn load(doc: &dyn DocumentProvider) -> Result<Self, HostError> {
        let Some(raw) = doc.property(DOCUMENT_STATE_PROPERTY)? else {
            return Ok(Self::default());
        };
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        match serde_json::from_str(&raw) {
            Ok(state) => Ok(state),
            Err(e) => {
                let corrupt = ZpError::CorruptState {
                    location: format!("document property {DOCUMENT_STATE_PROPERTY}"),
                    reason: e.to_string(),
                };
                warn!("{}; starting from an empty state", corrupt);
                Ok(Self::default())
            }
        }
    }

    /// Overwrite the stored state with this one.
    pub fn save(&self, doc: &mut dyn DocumentProvider) -> Result<(), ZpError> {
        let json = serde_json::to_string(self).map_err(|e| ZpError::Other {
            message: format!("Failed to serialize document state: {e}"),
        })?;
        doc.set_property(DOCUMENT_STATE_PROPERTY, &json)?;
        Ok(())
    }

    /// The bibliography guid, generating one on first use.
    pub fn ensure_guid(&mut self) -> String {
        self.bib_guid.get_or_insert_with(|| uuid::Uuid::new_v4().to_string()).clone()
    }
}
