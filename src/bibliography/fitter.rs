//! Fitting bibliography entries into a container.
//!
//! [`fit`] searches for the largest number of entries that fit, and only then
//! for the largest font size: the outer loop walks the entry count down, the
//! inner loop walks the font size down. Shrinking the font is preferred over
//! moving an entry to the next container. When not even one entry fits at the
//! minimum size, one entry is written anyway and the result is flagged as
//! overflowing.

use crate::constants::{FIT_MARGIN, MIN_FONT_SIZE, PREFERRED_FONT_SIZE};
use crate::core::{BestEffort, ZpError};
use crate::document::{ContainerRef, DocumentProvider};
use tracing::{debug, warn};

/// Font sizes the fitter may use, in points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontRange {
    /// Size tried first
    pub preferred: u32,
    /// Smallest size tried
    pub min: u32,
}

impl Default for FontRange {
    fn default() -> Self {
        Self {
            preferred: PREFERRED_FONT_SIZE,
            min: MIN_FONT_SIZE,
        }
    }
}

/// Result of fitting entries into one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitOutcome {
    /// Number of leading entries written into the container
    pub placed: usize,
    /// Font size applied
    pub font_size: u32,
    /// The placed content is taller than the container
    pub overflowed: bool,
}

/// Write as many leading `entries` as fit into `container`, one per line.
pub fn fit(
    doc: &mut dyn DocumentProvider,
    container: &ContainerRef,
    entries: &[String],
    fonts: FontRange,
) -> Result<FitOutcome, ZpError> {
    let preferred = fonts.preferred.max(1);
    let min = fonts.min.clamp(1, preferred);

    if entries.is_empty() {
        doc.set_text(container, "")?;
        doc.set_font_size(container, preferred).best_effort("reset bibliography font size");
        return Ok(FitOutcome {
            placed: 0,
            font_size: preferred,
            overflowed: false,
        });
    }

    let limit = doc.metrics(container)?.height - FIT_MARGIN;

    for count in (1..=entries.len()).rev() {
        doc.set_text(container, &entries[..count].join("\n"))?;
        for size in (min..=preferred).rev() {
            doc.set_font_size(container, size).best_effort("set bibliography font size");
            match doc.content_height(container, size) {
                Ok(height) if height <= limit => {
                    debug!("Fit {} of {} entries at {}pt into {}", count, entries.len(), size, container);
                    return Ok(FitOutcome {
                        placed: count,
                        font_size: size,
                        overflowed: false,
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Could not measure {} ({}); assuming the text fits", container, e);
                    return Ok(FitOutcome {
                        placed: count,
                        font_size: size,
                        overflowed: false,
                    });
                }
            }
        }
    }

    doc.set_text(container, &entries[0])?;
    doc.set_font_size(container, min).best_effort("set bibliography font size");
    warn!("Bibliography entry does not fit into {} even at {}pt; writing it anyway", container, min);
    Ok(FitOutcome {
        placed: 1,
        font_size: min,
        overflowed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{HostError, MemoryDocument, PageId};

    fn container_with_height(height: f64) -> (MemoryDocument, ContainerRef) {
        let mut doc = MemoryDocument::new();
        let page = doc.add_page(Some("References"), "title-and-content");
        let c = doc.add_container(page, "", 1000.0, height).unwrap();
        (doc, c)
    }

    fn entries(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Entry {i}")).collect()
    }

    #[test]
    fn test_prefers_count_over_font_size() {
        // 14pt lines are 16.8pt, 10pt lines are 12pt: three lines fit at 14pt,
        // five at 10pt, within 63 - 2.
        let (mut doc, c) = container_with_height(63.0);
        let outcome = fit(&mut doc, &c, &entries(5), FontRange::default()).unwrap();
        assert_eq!(
            outcome,
            FitOutcome {
                placed: 5,
                font_size: 10,
                overflowed: false
            }
        );
        assert_eq!(doc.text(&c).unwrap().lines().count(), 5);
        assert_eq!(doc.metrics(&c).unwrap().font_size, 10);
    }

    #[test]
    fn test_keeps_preferred_size_when_everything_fits() {
        let (mut doc, c) = container_with_height(300.0);
        let outcome = fit(&mut doc, &c, &entries(3), FontRange::default()).unwrap();
        assert_eq!((outcome.placed, outcome.font_size), (3, 14));
    }

    #[test]
    fn test_reduces_count_when_min_size_is_not_enough() {
        let (mut doc, c) = container_with_height(63.0);
        let outcome = fit(&mut doc, &c, &entries(8), FontRange::default()).unwrap();
        assert_eq!((outcome.placed, outcome.font_size), (5, 10));
        assert_eq!(doc.text(&c).unwrap(), entries(5).join("\n"));
    }

    #[test]
    fn test_overflow_floor_places_one_entry() {
        let (mut doc, c) = container_with_height(5.0);
        let outcome = fit(&mut doc, &c, &entries(4), FontRange::default()).unwrap();
        assert_eq!(
            outcome,
            FitOutcome {
                placed: 1,
                font_size: 10,
                overflowed: true
            }
        );
        assert_eq!(doc.text(&c).unwrap(), "Entry 1");
    }

    #[test]
    fn test_empty_entries_clear_container() {
        let (mut doc, c) = container_with_height(100.0);
        doc.set_text(&c, "old bibliography").unwrap();
        let outcome = fit(&mut doc, &c, &[], FontRange::default()).unwrap();
        assert_eq!((outcome.placed, outcome.font_size), (0, 14));
        assert_eq!(doc.text(&c).unwrap(), "");
    }

    #[test]
    fn test_missing_container_is_an_error() {
        let (mut doc, _) = container_with_height(100.0);
        let missing = ContainerRef::new(PageId(999), crate::document::ContainerId(1));
        let result = fit(&mut doc, &missing, &entries(1), FontRange::default());
        assert!(matches!(result, Err(ZpError::Host(HostError::PageNotFound(_)))));
    }
}
