//! The rendered bibliography section.
//!
//! - [`anchor`] - Where the bibliography lives (the target container set)
//! - [`fitter`] - Packing entries into one container
//! - [`sync`] - Re-deriving keys, fetching entries and paging them out

pub mod anchor;
pub mod fitter;
pub mod sync;

pub use anchor::{has_anchor, resolve, set_anchor};
pub use fitter::{FitOutcome, FontRange, fit};
pub use sync::{RenderReport, distribute, render, resync};
