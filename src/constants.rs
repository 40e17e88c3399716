//! Global constants used throughout the zpcite codebase.
//!
//! This module contains the durable names written into host documents, font
//! size defaults for bibliography pagination, and network parameters for the
//! citation provider. Defining them centrally keeps the on-document format in
//! one place: changing any of the names below orphans data written by earlier
//! versions.

use std::time::Duration;

/// Name of the document-level custom property holding the JSON document state.
pub const DOCUMENT_STATE_PROPERTY: &str = "ZPCiteState";

/// Container tag key holding the JSON list of citation annotations.
pub const CITATION_TAG_KEY: &str = "ZP_CITES";

/// Container tag key carrying the bibliography guid marker.
pub const BIB_GUID_TAG_KEY: &str = "ZP_BIB_GUID";

/// Prefix of the human-readable alternate-text bibliography marker.
///
/// The full marker is `ZP_BIB_GUID=<guid>`.
pub const BIB_ALT_TEXT_PREFIX: &str = "ZP_BIB_GUID=";

/// Preferred bibliography font size in points.
pub const PREFERRED_FONT_SIZE: u32 = 14;

/// Smallest font size the pagination fitter may shrink to.
pub const MIN_FONT_SIZE: u32 = 10;

/// Vertical slack (in points) subtracted from a container's height before
/// deciding whether measured content fits.
pub const FIT_MARGIN: f64 = 2.0;

/// Display text used when a citation has neither author nor title.
pub const UNKNOWN_AUTHOR: &str = "o. A.";

/// Year token used when an item carries no parseable year.
pub const NO_DATE: &str = "n.d.";

/// Maximum number of search results requested from the citation provider.
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Timeout for a single HTTP request to the citation provider (15 seconds).
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Number of retries after the first failed provider request.
pub const PROVIDER_RETRIES: usize = 2;

/// Starting delay for provider retry backoff (200ms).
pub const PROVIDER_BACKOFF_START_MS: u64 = 200;

/// Maximum delay between provider retries (2 seconds).
pub const PROVIDER_BACKOFF_MAX_MS: u64 = 2_000;

/// Number of bibliography entries fetched concurrently.
pub const MAX_CONCURRENT_FETCHES: usize = 4;

/// Base URL of the Zotero Web API.
pub const ZOTERO_API_BASE: &str = "https://api.zotero.org";
