//! Zotero Web API adapter.
//!
//! Formatted entries are requested as server-side rendered bibliography HTML:
//!
//! 1. `GET /{users|groups}/{id}/items?itemKey=KEY&format=bib&style=STYLE`
//! 2. `GET /{users|groups}/{id}/items/KEY?format=bib&style=STYLE`
//!
//! The first candidate that returns HTML (or `text/x-bibliography`) with
//! non-empty text wins. When neither does, the item JSON is fetched and a
//! minimal `Author (Year) Title URL` entry is built from it.
//!
//! Every request carries the `Zotero-API-Key` and `Zotero-API-Version: 3`
//! headers. Transport errors and 5xx responses are retried with exponential
//! backoff.

use super::{CitationProvider, ProviderError};
use crate::citation::ItemMetadata;
use crate::config::ZoteroCredentials;
use crate::constants::{PROVIDER_BACKOFF_MAX_MS, PROVIDER_BACKOFF_START_MS, PROVIDER_RETRIES, ZOTERO_API_BASE};
use crate::style::CitationStyle;
use regex::{Captures, Regex};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::debug;

/// Entry title used when an item has none.
const UNTITLED: &str = "[untitled]";

/// A response body with its content type.
struct Fetched {
    content_type: String,
    body: String,
}

impl Fetched {
    fn is_bibliography(&self) -> bool {
        let looks_like_json = {
            let trimmed = self.body.trim_start();
            trimmed.starts_with('{') || trimmed.starts_with('[')
        };
        (self.content_type.contains("text/html") || self.content_type.contains("text/x-bibliography"))
            && !looks_like_json
    }
}

/// Item envelope returned by the JSON endpoints.
#[derive(Deserialize)]
struct ZoteroItem {
    #[serde(default)]
    key: String,
    #[serde(default)]
    data: ItemMetadata,
}

impl ZoteroItem {
    fn into_metadata(self) -> ItemMetadata {
        let mut data = self.data;
        if data.key.is_empty() {
            data.key = self.key;
        }
        data
    }
}

/// [`CitationProvider`] backed by the Zotero Web API.
pub struct ZoteroProvider {
    client: reqwest::Client,
    base_url: String,
    credentials: ZoteroCredentials,
}

impl ZoteroProvider {
    /// Create a provider for the library described by `credentials`.
    pub fn new(credentials: ZoteroCredentials, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| ProviderError::Transport {
            url: ZOTERO_API_BASE.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            base_url: ZOTERO_API_BASE.to_string(),
            credentials,
        })
    }

    /// Use a different API root, e.g. a local test server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Root URL of the configured library.
    #[must_use]
    pub fn library_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.credentials.library_type.api_segment(),
            self.credentials.library_id
        )
    }

    async fn get_once(&self, url: &str, query: &[(&str, String)], accept: &str) -> Result<Fetched, ProviderError> {
        let transport = |e: reqwest::Error| ProviderError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .query(query)
            .header("Zotero-API-Key", &self.credentials.api_key)
            .header("Zotero-API-Version", "3")
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        debug!("HTTP GET {}: {}", status.as_u16(), url);
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let body = response.text().await.map_err(transport)?;
        Ok(Fetched {
            content_type,
            body,
        })
    }

    async fn get(&self, url: &str, query: &[(&str, String)], accept: &str) -> Result<Fetched, ProviderError> {
        let strategy = ExponentialBackoff::from_millis(PROVIDER_BACKOFF_START_MS)
            .max_delay(Duration::from_millis(PROVIDER_BACKOFF_MAX_MS))
            .factor(2)
            .take(PROVIDER_RETRIES);

        RetryIf::spawn(strategy, || self.get_once(url, query, accept), |e: &ProviderError| {
            let retry = e.is_transient();
            if retry {
                debug!("Retrying after transient provider error: {}", e);
            }
            retry
        })
        .await
    }
}

impl CitationProvider for ZoteroProvider {
    async fn fetch_formatted_entry(&self, key: &str, style: CitationStyle) -> Result<String, ProviderError> {
        let base = self.library_url();
        let accept = format!("text/x-bibliography; style={}", style.code());
        let candidates = [
            (
                format!("{base}/items"),
                vec![
                    ("itemKey", key.to_string()),
                    ("format", "bib".to_string()),
                    ("style", style.code().to_string()),
                ],
            ),
            (
                format!("{base}/items/{key}"),
                vec![("format", "bib".to_string()), ("style", style.code().to_string())],
            ),
        ];

        for (url, query) in &candidates {
            match self.get(url, query, &accept).await {
                Ok(fetched) if fetched.is_bibliography() => {
                    let text = html_to_text(&fetched.body);
                    if !text.is_empty() {
                        return Ok(text);
                    }
                }
                Ok(_) => debug!("No formatted bibliography from {}", url),
                Err(e) => debug!("Formatted bibliography request failed: {}", e),
            }
        }

        let item = self.get_item(key).await?;
        Ok(fallback_entry(&item))
    }

    async fn get_item(&self, key: &str) -> Result<ItemMetadata, ProviderError> {
        let url = format!("{}/items/{}", self.library_url(), key);
        let fetched = match self.get(&url, &[("format", "json".to_string())], "application/json").await {
            Err(ProviderError::Status {
                status: 404,
                ..
            }) => {
                return Err(ProviderError::NotFound {
                    key: key.to_string(),
                });
            }
            other => other?,
        };
        parse_item(&fetched.body, key)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ItemMetadata>, ProviderError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/items", self.library_url());
        let params = [("q", query.to_string()), ("limit", limit.to_string()), ("format", "json".to_string())];
        let fetched = self.get(&url, &params, "application/json").await?;

        let items: Vec<ZoteroItem> =
            serde_json::from_str(&fetched.body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(items.into_iter().map(ZoteroItem::into_metadata).collect())
    }
}

/// Parse a single item, or the first item of an array.
fn parse_item(body: &str, key: &str) -> Result<ItemMetadata, ProviderError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
    let value = match value {
        serde_json::Value::Array(items) => items.into_iter().next().ok_or_else(|| ProviderError::NotFound {
            key: key.to_string(),
        })?,
        other => other,
    };
    let item: ZoteroItem = serde_json::from_value(value).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
    let mut metadata = item.into_metadata();
    if metadata.key.is_empty() {
        metadata.key = key.to_string();
    }
    Ok(metadata)
}

/// Minimal entry built from item metadata: `Author (Year) Title URL`.
#[must_use]
pub fn fallback_entry(item: &ItemMetadata) -> String {
    let first = item.creators.first().and_then(|c| c.surname()).unwrap_or_default().to_string();
    let year = item.year().map(|y| format!("({y})")).unwrap_or_default();
    let title = item.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(UNTITLED).to_string();
    let url = item.url.clone().unwrap_or_default();

    [first, year, title, url].into_iter().filter(|p| !p.is_empty()).collect::<Vec<_>>().join(" ")
}

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Convert rendered bibliography HTML to plain text.
///
/// Line breaks become newlines, tags are dropped, entities are decoded and
/// whitespace before a newline is removed.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    static BREAK: OnceLock<Option<Regex>> = OnceLock::new();
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    static TRAILING_SPACE: OnceLock<Option<Regex>> = OnceLock::new();

    let mut text = html.to_string();
    if let Some(re) = cached(&BREAK, r"(?i)<br\s*/?>") {
        text = re.replace_all(&text, "\n").into_owned();
    }
    if let Some(re) = cached(&TAG, r"<[^>]+>") {
        text = re.replace_all(&text, "").into_owned();
    }
    text = unescape_entities(&text);
    if let Some(re) = cached(&TRAILING_SPACE, r"\s+\n") {
        text = re.replace_all(&text, "\n").into_owned();
    }
    text.trim().to_string()
}

/// Decode named and numeric HTML character references.
fn unescape_entities(text: &str) -> String {
    static ENTITY: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = cached(&ENTITY, r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);") else {
        return text.to_string();
    };

    re.replace_all(text, |caps: &Captures<'_>| {
        let name = &caps[1];
        let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = name.strip_prefix('#') {
            dec.parse().ok().and_then(char::from_u32)
        } else {
            match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                "ndash" => Some('\u{2013}'),
                "mdash" => Some('\u{2014}'),
                "hellip" => Some('\u{2026}'),
                _ => None,
            }
        };
        decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
    })
    .into_owned()
}
