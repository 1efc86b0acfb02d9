//! HTTP client for the site directory service.
//!
//! Two retrieval paths against the same service:
//! - `GET /v1/sites/search`: index-backed, preferred for large
//!   directories
//! - `GET /v1/sites`: paginated bulk enumeration, followed to exhaustion
//!
//! Malformed individual records are dropped with a logged validation note
//! rather than failing the batch; a response parses successfully as long
//! as zero or more well-formed records remain.

use crate::error::{DirectoryError, DirectoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use siteboard_types::{NormalizedUrl, Site, SiteQueryResult, SiteSource};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Pages followed per enumeration before giving up.
const MAX_PAGES: usize = 50;

/// Configuration for the directory client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the directory service.
    pub base_url: String,
    /// Per-request timeout. Generous but finite, so callers' fallback
    /// logic is reachable within seconds rather than hanging.
    pub timeout: Duration,
    /// Page size requested from the enumeration endpoint.
    pub page_size: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.siteboard.app".to_string(),
            timeout: Duration::from_secs(15),
            page_size: 100,
        }
    }
}

/// Parameters for the indexed search path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteQuery {
    /// Free-text filter; empty selects all indexed records.
    pub text: Option<String>,
    /// Maximum number of records to request, when set.
    pub limit: Option<u32>,
}

impl SiteQuery {
    /// A query selecting all sites the user may access.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A free-text query.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            limit: None,
        }
    }
}

/// The seam between the cache and the wire.
///
/// The HTTP client implements this; tests substitute their own.
#[async_trait]
pub trait DirectoryFetcher: Send + Sync {
    /// Fetches sites via the indexed search path.
    async fn fetch_via_search(&self, query: &SiteQuery) -> DirectoryResult<SiteQueryResult>;

    /// Fetches sites via the bulk enumeration path.
    async fn fetch_via_enumeration(&self) -> DirectoryResult<SiteQueryResult>;
}

// ── Wire types ──────────────────────────────────────────────────

/// Common list-response envelope for both paths.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteListResponse {
    #[serde(default)]
    value: Vec<serde_json::Value>,
    #[serde(default)]
    skip_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    web_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    last_modified_date_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorInfo {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── HTTP client ─────────────────────────────────────────────────

/// Reqwest-backed directory client.
pub struct HttpDirectoryClient {
    config: DirectoryConfig,
    client: Client,
}

impl HttpDirectoryClient {
    /// Creates a client from configuration.
    #[must_use]
    pub fn new(config: DirectoryConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to create HTTP client");
        Self { config, client }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    async fn get_list(&self, url: &str, params: &[(&str, String)]) -> DirectoryResult<SiteListResponse> {
        let response = self.client.get(url).query(params).send().await?;
        if !response.status().is_success() {
            return Err(classify_failure(response).await);
        }
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| DirectoryError::Validation(format!("invalid list payload: {e}")))
    }
}

#[async_trait]
impl DirectoryFetcher for HttpDirectoryClient {
    async fn fetch_via_search(&self, query: &SiteQuery) -> DirectoryResult<SiteQueryResult> {
        let url = format!("{}/v1/sites/search", self.config.base_url);
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(text) = &query.text {
            params.push(("q", text.clone()));
        }
        params.push(("top", query.limit.unwrap_or(self.config.page_size).to_string()));

        let page = self.get_list(&url, &params).await?;
        let sites = dedup_by_url(parse_records(page.value));
        debug!(count = sites.len(), "search path returned sites");
        Ok(SiteQueryResult::new(sites, SiteSource::Search))
    }

    async fn fetch_via_enumeration(&self) -> DirectoryResult<SiteQueryResult> {
        let url = format!("{}/v1/sites", self.config.base_url);
        let mut sites = Vec::new();
        let mut skip_token: Option<String> = None;

        for page_no in 0..MAX_PAGES {
            let mut params: Vec<(&str, String)> =
                vec![("top", self.config.page_size.to_string())];
            if let Some(token) = &skip_token {
                params.push(("skipToken", token.clone()));
            }

            let page = self.get_list(&url, &params).await?;
            sites.extend(parse_records(page.value));

            match page.skip_token {
                Some(token) => skip_token = Some(token),
                None => {
                    debug!(count = sites.len(), pages = page_no + 1, "enumeration complete");
                    return Ok(SiteQueryResult::new(dedup_by_url(sites), SiteSource::Enumeration));
                }
            }
        }

        warn!(max_pages = MAX_PAGES, "enumeration truncated at page limit");
        Ok(SiteQueryResult::new(dedup_by_url(sites), SiteSource::Enumeration))
    }
}

/// Maps a non-2xx response onto the error taxonomy.
///
/// A `capabilityDisabled` error code marks the search capability as
/// disabled for the tenant regardless of status code; otherwise 401/403
/// is an authorization denial and anything else keeps its status.
async fn classify_failure(response: Response) -> DirectoryError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
        if let Some(info) = parsed.error {
            if info
                .code
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case("capabilityDisabled"))
            {
                return DirectoryError::CapabilityUnavailable;
            }
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return DirectoryError::PermissionDenied(
                    info.message.unwrap_or_else(|| status.to_string()),
                );
            }
        }
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return DirectoryError::PermissionDenied(status.to_string());
    }
    DirectoryError::Http {
        status: status.as_u16(),
    }
}

/// Converts raw records to sites, dropping malformed ones.
///
/// A record is malformed when it fails to deserialize or is missing its
/// identifier or URL. Drops are logged, never fatal.
fn parse_records(raw: Vec<serde_json::Value>) -> Vec<Site> {
    let mut sites = Vec::with_capacity(raw.len());
    for value in raw {
        let record: SiteRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "dropping undeserializable site record");
                continue;
            }
        };
        let (Some(id), Some(url)) = (record.id, record.web_url) else {
            warn!("dropping site record without id or URL");
            continue;
        };
        match Site::new(id, record.title.unwrap_or_default(), url) {
            Ok(mut site) => {
                site.description = record.description;
                site.last_modified = record.last_modified_date_time;
                sites.push(site);
            }
            Err(err) => {
                warn!(error = %err, "dropping invalid site record");
            }
        }
    }
    sites
}

/// Deduplicates by normalized URL, keeping the first occurrence.
fn dedup_by_url(sites: Vec<Site>) -> Vec<Site> {
    let mut seen: HashSet<NormalizedUrl> = HashSet::with_capacity(sites.len());
    sites
        .into_iter()
        .filter(|site| seen.insert(site.normalized_url()))
        .collect()
}
