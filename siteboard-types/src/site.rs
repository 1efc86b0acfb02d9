//! The site data model.
//!
//! A `Site` is one entry in the directory the user may access. Its URL,
//! after normalization, is the natural key: deduplication and favorite
//! matching both compare normalized URLs, never raw strings.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A URL normalized for identity comparison.
///
/// Normalization lowercases the URL and strips trailing slashes, so
/// `HTTPS://Contoso.com/sites/A/` and `https://contoso.com/sites/a`
/// compare equal. Equality and hashing are on the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    /// Normalizes a raw URL string.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty (or whitespace-only).
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidUrl("URL must not be empty".to_string()));
        }
        let lowered = trimmed.to_lowercase();
        // Strip trailing slashes unless that would erase the whole value.
        let stripped = lowered.trim_end_matches('/');
        let normalized = if stripped.is_empty() {
            lowered.as_str()
        } else {
            stripped
        };
        Ok(Self(normalized.to_string()))
    }

    /// Returns the normalized URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One site in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Stable identifier assigned by the directory service.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Absolute URL of the site.
    pub url: String,
    /// Optional description shown alongside the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the site content was last modified, if the service reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl Site {
    /// Creates a site, validating the identity invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier or URL is empty.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();
        let url = url.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidSite("site id must not be empty".to_string()));
        }
        if url.trim().is_empty() {
            return Err(Error::InvalidSite("site URL must not be empty".to_string()));
        }
        Ok(Self {
            id,
            title: title.into(),
            url,
            description: None,
            last_modified: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the last-modified timestamp.
    #[must_use]
    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    /// Returns the normalized form of this site's URL.
    ///
    /// The URL is non-empty by construction, so normalization cannot fail.
    #[must_use]
    pub fn normalized_url(&self) -> NormalizedUrl {
        NormalizedUrl::parse(&self.url).expect("site URL is non-empty by construction")
    }
}

/// Which retrieval path produced a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteSource {
    /// The indexed search path.
    Search,
    /// The bulk enumeration path, used as a substitute when search is
    /// unusable.
    Enumeration,
}

impl fmt::Display for SiteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteSource::Search => write!(f, "search"),
            SiteSource::Enumeration => write!(f, "enumeration"),
        }
    }
}

/// An ordered set of sites produced by one successful remote call.
///
/// Results are immutable once created; a refresh replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteQueryResult {
    /// The sites, in the order the service returned them.
    pub sites: Vec<Site>,
    /// Which retrieval path produced this result.
    pub source: SiteSource,
    /// When the remote call completed.
    pub fetched_at: DateTime<Utc>,
}

impl SiteQueryResult {
    /// Creates a result stamped with the current time.
    #[must_use]
    pub fn new(sites: Vec<Site>, source: SiteSource) -> Self {
        Self {
            sites,
            source,
            fetched_at: Utc::now(),
        }
    }

    /// Returns the number of sites in the result.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Returns true if the result contains no sites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_lowercases_and_strips_trailing_slash() {
        let a = NormalizedUrl::parse("HTTPS://Contoso.com/sites/A/").unwrap();
        let b = NormalizedUrl::parse("https://contoso.com/sites/a").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn normalization_rejects_empty() {
        assert!(NormalizedUrl::parse("").is_err());
        assert!(NormalizedUrl::parse("   ").is_err());
    }

    #[test]
    fn site_requires_id_and_url() {
        assert!(Site::new("", "Team", "https://contoso.com/sites/team").is_err());
        assert!(Site::new("site-1", "Team", "").is_err());
        assert!(Site::new("site-1", "", "https://contoso.com/sites/team").is_ok());
    }
}
