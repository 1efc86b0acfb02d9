//! HTTP client for the license service.
//!
//! The check request carries tenant and product identifiers only, no
//! personal data. The response is a status enum plus an optional
//! subscription-expiry hint used to bound grace eligibility.

use crate::error::LicenseUnreachable;
use crate::verdict::ProductId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use siteboard_types::TenantId;
use std::time::Duration;
use tracing::debug;

/// Configuration for the license client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseConfig {
    /// Base URL of the license service.
    pub base_url: String,
    /// Per-request timeout. Finite so the fail-open path is reachable
    /// within seconds.
    pub timeout: Duration,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            base_url: "https://licensing.siteboard.app".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Subscription status as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteLicenseStatus {
    /// Subscription is active.
    Active,
    /// Subscription lapsed or was never purchased.
    Inactive,
    /// Subscription administratively suspended.
    Suspended,
}

/// Successful response from the license check endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseCheckResponse {
    /// Reported subscription status.
    pub status: RemoteLicenseStatus,
    /// When the subscription expires, when the service knows.
    #[serde(default)]
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

/// The seam between the validator and the wire.
#[async_trait]
pub trait LicenseService: Send + Sync {
    /// Performs one remote license check.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseUnreachable`] when the check cannot be completed;
    /// the caller applies the fail-open policy.
    async fn check(
        &self,
        tenant_id: &TenantId,
        product_id: &ProductId,
    ) -> Result<LicenseCheckResponse, LicenseUnreachable>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest<'a> {
    tenant_id: &'a str,
    product_id: &'a str,
}

/// Reqwest-backed license client.
pub struct HttpLicenseClient {
    config: LicenseConfig,
    client: Client,
}

impl HttpLicenseClient {
    /// Creates a client from configuration.
    #[must_use]
    pub fn new(config: LicenseConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to create HTTP client");
        Self { config, client }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LicenseConfig {
        &self.config
    }
}

#[async_trait]
impl LicenseService for HttpLicenseClient {
    async fn check(
        &self,
        tenant_id: &TenantId,
        product_id: &ProductId,
    ) -> Result<LicenseCheckResponse, LicenseUnreachable> {
        let url = format!("{}/v1/licenses/check", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .json(&CheckRequest {
                tenant_id: tenant_id.as_str(),
                product_id: product_id.as_str(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LicenseUnreachable::Http(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: LicenseCheckResponse = serde_json::from_str(&body)
            .map_err(|e| LicenseUnreachable::Malformed(e.to_string()))?;
        debug!(%tenant_id, %product_id, status = ?parsed.status, "license check completed");
        Ok(parsed)
    }
}
