// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for the agent.
//
// ## Behavior
//
// - ✅ One HTTP request per call (list or update)
// - ✅ Full error propagation to the engine (engine owns retry and backoff)
// - ✅ HTTP timeout configured (10 seconds)
// - ✅ Status-specific error messages (401/403, 404, 409, 429, 5xx)
// - ✅ Dry-run mode: lists for real, logs the update instead of sending it
// - ❌ NO retry logic (owned by DdnsEngine)
// - ❌ NO record creation or deletion
//
// ## Security Requirements
//
// - API token NEVER appears in logs or error messages
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=A&name=...`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use dyndns_core::config::ProviderConfig;
use dyndns_core::traits::{DnsProvider, DnsRecord};
use dyndns_core::traits::dns_provider::RECORD_TYPE_A;
use dyndns_core::{Error, Result};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// HTTP timeout for every API request
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Provider name used in logs and errors
const PROVIDER_NAME: &str = "cloudflare";

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("dyndns-agent/", env!("CARGO_PKG_VERSION"));

/// TTL value meaning "automatic" in the Cloudflare API
const TTL_AUTOMATIC: u32 = 1;

/// Body of `GET /zones/:zone_id/dns_records`
#[derive(Debug, Deserialize)]
struct ListRecordsResponse {
    #[serde(default)]
    result: Option<Vec<DnsRecord>>,
}

/// Body of `PUT /zones/:zone_id/dns_records/:record_id`
#[derive(Debug, Deserialize)]
struct UpdateRecordResponse {
    #[serde(default)]
    result: Option<DnsRecord>,
}

/// Request body for a record update
#[derive(Debug, Serialize)]
struct RecordUpdate<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: String,
    ttl: u32,
    proxied: bool,
}

impl RecordUpdate<'_> {
    /// The record as it looks once this update is applied
    fn applied_to(&self, record_id: &str) -> DnsRecord {
        DnsRecord {
            id: record_id.to_string(),
            record_type: self.record_type.to_string(),
            name: self.name.to_string(),
            content: self.content.clone(),
            ttl: self.ttl,
            proxied: self.proxied,
        }
    }
}

/// Cloudflare DNS provider
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot. Retries are owned by `DdnsEngine`.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform the list request
/// - Log the intended PUT payload
/// - **NOT** modify the record, returning it as it would look afterwards
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone ID holding the record
    zone_id: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, list for real but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permission
    /// - `zone_id`: Zone holding the managed record
    /// - `dry_run`: If true, skip PUT updates and log them instead
    ///
    /// # Errors
    ///
    /// Fails if the token or zone ID is empty, or the HTTP client cannot be built.
    pub fn new(
        api_token: impl Into<String>,
        zone_id: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        let zone_id = zone_id.into();

        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }
        if zone_id.is_empty() {
            return Err(Error::config("Cloudflare zone ID cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider from configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                zone_id,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!(
                        "Cloudflare provider running in DRY-RUN mode - no changes will be made"
                    );
                }
                Self::new(api_token.clone(), zone_id.clone(), *dry_run)
            }
        }
    }

    /// Point the provider at another API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether updates are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, self.zone_id)
    }

    fn record_url(&self, record_id: &str) -> String {
        format!("{}/{}", self.records_url(), record_id)
    }
}

/// Turn a non-200 response into a provider error
async fn status_error(response: reqwest::Response, action: &str) -> Error {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    let message = match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("{}: zone or record not found. Status: {}", action, status),
        409 => format!(
            "Conflict: Record is being updated by another process. Status: {}",
            status
        ),
        429 => format!("Rate limit exceeded. Please retry later. Status: {}", status),
        500..=599 => format!(
            "Cloudflare server error (transient): {} - {}",
            status, error_text
        ),
        _ => format!("{} failed: {} - {}", action, status, error_text),
    };

    Error::provider(PROVIDER_NAME, message)
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// List A records named `record_name`
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=home.example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn list_records(&self, record_name: &str) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Listing Cloudflare A records named {}", record_name);

        let response = self
            .client
            .get(self.records_url())
            .bearer_auth(&self.api_token)
            .header(CONTENT_TYPE, "application/json")
            .query(&[("type", RECORD_TYPE_A), ("name", record_name)])
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        if response.status() != StatusCode::OK {
            return Err(status_error(response, "Record lookup").await);
        }

        let body: ListRecordsResponse = response.json().await.map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("Failed to parse response: {}", e))
        })?;

        Ok(body.result.unwrap_or_default())
    }

    /// Overwrite an A record
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {"type": "A", "name": "...", "content": "1.2.3.4", "ttl": 1, "proxied": false}
    /// ```
    async fn update_record(
        &self,
        record_id: &str,
        content: Ipv4Addr,
        name: &str,
    ) -> Result<DnsRecord> {
        let payload = RecordUpdate {
            record_type: RECORD_TYPE_A,
            name,
            content: content.to_string(),
            ttl: TTL_AUTOMATIC,
            proxied: false,
        };
        let url = self.record_url(record_id);

        tracing::info!(
            "Updating Cloudflare DNS record {} to {} [mode: {}]",
            record_id,
            content,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(&payload).unwrap_or_default()
            );
            return Ok(payload.applied_to(record_id));
        }

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        if response.status() != StatusCode::OK {
            return Err(status_error(response, "Record update").await);
        }

        // A 200 means the write went through, whatever the body looks like
        let body = response.text().await.map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("Failed to read response: {}", e))
        })?;
        let updated = match serde_json::from_str::<UpdateRecordResponse>(&body) {
            Ok(UpdateRecordResponse {
                result: Some(record),
            }) => record,
            _ => {
                tracing::debug!(
                    "No record in update response for {}, using the sent payload",
                    record_id
                );
                payload.applied_to(record_id)
            }
        };

        tracing::info!(
            "Cloudflare DNS record {} updated to {}",
            record_id,
            updated.content
        );
        Ok(updated)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
