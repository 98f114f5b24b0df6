// # DNS Provider Trait
//
// Defines the interface for reading and writing A records via provider APIs.
//
// ## Implementations
//
// - Cloudflare: `dyndns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let records = provider.list_records("home.example.com").await?;
//     for record in &records {
//         provider
//             .update_record(&record.id, "203.0.113.7".parse()?, &record.name)
//             .await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Record type handled by the agent
pub const RECORD_TYPE_A: &str = "A";

/// A DNS record as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned record ID (opaque)
    pub id: String,
    /// Record type ("A", "AAAA", "CNAME", ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record content; an IPv4 address for A records
    pub content: String,
    /// Time-to-live, where 1 means "automatic"
    #[serde(default)]
    pub ttl: u32,
    /// Whether traffic is proxied by the provider
    #[serde(default)]
    pub proxied: bool,
}

impl DnsRecord {
    /// Whether this is an A record
    pub fn is_a_record(&self) -> bool {
        self.record_type == RECORD_TYPE_A
    }
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (the engine decides what happens next)
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff (owned by `DdnsEngine`)
/// - ❌ Decide whether an update is needed (owned by `DdnsEngine`)
/// - ❌ Create or delete records
/// - ❌ Terminate the process
///
/// Every method is single-shot: one HTTP request per call.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the A records whose name equals `record_name`
    ///
    /// Filtering happens server-side; callers must still check type and
    /// name of every returned record.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DnsRecord>)`: The records in the response (possibly empty)
    /// - `Err(Error)`: Transport failure, non-200 status or malformed body
    async fn list_records(&self, record_name: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Overwrite an A record's content
    ///
    /// Sends `type=A`, the given `name` and `content`, `ttl=1` and `proxied=false`.
    ///
    /// # Returns
    ///
    /// - `Ok(DnsRecord)`: The record as returned by the provider after the update
    /// - `Err(Error)`: The update failed; nothing was changed
    async fn update_record(
        &self,
        record_id: &str,
        content: Ipv4Addr,
        name: &str,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
