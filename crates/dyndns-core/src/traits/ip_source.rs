// # IP Source Trait
//
// Defines the interface for discovering the host's public IPv4 address.
//
// ## Implementations
//
// - DNS echo lookup (OpenDNS `myip.opendns.com`): `dyndns-ip-dns` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//     let public_ip = source.current().await?;
//     println!("public IP: {}", public_ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public IP source implementations
///
/// One call, one lookup. The result is never cached between runs.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform the network I/O needed for one lookup
///
/// ## Forbidden Capabilities
/// - ❌ Retry failed lookups (a failed lookup ends the run)
/// - ❌ Perform DNS record updates (use `DnsProvider`)
/// - ❌ Touch the run timestamp (owned by `RateLimiter`)
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The first address in the lookup answer
    /// - `Err(Error)`: Timeout, NXDOMAIN, empty answer or network failure
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Short name of the source (for logging)
    fn source_name(&self) -> &'static str;
}
