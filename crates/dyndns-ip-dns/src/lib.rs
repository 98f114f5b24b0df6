// # DNS Echo IP Source
//
// This crate provides the public IP source used by the agent.
//
// ## How It Works
//
// Some public resolvers answer a magic hostname with the address the query
// came from. OpenDNS does this for `myip.opendns.com`: an A query sent to
// 208.67.222.222 comes back with the caller's public IPv4 address.
//
// The query always goes to the configured resolver, never the system one,
// so local resolv.conf, split-horizon DNS or VPN resolvers cannot change
// the answer.
//
// ## Failure Handling
//
// One lookup per call. Timeouts, NXDOMAIN, empty answers and network errors
// all come back as `Error::IpSource`; the engine ends the run on it.

use async_trait::async_trait;
use dyndns_core::config::IpSourceConfig;
use dyndns_core::traits::IpSource;
use dyndns_core::{Error, Result};
use hickory_resolver::TokioResolver;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Standard DNS port
const DNS_PORT: u16 = 53;

/// Per-query timeout
const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Query attempts made by the resolver before giving up
const DEFAULT_LOOKUP_ATTEMPTS: usize = 2;

/// Public IP source backed by a DNS echo lookup
pub struct DnsEchoIpSource {
    /// Resolver bound to a single upstream nameserver
    resolver: TokioResolver,

    /// Upstream nameserver address
    nameserver: SocketAddr,

    /// Hostname to query, fully qualified
    query_name: String,
}

impl std::fmt::Debug for DnsEchoIpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsEchoIpSource")
            .field("nameserver", &self.nameserver)
            .field("query_name", &self.query_name)
            .finish()
    }
}

impl DnsEchoIpSource {
    /// Create a DNS echo source
    ///
    /// # Parameters
    ///
    /// - `nameserver`: The only nameserver queried
    /// - `hostname`: Hostname the nameserver answers with the caller's address
    /// - `timeout`: Per-query timeout
    pub fn new(nameserver: SocketAddr, hostname: &str, timeout: Duration) -> Self {
        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(&[nameserver.ip()], nameserver.port(), true),
        );

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = DEFAULT_LOOKUP_ATTEMPTS;
        // Every run must see a fresh answer
        opts.cache_size = 0;

        let resolver =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
                .with_options(opts)
                .build();

        Self {
            resolver,
            nameserver,
            query_name: fully_qualified(hostname),
        }
    }

    /// Create a source from configuration
    pub fn from_config(config: &IpSourceConfig) -> Result<Self> {
        match config {
            IpSourceConfig::DnsEcho { resolver, hostname } => {
                if hostname.is_empty() {
                    return Err(Error::config("DNS echo hostname cannot be empty"));
                }
                Ok(Self::new(
                    SocketAddr::new(*resolver, DNS_PORT),
                    hostname,
                    DEFAULT_LOOKUP_TIMEOUT,
                ))
            }
        }
    }

    /// Nameserver this source queries
    pub fn nameserver(&self) -> SocketAddr {
        self.nameserver
    }

    /// Fully-qualified name this source queries
    pub fn query_name(&self) -> &str {
        &self.query_name
    }
}

/// Append the root label so no search domain is ever tried
fn fully_qualified(hostname: &str) -> String {
    if hostname.ends_with('.') {
        hostname.to_string()
    } else {
        format!("{}.", hostname)
    }
}

#[async_trait]
impl IpSource for DnsEchoIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        tracing::debug!(
            "Resolving {} via {}",
            self.query_name,
            self.nameserver
        );

        let lookup = self
            .resolver
            .ipv4_lookup(self.query_name.as_str())
            .await
            .map_err(|e| {
                Error::ip_source(format!(
                    "Failed to resolve {} via {}: {}",
                    self.query_name, self.nameserver, e
                ))
            })?;

        lookup.iter().next().map(|answer| answer.0).ok_or_else(|| {
            Error::ip_source(format!(
                "Empty answer for {} from {}",
                self.query_name, self.nameserver
            ))
        })
    }

    fn source_name(&self) -> &'static str {
        "dns-echo"
    }
}
