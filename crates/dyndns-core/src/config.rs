//! Configuration types for the agent
//!
//! This module defines all configuration structures used throughout the crate.
//! The binary builds one [`DdnsConfig`] at startup and hands it to the
//! component constructors; nothing reads the environment afterwards.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// OpenDNS resolver that answers `myip.opendns.com` with the caller's address
pub const DEFAULT_ECHO_RESOLVER: IpAddr = IpAddr::V4(Ipv4Addr::new(208, 67, 222, 222));

/// Hostname resolved against [`DEFAULT_ECHO_RESOLVER`]
pub const DEFAULT_ECHO_HOSTNAME: &str = "myip.opendns.com";

/// Default location of the run stamp file
pub const DEFAULT_STATE_PATH: &str = ".last_run";

/// Main agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Fully-qualified name of the one A record to keep in sync
    pub record_name: String,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Public IP source configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Rate limit settings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything but the essentials
    pub fn new(record_name: impl Into<String>, provider: ProviderConfig) -> Self {
        Self {
            record_name: record_name.into(),
            provider,
            ip_source: IpSourceConfig::default(),
            rate_limit: RateLimitConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.record_name.trim().is_empty() {
            return Err(crate::Error::config("Record name cannot be empty"));
        }

        self.provider.validate()?;
        self.ip_source.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// Public IP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpSourceConfig {
    /// DNS echo lookup: an A query for `hostname` sent to `resolver`
    DnsEcho {
        /// Resolver to query (never the system resolver)
        resolver: IpAddr,
        /// Hostname the resolver answers with the caller's address
        hostname: String,
    },
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            IpSourceConfig::DnsEcho { hostname, .. } => {
                if hostname.is_empty() {
                    return Err(crate::Error::config("DNS echo hostname cannot be empty"));
                }
                Ok(())
            }
        }
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        IpSourceConfig::DnsEcho {
            resolver: DEFAULT_ECHO_RESOLVER,
            hostname: DEFAULT_ECHO_HOSTNAME.to_string(),
        }
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// Zone ID holding the record
        zone_id: String,
        /// Log updates instead of sending them
        #[serde(default)]
        dry_run: bool,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare {
                api_token, zone_id, ..
            } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                if zone_id.is_empty() {
                    return Err(crate::Error::config("Cloudflare zone ID cannot be empty"));
                }
                Ok(())
            }
        }
    }
}

// Keeps the API token out of logs and panic messages
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Cloudflare {
                zone_id, dry_run, ..
            } => f
                .debug_struct("Cloudflare")
                .field("api_token", &"<REDACTED>")
                .field("zone_id", zone_id)
                .field("dry_run", dry_run)
                .finish(),
        }
    }
}

/// Rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Path of the run stamp file
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Minimum number of seconds between two runs
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            min_interval_secs: default_min_interval_secs(),
        }
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_PATH)
}

fn default_min_interval_secs() -> u64 {
    crate::rate_limit::DEFAULT_MIN_INTERVAL_SECS
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Total attempts for the record list call
    #[serde(default = "default_list_max_attempts")]
    pub list_max_attempts: usize,

    /// Backoff step in seconds; attempt `n` failing sleeps `n * step`
    #[serde(default = "default_list_backoff_step_secs")]
    pub list_backoff_step_secs: u64,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.list_max_attempts == 0 {
            return Err(crate::Error::config("list_max_attempts must be at least 1"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            list_max_attempts: default_list_max_attempts(),
            list_backoff_step_secs: default_list_backoff_step_secs(),
        }
    }
}

fn default_list_max_attempts() -> usize {
    3
}

fn default_list_backoff_step_secs() -> u64 {
    5
}
