// # dyndns-agent
//
// Single-pass dynamic DNS agent. Meant to be started by cron or a systemd
// timer: every invocation performs at most one reconciliation and exits.
//
// This binary is a thin integration layer:
// 1. Read configuration from environment variables
// 2. Initialize logging
// 3. Build the IP source, provider and run stamp store
// 4. Run the engine once and map the result to an exit code
//
// All reconciliation logic lives in dyndns-core.
//
// ## Configuration
//
// ### Required
// - `CLOUDFLARE_API_TOKEN`: API token with DNS edit permission on the zone
// - `CLOUDFLARE_ZONE_ID`: Zone holding the record
// - `CLOUDFLARE_RECORD_NAME`: Fully-qualified A record to keep current
//
// ### Optional
// - `DDNS_STATE_FILE`: Run stamp file (default `.last_run`)
// - `DDNS_MIN_INTERVAL_SECS`: Minimum seconds between runs (default 55)
// - `DDNS_MODE`: `live` (default) or `dry-run`
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `DDNS_LOG_FILE`: Log file (default `cloudflare-ddns.log`)
// - `DDNS_LOG_MAX_BYTES`: Rotation threshold (default 10 MiB, 0 disables)
// - `DDNS_LOG_BACKUPS`: Rotated files kept (default 3, at least 1)
//
// ## Exit codes
//
// - 0: Run completed, including rate-limited runs and soft failures
// - 1: Configuration or startup error
// - 2: Runtime error (record listing exhausted its retries, stamp file unusable)
//
// ## Example
//
// ```bash
// export CLOUDFLARE_API_TOKEN=...
// export CLOUDFLARE_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export CLOUDFLARE_RECORD_NAME=home.example.com
//
// * * * * * /usr/local/bin/dyndns-agent
// ```

mod logging;

use anyhow::{Context, Result, anyhow};
use dyndns_core::{
    DdnsConfig, DdnsEngine, FileRunStampStore, ProviderConfig, RateLimitConfig, RunOutcome,
};
use dyndns_ip_dns::DnsEchoIpSource;
use dyndns_provider_cloudflare::CloudflareProvider;
use logging::LogSettings;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{Level, error, info};

/// Exit codes for the possible ends of a run
///
/// These codes follow systemd conventions:
/// - 0: Run completed
/// - 1: Configuration or startup error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Run completed (possibly rate limited or with soft failures)
    Completed = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (fatal failure during the run)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Upper bound for `DDNS_MIN_INTERVAL_SECS`
const MAX_MIN_INTERVAL_SECS: u64 = 86_400;

/// Application configuration
struct Config {
    api_token: String,
    zone_id: String,
    record_name: String,
    state_file: PathBuf,
    min_interval_secs: u64,
    mode: String,
    log_level: String,
    log_file: PathBuf,
    log_max_bytes: u64,
    log_backups: usize,
}

// Keeps the API token out of logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("record_name", &self.record_name)
            .field("state_file", &self.state_file)
            .field("min_interval_secs", &self.min_interval_secs)
            .field("mode", &self.mode)
            .field("log_level", &self.log_level)
            .field("log_file", &self.log_file)
            .field("log_max_bytes", &self.log_max_bytes)
            .field("log_backups", &self.log_backups)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any name → value lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| {
                anyhow!(
                    "{} is required. Set it via: export {}=...",
                    name,
                    name
                )
            })
        };

        Ok(Self {
            api_token: required("CLOUDFLARE_API_TOKEN")?,
            zone_id: required("CLOUDFLARE_ZONE_ID")?,
            record_name: required("CLOUDFLARE_RECORD_NAME")?,
            state_file: lookup("DDNS_STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(dyndns_core::config::DEFAULT_STATE_PATH)),
            min_interval_secs: parse_or(
                &lookup,
                "DDNS_MIN_INTERVAL_SECS",
                dyndns_core::rate_limit::DEFAULT_MIN_INTERVAL_SECS,
            )?,
            mode: lookup("DDNS_MODE").unwrap_or_else(|| "live".to_string()),
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_file: lookup("DDNS_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(logging::DEFAULT_LOG_FILE)),
            log_max_bytes: parse_or(&lookup, "DDNS_LOG_MAX_BYTES", logging::DEFAULT_LOG_MAX_BYTES)?,
            log_backups: parse_or(&lookup, "DDNS_LOG_BACKUPS", logging::DEFAULT_LOG_BACKUPS)?,
        })
    }

    /// Validate the configuration
    ///
    /// Catches the common mistakes before any network call: missing or
    /// placeholder credentials, malformed record names, out-of-range numbers
    /// and unknown enumerations.
    fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            anyhow::bail!(
                "CLOUDFLARE_API_TOKEN is required. \
                Set it via: export CLOUDFLARE_API_TOKEN=your_token"
            );
        }

        // Cloudflare API tokens are 40 characters
        if self.api_token.len() < 20 {
            anyhow::bail!(
                "CLOUDFLARE_API_TOKEN appears too short ({} chars). \
                Cloudflare tokens are typically 40 characters. \
                Verify your token is correct.",
                self.api_token.len()
            );
        }

        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
            || token_lower == "token"
        {
            anyhow::bail!(
                "CLOUDFLARE_API_TOKEN appears to be a placeholder. \
                Use an actual API token from the Cloudflare dashboard."
            );
        }

        if self.zone_id.is_empty() {
            anyhow::bail!("CLOUDFLARE_ZONE_ID cannot be empty");
        }

        if !self.zone_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            anyhow::bail!(
                "CLOUDFLARE_ZONE_ID must be alphanumeric. Got: '{}'",
                self.zone_id
            );
        }

        validate_record_name(&self.record_name)
            .context("CLOUDFLARE_RECORD_NAME is not a valid record name")?;

        if self.state_file.as_os_str().is_empty() {
            anyhow::bail!("DDNS_STATE_FILE cannot be empty");
        }

        if !(1..=MAX_MIN_INTERVAL_SECS).contains(&self.min_interval_secs) {
            anyhow::bail!(
                "DDNS_MIN_INTERVAL_SECS must be between 1 and {} seconds. Got: {}",
                MAX_MIN_INTERVAL_SECS,
                self.min_interval_secs
            );
        }

        match self.mode.as_str() {
            "live" | "dry-run" => {}
            _ => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        if self.log_file.as_os_str().is_empty() {
            anyhow::bail!("DDNS_LOG_FILE cannot be empty");
        }

        if self.log_backups == 0 {
            anyhow::bail!("DDNS_LOG_BACKUPS must be at least 1");
        }

        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        self.mode == "dry-run"
    }

    /// Core configuration for the engine and its components
    fn to_ddns_config(&self) -> DdnsConfig {
        let mut config = DdnsConfig::new(
            normalize_record_name(&self.record_name),
            ProviderConfig::Cloudflare {
                api_token: self.api_token.clone(),
                zone_id: self.zone_id.clone(),
                dry_run: self.is_dry_run(),
            },
        );
        config.rate_limit = RateLimitConfig {
            state_path: self.state_file.clone(),
            min_interval_secs: self.min_interval_secs,
        };
        config
    }

    fn log_settings(&self) -> LogSettings {
        LogSettings {
            level: Level::from_str(&self.log_level).unwrap_or(Level::INFO),
            file: self.log_file.clone(),
            max_bytes: self.log_max_bytes,
            backups: self.log_backups,
        }
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset
fn parse_or<T>(lookup: impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} must be a number. Got: '{}' ({})", name, raw, e)),
    }
}

/// Record name with at most one trailing root dot removed
fn normalize_record_name(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Validate a DNS record name
///
/// Only structural checks: record names may carry underscores
/// (`_dmarc`, `vpn_1`) that hostname rules would reject.
fn validate_record_name(name: &str) -> Result<()> {
    let name = normalize_record_name(name);

    if name.is_empty() {
        anyhow::bail!("Record name cannot be empty");
    }

    // RFC 1035: 253 chars max
    if name.len() > 253 {
        anyhow::bail!(
            "Record name too long: {} chars (max 253). Got: {}",
            name.len(),
            name
        );
    }

    for label in name.split('.') {
        if label.is_empty() {
            anyhow::bail!("Record name has empty label: '{}'", name);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Record label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if label.chars().any(|c| c.is_whitespace() || c.is_control()) {
            anyhow::bail!("Record label contains whitespace. Label: {:?}", label);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Flushes buffered log lines when dropped at the end of main
    let _log_guard = match logging::init(&config.log_settings()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!("Configuration loaded: {:?}", config);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_agent(&config)).into()
}

/// Build the components and perform one run
async fn run_agent(config: &Config) -> DdnsExitCode {
    let ddns_config = config.to_ddns_config();

    let engine = match build_engine(&ddns_config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to start agent: {}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    let result = engine.run_once().await;
    match &result {
        Ok(outcome) => info!("{}", summarize(outcome)),
        Err(e) => error!("Run aborted: {}", e),
    }
    exit_code_for(&result)
}

/// Map the result of a run to the process exit code
///
/// Every `RunOutcome` is a completed run, soft failures included; only an
/// error from the engine is fatal.
fn exit_code_for(result: &dyndns_core::Result<RunOutcome>) -> DdnsExitCode {
    match result {
        Ok(_) => DdnsExitCode::Completed,
        Err(_) => DdnsExitCode::RuntimeError,
    }
}

fn build_engine(config: &DdnsConfig) -> dyndns_core::Result<DdnsEngine> {
    let ip_source = DnsEchoIpSource::from_config(&config.ip_source)?;
    let provider = CloudflareProvider::from_config(&config.provider)?;
    let stamp_store = FileRunStampStore::new(&config.rate_limit.state_path);

    DdnsEngine::new(
        Box::new(ip_source),
        Box::new(provider),
        Box::new(stamp_store),
        config,
    )
}

/// One-line summary of a finished run
fn summarize(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::RateLimited { elapsed_secs } => {
            format!("Run skipped, previous run {:.0}s ago", elapsed_secs)
        }
        RunOutcome::IpUnavailable { .. } => "Run ended without a public IP".to_string(),
        RunOutcome::Reconciled {
            public_ip,
            decisions,
        } => format!(
            "Run complete for {}: {} record(s) checked, {} updated, {} failed",
            public_ip,
            decisions.len(),
            outcome.updated_count(),
            outcome.failed_update_count()
        ),
    }
}
