//! Core reconciliation engine
//!
//! The DdnsEngine is responsible for:
//! - Gating the run through the RateLimiter
//! - Discovering the public IP via IpSource
//! - Listing the configured record via DnsProvider (with retry and backoff)
//! - Deciding, record by record, whether an update is needed
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────┐
//!                  │ DdnsEngine   │
//!                  └──────────────┘
//!                          │
//!      ┌───────────────────┼───────────────────┐
//!      │                   │                   │
//!      ▼                   ▼                   ▼
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │ RateLimiter │   │  IpSource   │   │ DnsProvider  │
//! │ (gate)      │   │ (resolve)   │   │ (list/update)│
//! └─────────────┘   └─────────────┘   └──────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Rate limit check; a recent run ends this one cleanly
//! 2. Resolve the public IP; failure ends the run cleanly
//! 3. List records, retrying with linear backoff; exhaustion is fatal
//! 4. For each record: skip non-A, then update / up to date / not target
//!
//! A failed update is recorded in the outcome and never turned into an error.

use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::rate_limit::{RateLimitDecision, RateLimiter};
use crate::traits::{DnsProvider, DnsRecord, IpSource, RunStampStore};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What the engine did with one listed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordAction {
    /// Not an A record; ignored
    SkippedNonA {
        /// The record's type
        record_type: String,
    },
    /// Target record already points at the public IP
    UpToDate,
    /// Target record was rewritten
    Updated {
        /// Content before the update
        previous: String,
        /// Content reported by the provider after the update
        current: String,
    },
    /// Target record needed an update but the provider call failed
    UpdateFailed {
        /// Provider error message
        error: String,
    },
    /// A record with a different name
    NotTarget,
}

/// Decision taken for one listed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDecision {
    /// Provider record ID
    pub record_id: String,
    /// Record name as listed
    pub record_name: String,
    /// What happened
    pub action: RecordAction,
}

/// Result of one engine run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The previous run was too recent; nothing was contacted
    RateLimited {
        /// Seconds since the previous run
        elapsed_secs: f64,
    },
    /// The public IP could not be determined; no provider call was made
    IpUnavailable {
        /// Lookup error message
        error: String,
    },
    /// Records were listed and every one of them was decided
    Reconciled {
        /// The public IP the records were compared against
        public_ip: Ipv4Addr,
        /// One decision per listed record, in list order
        decisions: Vec<RecordDecision>,
    },
}

impl RunOutcome {
    /// Number of records successfully updated during the run
    pub fn updated_count(&self) -> usize {
        self.count_actions(|action| matches!(action, RecordAction::Updated { .. }))
    }

    /// Number of update calls that failed during the run
    pub fn failed_update_count(&self) -> usize {
        self.count_actions(|action| matches!(action, RecordAction::UpdateFailed { .. }))
    }

    fn count_actions(&self, predicate: impl Fn(&RecordAction) -> bool) -> usize {
        match self {
            RunOutcome::Reconciled { decisions, .. } => decisions
                .iter()
                .filter(|decision| predicate(&decision.action))
                .count(),
            _ => 0,
        }
    }
}

/// Core reconciliation engine
///
/// One engine performs one linear pass per [`DdnsEngine::run_once()`] call.
/// It never spawns tasks; every await happens in sequence.
///
/// ## Retry Policy
///
/// Only the list call is retried: `list_max_attempts` attempts in total, and
/// after failed attempt `n` the engine sleeps `n * list_backoff_step`. The
/// sleep also follows the last attempt, so three failures with a 5s step
/// cost 5 + 10 + 15 seconds. Update calls are single-shot.
pub struct DdnsEngine {
    /// Public IP discovery
    ip_source: Box<dyn IpSource>,

    /// DNS provider for listing and updating records
    provider: Box<dyn DnsProvider>,

    /// Run-frequency gate
    rate_limiter: RateLimiter,

    /// The one record name this engine manages
    record_name: String,

    /// Total attempts for the list call
    list_max_attempts: usize,

    /// Linear backoff step for the list call
    list_backoff_step: Duration,
}

impl DdnsEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: Public IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `stamp_store`: Store for the rate limiter's run stamp
    /// - `config`: Agent configuration (validated here)
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        stamp_store: Box<dyn RunStampStore>,
        config: &DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            rate_limiter: RateLimiter::new(
                stamp_store,
                Duration::from_secs(config.rate_limit.min_interval_secs),
            ),
            record_name: config.record_name.clone(),
            list_max_attempts: config.engine.list_max_attempts,
            list_backoff_step: Duration::from_secs(config.engine.list_backoff_step_secs),
        })
    }

    /// Perform one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(RunOutcome)`: The run finished; soft failures are inside the outcome
    /// - `Err(Error::RetriesExhausted)`: The list call failed on every attempt
    /// - `Err(Error::StateStore)`: The run stamp could not be read or written
    pub async fn run_once(&self) -> Result<RunOutcome> {
        info!("Executing dyndns agent for {}", self.record_name);

        if let RateLimitDecision::Blocked { elapsed_secs } = self.rate_limiter.check().await? {
            info!(
                "Rate limit hit, last run {:.0}s ago (minimum {}s), skipping execution",
                elapsed_secs,
                self.rate_limiter.min_interval().as_secs()
            );
            return Ok(RunOutcome::RateLimited { elapsed_secs });
        }

        let public_ip = match self.ip_source.current().await {
            Ok(ip) => {
                info!("Public IP is {} (via {})", ip, self.ip_source.source_name());
                ip
            }
            Err(e) => {
                error!("Error resolving public IP: {}", e);
                error!("Public IP address could not be determined");
                return Ok(RunOutcome::IpUnavailable {
                    error: e.to_string(),
                });
            }
        };

        let records = self.list_records_with_retry().await?;
        if records.is_empty() {
            warn!(
                "No DNS records returned from {} for {}",
                self.provider.provider_name(),
                self.record_name
            );
        }

        let mut decisions = Vec::with_capacity(records.len());
        for record in &records {
            let action = self.reconcile_record(record, public_ip).await;
            decisions.push(RecordDecision {
                record_id: record.id.clone(),
                record_name: record.name.clone(),
                action,
            });
        }

        Ok(RunOutcome::Reconciled {
            public_ip,
            decisions,
        })
    }

    /// Apply the two decision guards to one listed record
    async fn reconcile_record(&self, record: &DnsRecord, public_ip: Ipv4Addr) -> RecordAction {
        info!("Checking record {}", record.name);

        // Guard 1: type filter
        if !record.is_a_record() {
            debug!(
                "Record {} has type {}, ignoring",
                record.name, record.record_type
            );
            return RecordAction::SkippedNonA {
                record_type: record.record_type.clone(),
            };
        }

        // Guard 2: name/content decision
        if record.name != self.record_name {
            info!("Record {} is not the record we want to update", record.name);
            return RecordAction::NotTarget;
        }

        let public_ip_text = public_ip.to_string();
        if record.content == public_ip_text {
            info!("Record {} is already up to date", record.name);
            return RecordAction::UpToDate;
        }

        info!(
            "Updating record {} from {} to {}",
            record.name, record.content, public_ip_text
        );

        match self
            .provider
            .update_record(&record.id, public_ip, &record.name)
            .await
        {
            Ok(updated) => RecordAction::Updated {
                previous: record.content.clone(),
                current: updated.content,
            },
            Err(e) => {
                error!("Error updating DNS record {}: {}", record.id, e);
                RecordAction::UpdateFailed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// List records with linear backoff
    async fn list_records_with_retry(&self) -> Result<Vec<DnsRecord>> {
        info!(
            "Getting {} DNS records for {}",
            self.provider.provider_name(),
            self.record_name
        );

        let mut last_error = None;
        for attempt in 1..=self.list_max_attempts {
            match self.provider.list_records(&self.record_name).await {
                Ok(records) => {
                    debug!(
                        "Listed {} record(s) on attempt {}",
                        records.len(),
                        attempt
                    );
                    return Ok(records);
                }
                Err(e) => {
                    error!("Attempt {} failed: {}", attempt, e);
                    last_error = Some(e);
                }
            }

            let backoff = self.list_backoff_step * attempt as u32;
            debug!("Backing off for {}s", backoff.as_secs());
            tokio::time::sleep(backoff).await;
        }

        let last_error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt made".to_string());
        Err(Error::retries_exhausted(
            "list DNS records",
            self.list_max_attempts,
            last_error,
        ))
    }
}
