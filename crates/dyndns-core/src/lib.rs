// # dyndns-core
//
// Core library for the single-record dynamic DNS agent.
//
// ## Architecture Overview
//
// This library provides the core functionality for one reconciliation pass:
// - **IpSource**: Trait for discovering the public IPv4 address
// - **DnsProvider**: Trait for listing and updating A records via provider APIs
// - **RunStampStore**: Trait for persisting the last-run timestamp
// - **RateLimiter**: Gate that keeps runs at least a minimum interval apart
// - **DdnsEngine**: Orchestrates gate → IP lookup → list → per-record decision
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider and IP source crates
// 2. **Single Pass**: One call to `run_once()` is one run; no loops, no spawned tasks
// 3. **Engine-Owned Retry**: Providers are single-shot; the engine retries the list call
// 4. **No Hidden Exits**: Components return errors or outcomes, only `main` picks exit codes

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod state;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, DnsRecord, RunStampStore};
pub use engine::{DdnsEngine, RecordAction, RecordDecision, RunOutcome};
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use config::{DdnsConfig, EngineConfig, IpSourceConfig, ProviderConfig, RateLimitConfig};
pub use error::{Error, Result};
pub use state::{FileRunStampStore, MemoryRunStampStore};
