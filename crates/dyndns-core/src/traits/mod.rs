//! Core traits for the agent
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Discover the current public IPv4 address
//! - [`DnsProvider`]: List and update A records via provider APIs
//! - [`RunStampStore`]: Persist the last-run timestamp for rate limiting

pub mod ip_source;
pub mod dns_provider;
pub mod state_store;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsRecord};
pub use state_store::RunStampStore;
