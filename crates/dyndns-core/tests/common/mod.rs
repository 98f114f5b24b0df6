//! Test doubles and common utilities for engine contract tests
//!
//! This module provides minimal test doubles that count every call the
//! engine makes, so tests can assert on what was (not) contacted.

#![allow(dead_code)]

use dyndns_core::config::{DdnsConfig, ProviderConfig};
use dyndns_core::error::{Error, Result};
use dyndns_core::traits::{DnsProvider, DnsRecord, IpSource, RunStampStore};
use dyndns_core::DdnsEngine;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TARGET: &str = "home.example.com";

/// An IP source that always returns the same address
#[derive(Clone)]
pub struct StaticIpSource {
    ip: Ipv4Addr,
    call_count: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An IP source whose lookups always fail
#[derive(Clone, Default)]
pub struct FailingIpSource {
    call_count: Arc<AtomicUsize>,
}

impl FailingIpSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FailingIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Err(Error::ip_source("NXDOMAIN for myip.opendns.com"))
    }

    fn source_name(&self) -> &'static str {
        "failing"
    }
}

/// One recorded update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub record_id: String,
    pub content: Ipv4Addr,
    pub name: String,
}

/// A mock DnsProvider that tracks calls
///
/// Clones share counters, so the test keeps one handle and gives the
/// engine another.
#[derive(Clone)]
pub struct MockDnsProvider {
    /// Records returned by a successful list call
    records: Vec<DnsRecord>,
    /// Number of list calls that fail before one succeeds
    list_failures: usize,
    /// Whether update calls fail
    fail_updates: bool,
    list_call_count: Arc<AtomicUsize>,
    updates: Arc<std::sync::Mutex<Vec<UpdateCall>>>,
}

impl MockDnsProvider {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            records,
            list_failures: 0,
            fail_updates: false,
            list_call_count: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Fail the first `count` list calls
    pub fn failing_list_calls(mut self, count: usize) -> Self {
        self.list_failures = count;
        self
    }

    /// Fail every update call
    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    /// Get the number of times list_records() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times update_record() was called
    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Get every update call, in order
    pub fn updates(&self) -> Vec<UpdateCall> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, _record_name: &str) -> Result<Vec<DnsRecord>> {
        let call = self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if call < self.list_failures {
            return Err(Error::provider("mock", "Cloudflare server error (transient): 502"));
        }
        Ok(self.records.clone())
    }

    async fn update_record(
        &self,
        record_id: &str,
        content: Ipv4Addr,
        name: &str,
    ) -> Result<DnsRecord> {
        self.updates.lock().unwrap().push(UpdateCall {
            record_id: record_id.to_string(),
            content,
            name: name.to_string(),
        });

        if self.fail_updates {
            return Err(Error::provider("mock", "Failed to update record: 400"));
        }

        Ok(DnsRecord {
            id: record_id.to_string(),
            record_type: "A".to_string(),
            name: name.to_string(),
            content: content.to_string(),
            ttl: 1,
            proxied: false,
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Build a listed record
pub fn record(id: &str, record_type: &str, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        record_type: record_type.to_string(),
        name: name.to_string(),
        content: content.to_string(),
        ttl: 1,
        proxied: false,
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config() -> DdnsConfig {
    DdnsConfig::new(
        TARGET,
        ProviderConfig::Cloudflare {
            api_token: "test-token".to_string(),
            zone_id: "zone123".to_string(),
            dry_run: false,
        },
    )
}

/// Helper to build an engine from test doubles
pub fn engine(
    ip_source: impl IpSource + 'static,
    provider: &MockDnsProvider,
    stamp_store: impl RunStampStore + 'static,
) -> DdnsEngine {
    DdnsEngine::new(
        Box::new(ip_source),
        Box::new(provider.clone()),
        Box::new(stamp_store),
        &minimal_config(),
    )
    .expect("engine construction succeeds")
}
