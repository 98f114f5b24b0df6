//! Contract Test: Rate Limit Gate
//!
//! Constraints verified:
//! - A run within the minimum interval contacts nothing and ends cleanly
//! - A missing stamp always lets the run through
//! - The stamp is written before any network call, so failed runs count too

mod common;

use common::*;
use dyndns_core::RunOutcome;
use dyndns_core::rate_limit::now_secs;
use dyndns_core::state::{FileRunStampStore, MemoryRunStampStore};
use dyndns_core::traits::RunStampStore;
use std::net::Ipv4Addr;

#[tokio::test]
async fn recent_run_makes_no_network_calls() {
    let ip_source = StaticIpSource::new(Ipv4Addr::new(5, 6, 7, 8));
    let provider = MockDnsProvider::new(vec![record("rec1", "A", TARGET, "1.2.3.4")]);
    let previous = now_secs() - 10.0;
    let store = MemoryRunStampStore::with_last_run(previous);

    let engine = engine(ip_source.clone(), &provider, store.clone());
    let outcome = engine.run_once().await.expect("rate limited run is not an error");

    assert!(
        matches!(outcome, RunOutcome::RateLimited { elapsed_secs } if elapsed_secs < 55.0),
        "expected RateLimited, got {:?}",
        outcome
    );
    assert_eq!(ip_source.call_count(), 0, "no DNS lookup when rate limited");
    assert_eq!(provider.list_call_count(), 0, "no list call when rate limited");
    assert_eq!(provider.update_call_count(), 0, "no update call when rate limited");
    assert_eq!(
        store.last_run().await.unwrap(),
        Some(previous),
        "a blocked run must not move the stamp"
    );
}

#[tokio::test]
async fn missing_stamp_always_proceeds() {
    let ip_source = StaticIpSource::new(Ipv4Addr::new(1, 2, 3, 4));
    let provider = MockDnsProvider::new(vec![record("rec1", "A", TARGET, "1.2.3.4")]);
    let store = MemoryRunStampStore::new();

    let before = now_secs();
    let engine = engine(ip_source.clone(), &provider, store.clone());
    let outcome = engine.run_once().await.unwrap();

    assert!(matches!(outcome, RunOutcome::Reconciled { .. }));
    assert_eq!(ip_source.call_count(), 1);
    let stamp = store.last_run().await.unwrap().expect("stamp recorded");
    assert!(stamp >= before, "stamp must be the time of this run");
}

#[tokio::test]
async fn stale_stamp_proceeds() {
    let ip_source = StaticIpSource::new(Ipv4Addr::new(1, 2, 3, 4));
    let provider = MockDnsProvider::new(vec![]);
    let store = MemoryRunStampStore::with_last_run(now_secs() - 120.0);

    let engine = engine(ip_source, &provider, store);
    let outcome = engine.run_once().await.unwrap();

    assert!(matches!(outcome, RunOutcome::Reconciled { .. }));
    assert_eq!(provider.list_call_count(), 1);
}

#[tokio::test]
async fn failed_run_still_consumes_the_window() {
    let ip_source = FailingIpSource::new();
    let provider = MockDnsProvider::new(vec![]);
    let store = MemoryRunStampStore::new();
    let engine = engine(ip_source.clone(), &provider, store.clone());

    let first = engine.run_once().await.unwrap();
    assert!(matches!(first, RunOutcome::IpUnavailable { .. }));
    assert!(store.last_run().await.unwrap().is_some());

    let second = engine.run_once().await.unwrap();
    assert!(
        matches!(second, RunOutcome::RateLimited { .. }),
        "second run right after a failed one must be blocked, got {:?}",
        second
    );
    assert_eq!(ip_source.call_count(), 1, "only the first run looks up the IP");
}

#[tokio::test]
async fn file_stamp_survives_between_engines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".last_run");
    let provider = MockDnsProvider::new(vec![record("rec1", "A", TARGET, "1.2.3.4")]);

    // First process
    {
        let engine = engine(
            StaticIpSource::new(Ipv4Addr::new(1, 2, 3, 4)),
            &provider,
            FileRunStampStore::new(&path),
        );
        let outcome = engine.run_once().await.unwrap();
        assert!(matches!(outcome, RunOutcome::Reconciled { .. }));
    }

    assert!(path.exists(), "stamp file written by the first run");

    // Second process, seconds later
    {
        let engine = engine(
            StaticIpSource::new(Ipv4Addr::new(1, 2, 3, 4)),
            &provider,
            FileRunStampStore::new(&path),
        );
        let outcome = engine.run_once().await.unwrap();
        assert!(matches!(outcome, RunOutcome::RateLimited { .. }));
    }

    assert_eq!(provider.list_call_count(), 1);
}

#[tokio::test]
async fn garbage_stamp_file_is_treated_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".last_run");
    std::fs::write(&path, "definitely not a float").unwrap();

    let provider = MockDnsProvider::new(vec![]);
    let engine = engine(
        StaticIpSource::new(Ipv4Addr::new(1, 2, 3, 4)),
        &provider,
        FileRunStampStore::new(&path),
    );

    let outcome = engine.run_once().await.unwrap();

    assert!(matches!(outcome, RunOutcome::Reconciled { .. }));
    let stamp: f64 = std::fs::read_to_string(&path).unwrap().parse().unwrap();
    assert!(stamp > 0.0);
}
