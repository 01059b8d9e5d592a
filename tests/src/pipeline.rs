#![cfg(test)]
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use edgefind_common::network::RangeSet;
use edgefind_core::network::{FingerprintConfig, FingerprintProbe, LivenessProbe};
use edgefind_core::pipeline::Pipeline;
use edgefind_core::probe::Probe;
use tokio::net::TcpListener;

/// Passes only the listed addresses, after a delay that varies per address
/// so completion order differs from enumeration order.
struct Allow(HashSet<Ipv4Addr>);

impl Allow {
    fn new(addrs: &[Ipv4Addr]) -> Self {
        Self(addrs.iter().copied().collect())
    }
}

#[async_trait]
impl Probe for Allow {
    async fn probe(&self, addr: Ipv4Addr) -> bool {
        let jitter: u64 = u64::from(addr.octets()[3] % 7);
        tokio::time::sleep(Duration::from_millis(jitter)).await;
        self.0.contains(&addr)
    }
}

struct PassAll;

#[async_trait]
impl Probe for PassAll {
    async fn probe(&self, _addr: Ipv4Addr) -> bool {
        true
    }
}

/// A /31 where only the first address is open and fingerprints correctly.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slash_31_emits_only_the_matching_host() {
    let good: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 0);

    for workers in [1, 2, 4, 32] {
        let ranges = RangeSet::from_cidrs(["192.0.2.0/31"]);
        let pipeline = Pipeline::new(workers, Allow::new(&[good]), Allow::new(&[good]));

        let (found, summary) = pipeline.spawn(ranges).collect().await.unwrap();

        assert_eq!(found, vec![good], "workers = {workers}");
        assert_eq!(summary.enumerated, 2);
        assert_eq!(summary.alive, 1);
        assert_eq!(summary.matched, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_count_does_not_change_the_result_set() {
    let alive: Vec<Ipv4Addr> = (0..64u8)
        .filter(|o| o % 3 != 0)
        .map(|o| Ipv4Addr::new(198, 51, 100, o))
        .collect();
    let matching: Vec<Ipv4Addr> = alive.iter().copied().filter(|a| a.octets()[3] % 2 == 0).collect();
    let expected: HashSet<Ipv4Addr> = matching.iter().copied().collect();

    for workers in [1, 4, 32] {
        let ranges = RangeSet::from_cidrs(["198.51.100.0/26"]);
        let pipeline = Pipeline::new(workers, Allow::new(&alive), Allow::new(&matching));

        let (found, _) = pipeline.spawn(ranges).collect().await.unwrap();
        let found_set: HashSet<Ipv4Addr> = found.iter().copied().collect();

        assert_eq!(found.len(), found_set.len(), "duplicate output with {workers} workers");
        assert_eq!(found_set, expected, "workers = {workers}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn liveness_probe_over_loopback() {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port: u16 = listener.local_addr().unwrap().port();

    // 127.0.0.2 has nothing listening on `port`, so it is refused or times out.
    let ranges = RangeSet::from_cidrs(["127.0.0.1/32", "127.0.0.2/32"]);
    let liveness = LivenessProbe::new(port, Duration::from_millis(300));
    let pipeline = Pipeline::new(4, liveness, PassAll);

    let (found, summary) = pipeline.spawn(ranges).collect().await.unwrap();

    assert_eq!(found, vec![Ipv4Addr::LOCALHOST]);
    assert_eq!(summary.enumerated, 2);
    drop(listener);
}

#[tokio::test]
async fn fingerprint_failures_filter_everything() {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port: u16 = listener.local_addr().unwrap().port();

    // The port is open but speaks no TLS, so the trace request fails.
    let ranges = RangeSet::from_cidrs(["127.0.0.1/32"]);
    let liveness = LivenessProbe::new(port, Duration::from_millis(300));
    let cfg = FingerprintConfig::new("example.com", port, Duration::from_millis(300));
    let pipeline = Pipeline::new(2, liveness, FingerprintProbe::new(Arc::new(cfg)));

    let (found, summary) = pipeline.spawn(ranges).collect().await.unwrap();

    assert!(found.is_empty());
    assert_eq!(summary.alive, 1);
    assert_eq!(summary.matched, 0);
    drop(listener);
}
