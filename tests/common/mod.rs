//! Shared helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use cluster_balancer::cluster::{Debounce, Host, Metadata};

/// Registry of `n` hosts on 127.0.0.1 with ports 9000.., flipping liveness on the first signal.
pub fn registry(n: u16) -> Arc<Metadata> {
    Arc::new(Metadata::from_hosts((0..n).map(|i| {
        Host::new(SocketAddr::from(([127, 0, 0, 1], 9000 + i))).with_debounce(Debounce::immediate())
    })))
}

/// Index of a host created by [`registry`].
#[allow(dead_code)]
pub fn index_of(host: &Host) -> usize {
    usize::from(host.addr().port() - 9000)
}
