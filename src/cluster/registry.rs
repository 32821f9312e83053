//! Host registry.
//!
//! # Responsibilities
//! - Define the seam policies read cluster membership through
//! - Provide an in-memory registry fed by contact points and config reloads
//!
//! # Design Decisions
//! - Membership snapshots are lock-free reads (`ArcSwap`)
//! - Writers take one mutex so the address index and the snapshot list change
//!   together; readers never block
//! - Host objects survive re-syncs so liveness history is kept

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::cluster::host::Host;

/// Read-only view of cluster membership consumed by load balancing policies.
pub trait HostRegistry: Send + Sync {
    /// Point-in-time snapshot of every known host, in registry order.
    fn all_hosts(&self) -> Vec<Arc<Host>>;
}

/// In-memory cluster metadata.
#[derive(Debug, Default)]
pub struct Metadata {
    hosts: ArcSwap<Vec<Arc<Host>>>,
    by_addr: DashMap<SocketAddr, Arc<Host>>,
    writer: Mutex<()>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an initial host list. Later duplicates are dropped.
    pub fn from_hosts(hosts: impl IntoIterator<Item = Host>) -> Self {
        let metadata = Self::new();
        for host in hosts {
            metadata.add_host(host);
        }
        metadata
    }

    /// Register a host. If the address is already known the existing host is returned.
    pub fn add_host(&self, host: Host) -> Arc<Host> {
        let _writer = self.write_lock();
        self.insert(host).unwrap_or_else(|existing| existing)
    }

    /// Forget a host permanently.
    pub fn remove_host(&self, addr: &SocketAddr) -> Option<Arc<Host>> {
        let _writer = self.write_lock();
        self.evict(addr)
    }

    pub fn get_host(&self, addr: &SocketAddr) -> Option<Arc<Host>> {
        self.by_addr.get(addr).map(|h| h.value().clone())
    }

    pub fn len(&self) -> usize {
        self.hosts.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reconcile membership with the desired host set.
    ///
    /// Known addresses keep their existing `Host` (and its liveness), new ones are
    /// added, missing ones removed. Returns `(added, removed)`.
    pub fn sync(&self, desired: impl IntoIterator<Item = Host>) -> (usize, usize) {
        let _writer = self.write_lock();
        let mut wanted = HashSet::new();
        let mut added = 0;

        for host in desired {
            if wanted.insert(host.addr()) && self.insert(host).is_ok() {
                added += 1;
            }
        }

        let stale: Vec<SocketAddr> = self
            .hosts
            .load()
            .iter()
            .map(|h| h.addr())
            .filter(|addr| !wanted.contains(addr))
            .collect();
        let removed = stale
            .iter()
            .filter(|addr| self.evict(addr).is_some())
            .count();

        if added > 0 || removed > 0 {
            tracing::info!(added, removed, total = self.len(), "Cluster membership synced");
        }
        (added, removed)
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Caller holds the writer lock. `Err` carries the already-known host.
    fn insert(&self, host: Host) -> Result<Arc<Host>, Arc<Host>> {
        if let Some(existing) = self.by_addr.get(&host.addr()) {
            return Err(existing.value().clone());
        }

        let host = Arc::new(host);
        self.by_addr.insert(host.addr(), host.clone());
        self.hosts.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(host.clone());
            next
        });

        tracing::debug!(host = %host, "Host added");
        Ok(host)
    }

    /// Caller holds the writer lock.
    fn evict(&self, addr: &SocketAddr) -> Option<Arc<Host>> {
        let (_, removed) = self.by_addr.remove(addr)?;
        self.hosts.rcu(|current| {
            current
                .iter()
                .filter(|h| h.addr() != *addr)
                .cloned()
                .collect::<Vec<_>>()
        });

        tracing::debug!(host = %removed, "Host removed");
        Some(removed)
    }
}

impl HostRegistry for Metadata {
    fn all_hosts(&self) -> Vec<Arc<Host>> {
        Vec::clone(&self.hosts.load())
    }
}
