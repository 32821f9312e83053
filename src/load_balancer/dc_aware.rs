//! Datacenter-aware round-robin load balancing policy.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cluster::{Host, HostRegistry};
use crate::load_balancer::{
    HostDistance, LoadBalancingPolicy, QueryContext, QueryPlan, RegistryBinding, RotationCursor,
};
use crate::observability::metrics;

/// Round-robin over the local datacenter first, then a bounded number of hosts
/// from each remote datacenter.
///
/// Hosts without a datacenter are treated as local. In each remote datacenter
/// only the first `used_hosts_per_remote_dc` hosts (registry order) are
/// `Remote`; the rest are `Ignored` and never appear in plans.
#[derive(Debug)]
pub struct DcAwareRoundRobinPolicy {
    local_dc: String,
    used_hosts_per_remote_dc: usize,
    registry: RegistryBinding,
    local_cursor: RotationCursor,
    remote_cursor: RotationCursor,
}

impl DcAwareRoundRobinPolicy {
    pub fn new(local_dc: impl Into<String>, used_hosts_per_remote_dc: usize) -> Self {
        Self {
            local_dc: local_dc.into(),
            used_hosts_per_remote_dc,
            registry: RegistryBinding::default(),
            local_cursor: RotationCursor::new(),
            remote_cursor: RotationCursor::new(),
        }
    }

    /// Deterministic initial offsets.
    pub fn with_seed(
        local_dc: impl Into<String>,
        used_hosts_per_remote_dc: usize,
        seed: u64,
    ) -> Self {
        Self {
            local_cursor: RotationCursor::with_rng(StdRng::seed_from_u64(seed)),
            remote_cursor: RotationCursor::with_rng(StdRng::seed_from_u64(seed.wrapping_add(1))),
            ..Self::new(local_dc, used_hosts_per_remote_dc)
        }
    }

    pub fn local_dc(&self) -> &str {
        &self.local_dc
    }

    fn is_local(&self, host: &Host) -> bool {
        host.datacenter().map_or(true, |dc| dc == self.local_dc)
    }

    /// Split a snapshot into local hosts and usable remote hosts.
    fn partition(&self, hosts: Vec<Arc<Host>>) -> (Vec<Arc<Host>>, Vec<Arc<Host>>) {
        let mut local = Vec::new();
        let mut remote = Vec::new();
        let mut per_dc: HashMap<String, usize> = HashMap::new();

        for host in hosts {
            if self.is_local(&host) {
                local.push(host);
                continue;
            }
            let dc = host.datacenter().unwrap_or_default().to_string();
            let used = per_dc.entry(dc).or_insert(0);
            if *used < self.used_hosts_per_remote_dc {
                *used += 1;
                remote.push(host);
            }
        }
        (local, remote)
    }
}

impl LoadBalancingPolicy for DcAwareRoundRobinPolicy {
    fn initialize(&self, registry: Arc<dyn HostRegistry>) {
        tracing::info!(
            local_dc = %self.local_dc,
            used_hosts_per_remote_dc = self.used_hosts_per_remote_dc,
            "Datacenter-aware policy initialized"
        );
        self.registry.bind(registry, "DcAwareRoundRobinPolicy");
    }

    fn distance(&self, host: &Host) -> HostDistance {
        if self.is_local(host) {
            return HostDistance::Local;
        }
        if self.used_hosts_per_remote_dc == 0 {
            return HostDistance::Ignored;
        }

        let dc = host.datacenter();
        let rank = self
            .registry
            .get("DcAwareRoundRobinPolicy")
            .all_hosts()
            .iter()
            .filter(|h| h.datacenter() == dc)
            .position(|h| h.addr() == host.addr());

        match rank {
            Some(rank) if rank < self.used_hosts_per_remote_dc => HostDistance::Remote,
            _ => HostDistance::Ignored,
        }
    }

    fn new_query_plan(&self, _query: &QueryContext) -> QueryPlan {
        let hosts = self.registry.get("DcAwareRoundRobinPolicy").all_hosts();
        let (local, remote) = self.partition(hosts);
        metrics::record_query_plan("dc_aware_round_robin", local.len() + remote.len());

        let local_start = self.local_cursor.reserve(local.len());
        let remote_start = self.remote_cursor.reserve(remote.len());
        QueryPlan::rotated(local, local_start).chain(QueryPlan::rotated(remote, remote_start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Debounce, Metadata};
    use std::net::SocketAddr;

    fn host(last: u8, dc: Option<&str>) -> Host {
        let host = Host::new(SocketAddr::from(([10, 0, 0, last], 9042)))
            .with_debounce(Debounce::immediate());
        match dc {
            Some(dc) => host.with_datacenter(dc),
            None => host,
        }
    }

    fn cluster() -> Arc<Metadata> {
        Arc::new(Metadata::from_hosts([
            host(1, Some("east")),
            host(2, Some("west")),
            host(3, Some("east")),
            host(4, Some("west")),
            host(5, Some("west")),
            host(6, None),
        ]))
    }

    fn last_octet(host: &Host) -> u8 {
        match host.addr() {
            SocketAddr::V4(v4) => v4.ip().octets()[3],
            SocketAddr::V6(_) => unreachable!(),
        }
    }

    #[test]
    fn local_hosts_come_first() {
        let metadata = cluster();
        let policy = DcAwareRoundRobinPolicy::with_seed("east", 2, 42);
        policy.initialize(metadata.clone());

        let plan: Vec<u8> = policy
            .new_query_plan(&QueryContext::new())
            .map(|h| last_octet(&h))
            .collect();

        assert_eq!(plan.len(), 5);
        let mut local = plan[..3].to_vec();
        local.sort_unstable();
        assert_eq!(local, vec![1, 3, 6]);
        let mut remote = plan[3..].to_vec();
        remote.sort_unstable();
        assert_eq!(remote, vec![2, 4]);
    }

    #[test]
    fn distance_ranks_remote_hosts() {
        let metadata = cluster();
        let policy = DcAwareRoundRobinPolicy::new("east", 1);
        policy.initialize(metadata.clone());

        let by_octet: HashMap<u8, HostDistance> = metadata
            .all_hosts()
            .iter()
            .map(|h| (last_octet(h), policy.distance(h)))
            .collect();

        assert_eq!(by_octet[&1], HostDistance::Local);
        assert_eq!(by_octet[&3], HostDistance::Local);
        assert_eq!(by_octet[&6], HostDistance::Local);
        assert_eq!(by_octet[&2], HostDistance::Remote);
        assert_eq!(by_octet[&4], HostDistance::Ignored);
        assert_eq!(by_octet[&5], HostDistance::Ignored);
    }

    #[test]
    fn distance_is_stable() {
        let metadata = cluster();
        let policy = DcAwareRoundRobinPolicy::new("east", 2);
        policy.initialize(metadata.clone());
        for h in metadata.all_hosts() {
            assert_eq!(policy.distance(&h), policy.distance(&h));
        }
    }

    #[test]
    fn remote_hosts_disabled() {
        let metadata = cluster();
        let policy = DcAwareRoundRobinPolicy::new("west", 0);
        policy.initialize(metadata);

        let plan: Vec<_> = policy.new_query_plan(&QueryContext::new()).collect();
        assert_eq!(plan.len(), 4);
        assert!(plan.iter().all(|h| h.datacenter() != Some("east")));
    }

    #[test]
    fn local_and_remote_groups_rotate_independently() {
        let metadata = Arc::new(Metadata::from_hosts([
            host(1, Some("east")),
            host(2, Some("east")),
            host(3, Some("east")),
            host(4, Some("west")),
            host(5, Some("west")),
        ]));
        let policy = DcAwareRoundRobinPolicy::with_seed("east", 2, 7);
        policy.initialize(metadata);

        let plans: Vec<Vec<u8>> = (0..4)
            .map(|_| {
                policy
                    .new_query_plan(&QueryContext::new())
                    .map(|h| last_octet(&h))
                    .collect()
            })
            .collect();

        for plan in &plans {
            let (local, remote) = plan.split_at(3);
            let mut local = local.to_vec();
            local.sort_unstable();
            assert_eq!(local, vec![1, 2, 3]);
            let mut remote = remote.to_vec();
            remote.sort_unstable();
            assert_eq!(remote, vec![4, 5]);
        }

        // Each group advances by its own length, so both orders repeat plan to plan.
        assert!(plans.iter().all(|plan| plan == &plans[0]));
    }

    #[test]
    #[should_panic(expected = "before initialize")]
    fn remote_distance_before_initialize_panics() {
        let policy = DcAwareRoundRobinPolicy::new("east", 1);
        policy.distance(&host(2, Some("west")));
    }

    #[test]
    fn local_distance_needs_no_registry() {
        let policy = DcAwareRoundRobinPolicy::new("east", 1);
        assert_eq!(policy.distance(&host(1, Some("east"))), HostDistance::Local);
        assert_eq!(policy.distance(&host(6, None)), HostDistance::Local);
    }

    #[test]
    fn local_outage_falls_back_to_remote() {
        let metadata = cluster();
        let policy = DcAwareRoundRobinPolicy::new("east", 3);
        policy.initialize(metadata.clone());
        for h in metadata.all_hosts().iter().filter(|h| policy.distance(h) == HostDistance::Local) {
            h.mark_down();
        }

        let plan: Vec<_> = policy.new_query_plan(&QueryContext::new()).collect();
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|h| h.datacenter() == Some("west")));
    }
}
