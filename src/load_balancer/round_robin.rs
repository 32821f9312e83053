//! Round-robin load balancing policy.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::cluster::{Host, HostRegistry};
use crate::load_balancer::{
    HostDistance, LoadBalancingPolicy, QueryContext, QueryPlan, RegistryBinding, RotationCursor,
};
use crate::observability::metrics;

/// Queries every known host in round-robin order.
///
/// Not datacenter aware: every host is `Local`. For multi-datacenter clusters use
/// [`DcAwareRoundRobinPolicy`](crate::load_balancer::DcAwareRoundRobinPolicy).
///
/// Each plan reserves one full rotation (the snapshot length) on the shared
/// cursor. The first plan starts at a random offset so that client instances
/// do not all begin with the same host.
#[derive(Debug, Default)]
pub struct RoundRobinPolicy {
    registry: RegistryBinding,
    cursor: RotationCursor,
}

impl RoundRobinPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the initial offset from `rng`.
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            registry: RegistryBinding::default(),
            cursor: RotationCursor::with_rng(rng),
        }
    }

    /// Deterministic initial offset, for tests and reproducible tooling.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl LoadBalancingPolicy for RoundRobinPolicy {
    fn initialize(&self, registry: Arc<dyn HostRegistry>) {
        self.registry.bind(registry, "RoundRobinPolicy");
    }

    fn distance(&self, _host: &Host) -> HostDistance {
        HostDistance::Local
    }

    fn new_query_plan(&self, _query: &QueryContext) -> QueryPlan {
        let hosts = self.registry.get("RoundRobinPolicy").all_hosts();
        if hosts.is_empty() {
            tracing::debug!("No known hosts; returning empty query plan");
            metrics::record_query_plan("round_robin", 0);
            return QueryPlan::empty();
        }

        let start = self.cursor.reserve(hosts.len());
        metrics::record_query_plan("round_robin", hosts.len());
        QueryPlan::rotated(hosts, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Debounce, Metadata};
    use std::net::SocketAddr;

    fn registry(n: u16) -> Arc<Metadata> {
        Arc::new(Metadata::from_hosts((0..n).map(|i| {
            Host::new(SocketAddr::from(([127, 0, 0, 1], 8080 + i)))
                .with_debounce(Debounce::immediate())
        })))
    }

    fn policy_over(registry: &Arc<Metadata>, seed: u64) -> RoundRobinPolicy {
        let lb = RoundRobinPolicy::with_seed(seed);
        lb.initialize(registry.clone());
        lb
    }

    #[test]
    fn test_round_robin() {
        let metadata = registry(3);
        let lb = policy_over(&metadata, 1);

        let plan: Vec<u16> = lb
            .new_query_plan(&QueryContext::new())
            .map(|h| h.addr().port())
            .collect();
        assert_eq!(plan.len(), 3);

        // Consecutive entries follow registry order, wrapping around.
        let start = (plan[0] - 8080) as usize;
        for (i, port) in plan.iter().enumerate() {
            assert_eq!(*port as usize, 8080 + (start + i) % 3);
        }
    }

    #[test]
    fn full_rotation_per_plan() {
        let metadata = registry(5);
        let lb = policy_over(&metadata, 9);

        let first = lb.new_query_plan(&QueryContext::new()).next().unwrap();
        let second = lb.new_query_plan(&QueryContext::new()).next().unwrap();
        assert_eq!(first.addr(), second.addr());
    }

    #[test]
    fn down_hosts_are_skipped() {
        let metadata = registry(4);
        let lb = policy_over(&metadata, 2);

        let down = metadata.all_hosts()[1].clone();
        down.mark_down();

        let plan: Vec<_> = lb.new_query_plan(&QueryContext::new()).collect();
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|h| h.addr() != down.addr()));
    }

    #[test]
    fn all_down_gives_empty_plan() {
        let metadata = registry(3);
        let lb = policy_over(&metadata, 4);
        for host in metadata.all_hosts() {
            host.mark_down();
        }
        assert_eq!(lb.new_query_plan(&QueryContext::new()).count(), 0);
    }

    #[test]
    fn empty_registry_gives_empty_plan() {
        let metadata = registry(0);
        let lb = policy_over(&metadata, 4);
        assert_eq!(lb.new_query_plan(&QueryContext::new()).count(), 0);
    }

    #[test]
    fn every_host_is_local() {
        let metadata = registry(2);
        let lb = policy_over(&metadata, 0);
        for host in metadata.all_hosts() {
            assert_eq!(lb.distance(&host), HostDistance::Local);
            assert_eq!(lb.distance(&host), HostDistance::Local);
        }
    }

    #[test]
    #[should_panic(expected = "before initialize")]
    fn plan_before_initialize_panics() {
        let lb = RoundRobinPolicy::new();
        let _ = lb.new_query_plan(&QueryContext::new());
    }

    #[test]
    fn second_initialize_keeps_first_registry() {
        let first = registry(2);
        let lb = policy_over(&first, 5);
        lb.initialize(registry(7));
        assert_eq!(lb.new_query_plan(&QueryContext::new()).count(), 2);
    }
}
