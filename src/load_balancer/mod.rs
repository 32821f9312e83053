//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Query about to execute
//!     → policy.new_query_plan(query)
//!     → snapshot HostRegistry::all_hosts()
//!     → cursor.rs (reserve a starting offset atomically)
//!     → plan.rs (rotated snapshot, liveness checked per host)
//!     → execution pipeline tries hosts in order
//!
//! Connection pool sizing:
//!     → policy.distance(host) → Local / Remote / Ignored
//! ```
//!
//! # Design Decisions
//! - Policies hold no hosts; membership is read from the registry per plan
//! - The rotation cursor is the only shared mutable state, updated atomically
//! - Fairness under concurrency is best-effort; index safety is guaranteed
//! - An empty plan is data, not an error

pub mod cursor;
pub mod dc_aware;
pub mod plan;
pub mod round_robin;

use std::sync::{Arc, OnceLock};

use crate::cluster::{Host, HostRegistry};
use crate::config::schema::{PolicyConfig, PolicyKind};

pub use cursor::RotationCursor;
pub use dc_aware::DcAwareRoundRobinPolicy;
pub use plan::QueryPlan;
pub use round_robin::RoundRobinPolicy;

/// Proximity of a host as seen by a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostDistance {
    Local,
    Remote,
    Ignored,
}

/// Per-query information handed to a policy.
///
/// The policies in this crate do not look inside it.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    keyspace: Option<String>,
    routing_key: Option<Vec<u8>>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    pub fn with_routing_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.routing_key = Some(key.into());
        self
    }

    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    pub fn routing_key(&self) -> Option<&[u8]> {
        self.routing_key.as_deref()
    }
}

/// Strategy deciding which hosts a query is sent to, and in which order.
pub trait LoadBalancingPolicy: Send + Sync + std::fmt::Debug {
    /// Bind the policy to a registry. Must be called once, before any other method.
    fn initialize(&self, registry: Arc<dyn HostRegistry>);

    /// Classify `host`. Pure: the same host always yields the same distance.
    fn distance(&self, host: &Host) -> HostDistance;

    /// Fresh plan for one query.
    ///
    /// # Panics
    /// If the policy has not been initialized.
    fn new_query_plan(&self, query: &QueryContext) -> QueryPlan;
}

/// Registry handle set once by `initialize`.
#[derive(Default)]
pub(crate) struct RegistryBinding {
    registry: OnceLock<Arc<dyn HostRegistry>>,
}

impl RegistryBinding {
    pub(crate) fn bind(&self, registry: Arc<dyn HostRegistry>, policy: &'static str) {
        if self.registry.set(registry).is_err() {
            tracing::warn!(policy, "Policy already initialized; keeping the first registry");
        }
    }

    pub(crate) fn get(&self, policy: &'static str) -> &Arc<dyn HostRegistry> {
        match self.registry.get() {
            Some(registry) => registry,
            None => panic!("{policy} used before initialize()"),
        }
    }
}

impl std::fmt::Debug for RegistryBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryBinding")
            .field("initialized", &self.registry.get().is_some())
            .finish()
    }
}

/// Create the policy selected in configuration.
pub fn build_policy(config: &PolicyConfig) -> Arc<dyn LoadBalancingPolicy> {
    match config.kind {
        PolicyKind::RoundRobin => Arc::new(RoundRobinPolicy::new()),
        PolicyKind::DcAwareRoundRobin => {
            // Validation rejects a DC-aware policy without a local datacenter.
            let local_dc = config.local_dc.clone().unwrap_or_default();
            Arc::new(DcAwareRoundRobinPolicy::new(
                local_dc,
                config.used_hosts_per_remote_dc,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Metadata;
    use std::net::SocketAddr;

    #[test]
    fn factory_builds_configured_policy() {
        let registry: Arc<dyn HostRegistry> = Arc::new(Metadata::from_hosts([
            Host::new(SocketAddr::from(([10, 0, 0, 1], 9042))).with_datacenter("east"),
            Host::new(SocketAddr::from(([10, 0, 0, 2], 9042))).with_datacenter("west"),
        ]));

        let config = PolicyConfig {
            kind: PolicyKind::DcAwareRoundRobin,
            local_dc: Some("east".into()),
            used_hosts_per_remote_dc: 0,
        };
        let policy = build_policy(&config);
        policy.initialize(registry.clone());

        let plan: Vec<_> = policy.new_query_plan(&QueryContext::new()).collect();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].datacenter(), Some("east"));

        let policy = build_policy(&PolicyConfig::default());
        policy.initialize(registry);
        assert_eq!(policy.new_query_plan(&QueryContext::new()).count(), 2);
    }

    #[test]
    fn query_context_is_opaque_data() {
        let query = QueryContext::new()
            .with_keyspace("ks")
            .with_routing_key(vec![1, 2, 3]);
        assert_eq!(query.keyspace(), Some("ks"));
        assert_eq!(query.routing_key(), Some(&[1u8, 2, 3][..]));
    }
}
