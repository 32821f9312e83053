//! Query plans.

use std::iter::FusedIterator;
use std::sync::Arc;

use crate::cluster::Host;
use crate::observability::metrics;

/// Ordered hosts to try for one query.
///
/// Built from a membership snapshot taken when the plan was requested. Liveness
/// is re-checked as each host is yielded, so a host that went down after the
/// snapshot is skipped. A plan is consumed once and cannot be restarted.
#[derive(Debug)]
pub struct QueryPlan {
    hosts: std::vec::IntoIter<Arc<Host>>,
}

impl QueryPlan {
    /// Plan over `hosts` in the given order.
    pub fn new(hosts: Vec<Arc<Host>>) -> Self {
        Self {
            hosts: hosts.into_iter(),
        }
    }

    /// A plan with no candidates.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Plan over `hosts` rotated to begin at `start`.
    pub fn rotated(mut hosts: Vec<Arc<Host>>, start: usize) -> Self {
        if !hosts.is_empty() {
            let len = hosts.len();
            hosts.rotate_left(start % len);
        }
        Self::new(hosts)
    }

    /// Append another plan's remaining hosts after this one's.
    pub fn chain(self, other: QueryPlan) -> Self {
        let mut hosts: Vec<Arc<Host>> = self.hosts.collect();
        hosts.extend(other.hosts);
        Self::new(hosts)
    }
}

impl Iterator for QueryPlan {
    type Item = Arc<Host>;

    fn next(&mut self) -> Option<Self::Item> {
        for host in self.hosts.by_ref() {
            if host.is_considerably_up() {
                return Some(host);
            }
            tracing::trace!(host = %host, "Skipping host that is not considerably up");
            metrics::record_host_skipped();
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.hosts.len()))
    }
}

impl FusedIterator for QueryPlan {}
