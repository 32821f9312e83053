//! Cluster host abstraction.
//!
//! # Responsibilities
//! - Represent a single cluster node, identified by its address
//! - Track raw liveness (Unknown/Up/Down) as signals arrive
//! - Debounce liveness into the "considerably up" flag used for selection

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use crate::observability::metrics;

/// Liveness state of a host.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Unknown = 0,
    Up = 1,
    Down = 2,
}

impl From<u8> for HostState {
    fn from(val: u8) -> Self {
        match val {
            1 => HostState::Up,
            2 => HostState::Down,
            _ => HostState::Unknown,
        }
    }
}

/// Consecutive-signal thresholds for flipping the considerably-up flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debounce {
    /// Consecutive up signals needed to re-enter selection.
    pub up_threshold: usize,
    /// Consecutive down signals needed to leave selection.
    pub down_threshold: usize,
}

impl Debounce {
    /// Flip on the first signal in either direction.
    pub const fn immediate() -> Self {
        Self {
            up_threshold: 1,
            down_threshold: 1,
        }
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self {
            up_threshold: 2,
            down_threshold: 3,
        }
    }
}

/// A single cluster node.
#[derive(Debug)]
pub struct Host {
    addr: SocketAddr,
    datacenter: Option<String>,
    debounce: Debounce,

    /// Raw liveness (0=Unknown, 1=Up, 2=Down).
    state: AtomicU8,
    considerably_up: AtomicBool,
    consecutive_downs: AtomicUsize,
    consecutive_ups: AtomicUsize,
}

impl Host {
    /// Create a newly discovered host. It starts `Unknown` and eligible for selection.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            datacenter: None,
            debounce: Debounce::default(),
            state: AtomicU8::new(HostState::Unknown as u8),
            considerably_up: AtomicBool::new(true),
            consecutive_downs: AtomicUsize::new(0),
            consecutive_ups: AtomicUsize::new(0),
        }
    }

    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }

    pub fn with_debounce(mut self, debounce: Debounce) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn datacenter(&self) -> Option<&str> {
        self.datacenter.as_deref()
    }

    /// Latest raw liveness state.
    pub fn state(&self) -> HostState {
        HostState::from(self.state.load(Ordering::Acquire))
    }

    /// Debounced liveness. Only this flag is consulted by query plans.
    pub fn is_considerably_up(&self) -> bool {
        self.considerably_up.load(Ordering::Acquire)
    }

    /// Record an up signal (successful connection or status event).
    pub fn mark_up(&self) {
        self.consecutive_downs.store(0, Ordering::Relaxed);
        self.state.store(HostState::Up as u8, Ordering::Release);

        if self.is_considerably_up() {
            return;
        }

        let ups = self.consecutive_ups.fetch_add(1, Ordering::Relaxed) + 1;
        if ups >= self.debounce.up_threshold
            && self
                .considerably_up
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            self.consecutive_ups.store(0, Ordering::Relaxed);
            tracing::info!(host = %self.addr, consecutive_ups = ups, "Host back in selection");
            metrics::record_host_state(&self.addr, true);
        }
    }

    /// Record a down signal (connection failure or status event).
    pub fn mark_down(&self) {
        self.consecutive_ups.store(0, Ordering::Relaxed);
        self.state.store(HostState::Down as u8, Ordering::Release);

        if !self.is_considerably_up() {
            return;
        }

        let downs = self.consecutive_downs.fetch_add(1, Ordering::Relaxed) + 1;
        if downs >= self.debounce.down_threshold
            && self
                .considerably_up
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            self.consecutive_downs.store(0, Ordering::Relaxed);
            tracing::warn!(host = %self.addr, consecutive_downs = downs, "Host removed from selection");
            metrics::record_host_state(&self.addr, false);
        }
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.datacenter {
            Some(dc) => write!(f, "{} ({})", self.addr, dc),
            None => write!(f, "{}", self.addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "10.0.0.1:9042".parse().unwrap()
    }

    #[test]
    fn new_host_is_unknown_but_selectable() {
        let host = Host::new(addr());
        assert_eq!(host.state(), HostState::Unknown);
        assert!(host.is_considerably_up());
    }

    #[test]
    fn down_signals_are_debounced() {
        let host = Host::new(addr()).with_debounce(Debounce {
            up_threshold: 2,
            down_threshold: 3,
        });

        host.mark_down();
        host.mark_down();
        assert_eq!(host.state(), HostState::Down);
        assert!(host.is_considerably_up());

        host.mark_down();
        assert!(!host.is_considerably_up());
    }

    #[test]
    fn flapping_does_not_leave_selection() {
        let host = Host::new(addr()).with_debounce(Debounce {
            up_threshold: 1,
            down_threshold: 2,
        });

        for _ in 0..10 {
            host.mark_down();
            host.mark_up();
        }
        assert!(host.is_considerably_up());
    }

    #[test]
    fn recovery_needs_consecutive_ups() {
        let host = Host::new(addr()).with_debounce(Debounce {
            up_threshold: 2,
            down_threshold: 1,
        });

        host.mark_down();
        assert!(!host.is_considerably_up());

        host.mark_up();
        assert_eq!(host.state(), HostState::Up);
        assert!(!host.is_considerably_up());

        host.mark_down();
        host.mark_up();
        assert!(!host.is_considerably_up());

        host.mark_up();
        assert!(host.is_considerably_up());
    }

    #[test]
    fn display_includes_datacenter() {
        let host = Host::new(addr()).with_datacenter("dc1");
        assert_eq!(host.to_string(), "10.0.0.1:9042 (dc1)");
        assert_eq!(host.datacenter(), Some("dc1"));
    }
}
