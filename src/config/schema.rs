//! Configuration schema definitions.
//!
//! This module defines the complete client configuration structure.
//! All types derive Serde traits for deserialization from config files.

use std::net::{AddrParseError, IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::cluster::{Debounce, Host};
use crate::net::socket_options::DEFAULT_CONNECT_TIMEOUT_MILLIS;

/// Port used when a contact point omits one.
pub const DEFAULT_PORT: u16 = 9042;

/// Root configuration for the client.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Initial cluster members.
    pub contact_points: Vec<ContactPointConfig>,

    /// Load balancing policy selection.
    pub policy: PolicyConfig,

    /// Socket tuning for host connections.
    pub socket: SocketConfig,

    /// Liveness debounce thresholds.
    pub health: HealthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ClientConfig {
    /// Hosts for every contact point that parses. Invalid entries are skipped.
    pub fn contact_hosts(&self) -> Vec<Host> {
        let debounce = Debounce::from(&self.health);
        self.contact_points
            .iter()
            .filter_map(|cp| match cp.socket_addr() {
                Ok(addr) => {
                    let host = Host::new(addr).with_debounce(debounce);
                    Some(match &cp.datacenter {
                        Some(dc) => host.with_datacenter(dc.clone()),
                        None => host,
                    })
                }
                Err(e) => {
                    tracing::warn!(address = %cp.address, error = %e, "Skipping invalid contact point");
                    None
                }
            })
            .collect()
    }

    /// Sections that differ from `next` but are only read at startup.
    ///
    /// Contact points are the one section a running client follows on reload.
    pub fn fixed_section_changes(&self, next: &ClientConfig) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.policy != next.policy {
            changed.push("policy");
        }
        if self.socket != next.socket {
            changed.push("socket");
        }
        if self.health != next.health {
            changed.push("health");
        }
        if self.observability != next.observability {
            changed.push("observability");
        }
        changed
    }
}

/// One cluster node known up front.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ContactPointConfig {
    /// `ip:port` or bare `ip` (port defaults to 9042).
    pub address: String,

    /// Datacenter the node lives in, if known.
    #[serde(default)]
    pub datacenter: Option<String>,
}

impl ContactPointConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            datacenter: None,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        match self.address.parse::<SocketAddr>() {
            Ok(addr) => Ok(addr),
            Err(e) => match self.address.parse::<IpAddr>() {
                Ok(ip) => Ok(SocketAddr::new(ip, DEFAULT_PORT)),
                Err(_) => Err(e),
            },
        }
    }
}

/// Available load balancing policies.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    RoundRobin,
    DcAwareRoundRobin,
}

/// Load balancing policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PolicyConfig {
    pub kind: PolicyKind,

    /// Local datacenter (required for `dc_aware_round_robin`).
    pub local_dc: Option<String>,

    /// Hosts per remote datacenter eligible as failover (0 disables remote hosts).
    pub used_hosts_per_remote_dc: usize,
}

/// Socket tuning. Absent optional keys leave the platform default in place.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct SocketConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    pub keep_alive: Option<bool>,

    /// Keep-alive probe interval in milliseconds (default 5 minutes).
    pub keep_alive_interval_ms: Option<u64>,

    pub reuse_address: Option<bool>,

    /// SO_LINGER in seconds.
    pub so_linger_secs: Option<u32>,

    /// Disable Nagle's algorithm.
    pub tcp_no_delay: Option<bool>,

    pub receive_buffer_size: Option<u32>,

    pub send_buffer_size: Option<u32>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MILLIS,
            keep_alive: None,
            keep_alive_interval_ms: None,
            reuse_address: None,
            so_linger_secs: None,
            tcp_no_delay: None,
            receive_buffer_size: None,
            send_buffer_size: None,
        }
    }
}

/// Liveness debounce configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct HealthConfig {
    /// Number of consecutive up signals before a host re-enters query plans.
    pub up_threshold: usize,

    /// Number of consecutive down signals before a host leaves query plans.
    pub down_threshold: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        let debounce = Debounce::default();
        Self {
            up_threshold: debounce.up_threshold,
            down_threshold: debounce.down_threshold,
        }
    }
}

impl From<&HealthConfig> for Debounce {
    fn from(config: &HealthConfig) -> Self {
        Debounce {
            up_threshold: config.up_threshold,
            down_threshold: config.down_threshold,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
