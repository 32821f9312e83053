//! Cluster membership subsystem.
//!
//! # Data Flow
//! ```text
//! Contact points / config reload
//!     → registry.rs (Metadata: add, remove, sync)
//!     → host.rs (per-node liveness signals)
//!     → debounced "considerably up" flag
//!     → read by load balancing policies through HostRegistry
//! ```
//!
//! # Design Decisions
//! - Policies never own hosts; they read snapshots
//! - Liveness is debounced to keep flapping nodes out of plans
//! - Hosts are shared as `Arc<Host>`; all mutable state is atomic

pub mod host;
pub mod registry;

pub use host::{Debounce, Host, HostState};
pub use registry::{HostRegistry, Metadata};
