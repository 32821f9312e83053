//! Host selection and connection tuning for a distributed database client.
//!
//! A [`LoadBalancingPolicy`] turns the current cluster membership into an
//! ordered [`QueryPlan`] per query; a [`Connector`] opens connections to the
//! chosen hosts with the configured [`SocketOptions`].

pub mod cluster;
pub mod config;
pub mod error;
pub mod load_balancer;
pub mod net;
pub mod observability;

pub use cluster::{Host, HostRegistry, HostState, Metadata};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use load_balancer::{
    HostDistance, LoadBalancingPolicy, QueryContext, QueryPlan, RoundRobinPolicy,
};
pub use net::{Connector, SocketOptions};
