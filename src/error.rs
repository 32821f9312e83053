//! Crate-level error type.

use std::net::AddrParseError;

use thiserror::Error;

use crate::config::ConfigError;
use crate::net::{ConnectError, KeepAliveError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    KeepAlive(#[from] KeepAliveError),

    #[error("logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(#[from] AddrParseError),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("config watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("{0}")]
    Usage(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_pass_through() {
        let err = Error::from(ConfigError::Validation(Vec::new()));
        assert!(matches!(err, Error::Config(ConfigError::Validation(_))));
        assert_eq!(err.to_string(), "Validation failed: ");
    }

    #[test]
    fn bad_metrics_address() {
        let err: Error = "not-an-address".parse::<std::net::SocketAddr>().unwrap_err().into();
        assert!(err.to_string().starts_with("invalid metrics address"));
    }
}
