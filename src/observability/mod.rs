//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging with fields, not formatted strings
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

use crate::config::ObservabilityConfig;

/// Install logging, then the metrics exporter when enabled.
///
/// Must be called once, from within a Tokio runtime when metrics are on.
pub fn init(config: &ObservabilityConfig) -> crate::Result<()> {
    logging::init_logging(&config.log_level)?;
    if config.metrics_enabled {
        metrics::init_metrics(config.metrics_address.parse()?)?;
    }
    Ok(())
}
