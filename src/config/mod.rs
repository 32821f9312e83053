//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → SocketOptions / policy / registry built from it
//!
//! On file change:
//!     watcher.rs detects change
//!     → ConfigSource reloads, validates, re-merges command-line contact points
//!     → new config sent to the owner
//!     → apply_reload re-syncs the registry, warns on startup-only sections
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError, ConfigSource};
pub use schema::{
    ClientConfig, ContactPointConfig, HealthConfig, ObservabilityConfig, PolicyConfig,
    PolicyKind, SocketConfig,
};
pub use validation::ValidationError;
pub use watcher::{apply_reload, ConfigWatcher};
