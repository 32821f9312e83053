//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{ClientConfig, ContactPointConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Where a running client gets its configuration from.
///
/// Contact points given outside the file (command line) are appended to every
/// load, so a reload never drops them.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    path: Option<PathBuf>,
    extra_contact_points: Vec<ContactPointConfig>,
}

impl ConfigSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            extra_contact_points: Vec::new(),
        }
    }

    pub fn with_contact_points<S: Into<String>>(mut self, addresses: impl IntoIterator<Item = S>) -> Self {
        self.extra_contact_points
            .extend(addresses.into_iter().map(ContactPointConfig::new));
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the file (or defaults when there is none) and merge extra contact points.
    pub fn load(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = match &self.path {
            Some(path) => load_config(path)?,
            None => ClientConfig::default(),
        };
        for cp in &self.extra_contact_points {
            if !config.contact_points.iter().any(|known| known.address == cp.address) {
                config.contact_points.push(cp.clone());
            }
        }
        Ok(config)
    }
}
