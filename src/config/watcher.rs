//! Hot reload of the client configuration.
//!
//! The watcher re-reads its [`ConfigSource`] whenever the file changes and
//! forwards each distinct, valid configuration. [`apply_reload`] folds one into
//! a running cluster view.

use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::cluster::Metadata;
use crate::config::loader::ConfigSource;
use crate::config::schema::ClientConfig;

/// Watches the file behind a [`ConfigSource`].
pub struct ConfigWatcher {
    source: ConfigSource,
    update_tx: mpsc::UnboundedSender<ClientConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver of reloaded configurations.
    pub fn new(source: ConfigSource) -> (Self, mpsc::UnboundedReceiver<ClientConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (Self { source, update_tx }, update_rx)
    }

    /// Start watching. The returned watcher must be kept alive for events to flow.
    ///
    /// A source without a file has nothing to watch and is reported as a
    /// `notify` path error.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Some(path) = self.source.path().map(ToOwned::to_owned) else {
            return Err(notify::Error::generic("no configuration file to watch"));
        };

        let Self { source, update_tx } = self;
        // Editors emit several events per save; only forward real changes.
        let mut last_sent: Option<ClientConfig> = None;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch error");
                        return;
                    }
                };
                if !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }

                match source.load() {
                    Ok(config) if last_sent.as_ref() == Some(&config) => {
                        tracing::debug!("Config file touched without changes");
                    }
                    Ok(config) => {
                        last_sent = Some(config.clone());
                        if update_tx.send(config).is_err() {
                            tracing::debug!("Config receiver dropped; ignoring reload");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reload rejected, keeping current configuration");
                    }
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

/// Fold a reloaded configuration into a running cluster view.
///
/// Membership follows `next`. Every other section is fixed at startup: new
/// hosts get the current health thresholds, and each changed section is
/// logged as needing a restart. Returns `(added, removed)`.
pub fn apply_reload(current: &ClientConfig, next: &ClientConfig, registry: &Metadata) -> (usize, usize) {
    for section in current.fixed_section_changes(next) {
        tracing::warn!(section, "Configuration section changed; restart to apply it");
    }

    let membership = ClientConfig {
        contact_points: next.contact_points.clone(),
        ..current.clone()
    };
    let (added, removed) = registry.sync(membership.contact_hosts());
    tracing::info!(added, removed, hosts = registry.len(), "Configuration reloaded");
    (added, removed)
}
