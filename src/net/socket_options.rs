//! Low-level socket options for connections to cluster hosts.
//!
//! Optional fields are `None` until set. `None` means "leave the platform
//! default alone"; `Some` means the connector must apply exactly that value.
//! Values are not range-checked here; passing sensible timeouts and sizes is
//! the caller's responsibility.

use std::time::Duration;

use crate::config::schema::SocketConfig;

/// Connect timeout applied when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT_MILLIS: u64 = 5000;

/// Keep-alive interval applied when keep-alive is on but no interval is configured.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Immutable socket tuning shared by every connection of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOptions {
    connect_timeout: Duration,
    keep_alive: Option<bool>,
    keep_alive_interval: Duration,
    reuse_address: Option<bool>,
    so_linger: Option<u32>,
    tcp_no_delay: Option<bool>,
    receive_buffer_size: Option<u32>,
    send_buffer_size: Option<u32>,
}

impl SocketOptions {
    pub fn builder() -> SocketOptionsBuilder {
        SocketOptionsBuilder::default()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Saturates at `u64::MAX`.
    pub fn connect_timeout_millis(&self) -> u64 {
        u64::try_from(self.connect_timeout.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn keep_alive(&self) -> Option<bool> {
        self.keep_alive
    }

    /// Idle time between keep-alive probes. Only meaningful when keep-alive is on.
    pub fn keep_alive_interval(&self) -> Duration {
        self.keep_alive_interval
    }

    pub fn reuse_address(&self) -> Option<bool> {
        self.reuse_address
    }

    /// Linger time in seconds on close.
    pub fn so_linger(&self) -> Option<u32> {
        self.so_linger
    }

    pub fn tcp_no_delay(&self) -> Option<bool> {
        self.tcp_no_delay
    }

    pub fn receive_buffer_size(&self) -> Option<u32> {
        self.receive_buffer_size
    }

    pub fn send_buffer_size(&self) -> Option<u32> {
        self.send_buffer_size
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MILLIS),
            keep_alive: None,
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            reuse_address: None,
            so_linger: None,
            tcp_no_delay: None,
            receive_buffer_size: None,
            send_buffer_size: None,
        }
    }
}

/// Builder for [`SocketOptions`].
#[derive(Debug, Clone, Default)]
pub struct SocketOptionsBuilder {
    options: SocketOptions,
}

impl SocketOptionsBuilder {
    pub fn connect_timeout_millis(mut self, millis: u64) -> Self {
        self.options.connect_timeout = Duration::from_millis(millis);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    pub fn keep_alive(mut self, enabled: bool) -> Self {
        self.options.keep_alive = Some(enabled);
        self
    }

    pub fn keep_alive_interval(mut self, interval: Duration) -> Self {
        self.options.keep_alive_interval = interval;
        self
    }

    pub fn reuse_address(mut self, reuse: bool) -> Self {
        self.options.reuse_address = Some(reuse);
        self
    }

    pub fn so_linger(mut self, seconds: u32) -> Self {
        self.options.so_linger = Some(seconds);
        self
    }

    pub fn tcp_no_delay(mut self, no_delay: bool) -> Self {
        self.options.tcp_no_delay = Some(no_delay);
        self
    }

    pub fn receive_buffer_size(mut self, bytes: u32) -> Self {
        self.options.receive_buffer_size = Some(bytes);
        self
    }

    pub fn send_buffer_size(mut self, bytes: u32) -> Self {
        self.options.send_buffer_size = Some(bytes);
        self
    }

    pub fn build(self) -> SocketOptions {
        self.options
    }
}

impl From<&SocketConfig> for SocketOptions {
    fn from(config: &SocketConfig) -> Self {
        let mut builder = SocketOptions::builder()
            .connect_timeout_millis(config.connect_timeout_ms);

        if let Some(enabled) = config.keep_alive {
            builder = builder.keep_alive(enabled);
        }
        if let Some(ms) = config.keep_alive_interval_ms {
            builder = builder.keep_alive_interval(Duration::from_millis(ms));
        }
        if let Some(reuse) = config.reuse_address {
            builder = builder.reuse_address(reuse);
        }
        if let Some(secs) = config.so_linger_secs {
            builder = builder.so_linger(secs);
        }
        if let Some(no_delay) = config.tcp_no_delay {
            builder = builder.tcp_no_delay(no_delay);
        }
        if let Some(bytes) = config.receive_buffer_size {
            builder = builder.receive_buffer_size(bytes);
        }
        if let Some(bytes) = config.send_buffer_size {
            builder = builder.send_buffer_size(bytes);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = SocketOptions::builder().build();
        assert_eq!(options.connect_timeout_millis(), 5000);
        assert_eq!(options.keep_alive(), None);
        assert_eq!(options.keep_alive_interval(), Duration::from_secs(300));
        assert_eq!(options.reuse_address(), None);
        assert_eq!(options.so_linger(), None);
        assert_eq!(options.tcp_no_delay(), None);
        assert_eq!(options.receive_buffer_size(), None);
        assert_eq!(options.send_buffer_size(), None);
    }

    #[test]
    fn huge_connect_timeout_saturates() {
        let options = SocketOptions::builder().connect_timeout(Duration::MAX).build();
        assert_eq!(options.connect_timeout_millis(), u64::MAX);
    }

    #[test]
    fn keep_alive_keeps_default_interval() {
        let options = SocketOptions::builder().keep_alive(true).build();
        assert_eq!(options.keep_alive(), Some(true));
        assert_eq!(options.keep_alive_interval(), DEFAULT_KEEP_ALIVE_INTERVAL);

        let options = SocketOptions::builder()
            .keep_alive(true)
            .keep_alive_interval(Duration::from_secs(30))
            .build();
        assert_eq!(options.keep_alive_interval(), Duration::from_secs(30));
    }

    #[test]
    fn explicit_default_is_distinguishable_from_unset() {
        let unset = SocketOptions::builder().build();
        let off = SocketOptions::builder().keep_alive(false).tcp_no_delay(false).build();

        assert_eq!(unset.keep_alive(), None);
        assert_eq!(off.keep_alive(), Some(false));
        assert_eq!(off.tcp_no_delay(), Some(false));
        assert_ne!(unset, off);
    }

    #[test]
    fn chained_setters() {
        let options = SocketOptions::builder()
            .connect_timeout_millis(1500)
            .reuse_address(true)
            .so_linger(0)
            .tcp_no_delay(true)
            .receive_buffer_size(65536)
            .send_buffer_size(32768)
            .build();

        assert_eq!(options.connect_timeout(), Duration::from_millis(1500));
        assert_eq!(options.reuse_address(), Some(true));
        assert_eq!(options.so_linger(), Some(0));
        assert_eq!(options.tcp_no_delay(), Some(true));
        assert_eq!(options.receive_buffer_size(), Some(65536));
        assert_eq!(options.send_buffer_size(), Some(32768));
    }

    #[test]
    fn from_config_section() {
        let config = SocketConfig {
            connect_timeout_ms: 2000,
            keep_alive: Some(true),
            keep_alive_interval_ms: Some(10_000),
            tcp_no_delay: Some(true),
            ..SocketConfig::default()
        };
        let options = SocketOptions::from(&config);

        assert_eq!(options.connect_timeout_millis(), 2000);
        assert_eq!(options.keep_alive(), Some(true));
        assert_eq!(options.keep_alive_interval(), Duration::from_secs(10));
        assert_eq!(options.tcp_no_delay(), Some(true));
        assert_eq!(options.reuse_address(), None);
    }
}
