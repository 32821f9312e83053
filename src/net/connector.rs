//! Outbound connections to cluster hosts.
//!
//! # Responsibilities
//! - Open TCP connections with the configured socket options
//! - Enforce the connect timeout
//! - Install keep-alive and report when it could not be applied
//! - Feed connection outcomes back into host liveness

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use socket2::SockRef;
use thiserror::Error;
use tokio::net::{TcpSocket, TcpStream};

use crate::cluster::Host;
use crate::net::keepalive::{install_keep_alive, KeepAliveError};
use crate::net::socket_options::SocketOptions;
use crate::observability::metrics;

/// Errors raised while opening a connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// A pre-connect socket option could not be applied.
    #[error("failed to configure socket for {addr}: {source}")]
    Socket { addr: SocketAddr, source: io::Error },

    /// The connect timeout elapsed.
    #[error("connect to {addr} timed out after {timeout:?}")]
    Timeout { addr: SocketAddr, timeout: Duration },

    /// The connect attempt or a post-connect option failed.
    #[error("connect to {addr} failed: {source}")]
    Io { addr: SocketAddr, source: io::Error },

    /// Connected, but keep-alive could not be installed. The stream is handed back.
    #[error("connected to {addr} without keep-alive: {source}")]
    KeepAlive {
        addr: SocketAddr,
        stream: TcpStream,
        source: KeepAliveError,
    },
}

impl ConnectError {
    /// The usable stream, if the connection itself succeeded.
    pub fn into_stream(self) -> Option<TcpStream> {
        match self {
            ConnectError::KeepAlive { stream, .. } => Some(stream),
            _ => None,
        }
    }
}

/// Opens connections with one shared set of socket options.
#[derive(Debug, Clone)]
pub struct Connector {
    options: Arc<SocketOptions>,
}

impl Connector {
    pub fn new(options: Arc<SocketOptions>) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SocketOptions {
        &self.options
    }

    /// Connect to `addr`, applying every option that was explicitly set.
    pub async fn connect(&self, addr: SocketAddr) -> Result<TcpStream, ConnectError> {
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        };
        let socket = socket.map_err(|source| ConnectError::Socket { addr, source })?;

        self.configure_socket(&socket)
            .map_err(|source| ConnectError::Socket { addr, source })?;

        let timeout = self.options.connect_timeout();
        let stream = match tokio::time::timeout(timeout, socket.connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                metrics::record_connect(&addr, "error");
                return Err(ConnectError::Io { addr, source });
            }
            Err(_) => {
                metrics::record_connect(&addr, "timeout");
                return Err(ConnectError::Timeout { addr, timeout });
            }
        };

        if let Some(no_delay) = self.options.tcp_no_delay() {
            stream
                .set_nodelay(no_delay)
                .map_err(|source| ConnectError::Io { addr, source })?;
        }

        if let Some(enabled) = self.options.keep_alive() {
            let interval_ms = self.keep_alive_interval_ms();
            if let Err(source) =
                install_keep_alive(SockRef::from(&stream), enabled, interval_ms, interval_ms)
            {
                metrics::record_connect(&addr, "keepalive_failed");
                return Err(ConnectError::KeepAlive {
                    addr,
                    stream,
                    source,
                });
            }
        }

        metrics::record_connect(&addr, "ok");
        tracing::debug!(
            peer = %addr,
            keep_alive = ?self.options.keep_alive(),
            tcp_no_delay = ?self.options.tcp_no_delay(),
            "Connection established"
        );
        Ok(stream)
    }

    /// Connect to `host` and report the outcome as a liveness signal.
    ///
    /// A keep-alive failure still counts as the host being up.
    pub async fn connect_host(&self, host: &Host) -> Result<TcpStream, ConnectError> {
        let result = self.connect(host.addr()).await;
        match &result {
            Ok(_) | Err(ConnectError::KeepAlive { .. }) => host.mark_up(),
            Err(e) => {
                tracing::debug!(host = %host, error = %e, "Connection attempt failed");
                host.mark_down();
            }
        }
        result
    }

    fn configure_socket(&self, socket: &TcpSocket) -> io::Result<()> {
        let sock = SockRef::from(socket);
        if let Some(reuse) = self.options.reuse_address() {
            sock.set_reuse_address(reuse)?;
        }
        if let Some(bytes) = self.options.receive_buffer_size() {
            sock.set_recv_buffer_size(bytes as usize)?;
        }
        if let Some(bytes) = self.options.send_buffer_size() {
            sock.set_send_buffer_size(bytes as usize)?;
        }
        if let Some(secs) = self.options.so_linger() {
            sock.set_linger(Some(Duration::from_secs(u64::from(secs))))?;
        }
        Ok(())
    }

    /// Keep-alive idle time and probe interval, saturated to the wire field width.
    fn keep_alive_interval_ms(&self) -> u32 {
        u32::try_from(self.options.keep_alive_interval().as_millis()).unwrap_or(u32::MAX)
    }
}
