//! TCP keep-alive encoding and installation.
//!
//! The operating system takes keep-alive parameters as a fixed 12-byte
//! structure of three native-endian `u32` fields:
//!
//! ```text
//! offset 0  on_off                 (0 = off, 1 = on)
//! offset 4  keepalive_time_ms      idle time before the first probe
//! offset 8  keepalive_interval_ms  time between unanswered probes
//! ```
//!
//! Encoding is done field by field with explicit offsets so the bytes never
//! depend on compiler struct layout. Only the private `platform` module talks
//! to the socket.

use std::io;

use socket2::SockRef;
use thiserror::Error;

use crate::observability::metrics;

/// Size of the keep-alive control structure.
pub const KEEPALIVE_STRUCT_LEN: usize = 12;

const ON_OFF_OFFSET: usize = 0;
const TIME_OFFSET: usize = 4;
const INTERVAL_OFFSET: usize = 8;

/// Keep-alive could not be configured on a socket.
///
/// The connection itself may still be usable; the caller decides whether running
/// without keep-alive is acceptable.
#[derive(Debug, Error)]
pub enum KeepAliveError {
    /// The platform has no way to set these parameters.
    #[error("keep-alive configuration failed: unsupported on this platform: {0}")]
    Unsupported(#[source] io::Error),

    /// The platform call was made and refused.
    #[error("keep-alive configuration failed: {0}")]
    Rejected(#[source] io::Error),
}

impl From<io::Error> for KeepAliveError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::Unsupported => KeepAliveError::Unsupported(err),
            _ => KeepAliveError::Rejected(err),
        }
    }
}

/// Decoded form of the keep-alive control structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAliveValues {
    pub enabled: bool,
    pub time_ms: u32,
    pub interval_ms: u32,
}

impl KeepAliveValues {
    pub fn encode(&self) -> [u8; KEEPALIVE_STRUCT_LEN] {
        let mut buf = [0u8; KEEPALIVE_STRUCT_LEN];
        put_u32(&mut buf, ON_OFF_OFFSET, u32::from(self.enabled));
        put_u32(&mut buf, TIME_OFFSET, self.time_ms);
        put_u32(&mut buf, INTERVAL_OFFSET, self.interval_ms);
        buf
    }

    pub fn decode(buf: &[u8; KEEPALIVE_STRUCT_LEN]) -> Self {
        Self {
            enabled: get_u32(buf, ON_OFF_OFFSET) != 0,
            time_ms: get_u32(buf, TIME_OFFSET),
            interval_ms: get_u32(buf, INTERVAL_OFFSET),
        }
    }
}

fn put_u32(buf: &mut [u8; KEEPALIVE_STRUCT_LEN], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

fn get_u32(buf: &[u8; KEEPALIVE_STRUCT_LEN], offset: usize) -> u32 {
    let mut field = [0u8; 4];
    field.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_ne_bytes(field)
}

/// Encode keep-alive parameters into the OS control structure.
pub fn encode(enabled: bool, time_ms: u32, interval_ms: u32) -> [u8; KEEPALIVE_STRUCT_LEN] {
    KeepAliveValues {
        enabled,
        time_ms,
        interval_ms,
    }
    .encode()
}

/// Install keep-alive parameters on `socket`.
///
/// Failures are always returned, never swallowed.
pub fn install_keep_alive(
    socket: SockRef<'_>,
    enabled: bool,
    time_ms: u32,
    interval_ms: u32,
) -> Result<(), KeepAliveError> {
    let buf = encode(enabled, time_ms, interval_ms);
    platform::install(&socket, &buf).map_err(|err| {
        let err = KeepAliveError::from(err);
        tracing::warn!(enabled, time_ms, interval_ms, error = %err, "Keep-alive not applied");
        metrics::record_keepalive_failure();
        err
    })
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "macos",
    target_os = "ios",
    windows
))]
mod platform {
    use std::io;
    use std::time::Duration;

    use socket2::{SockRef, TcpKeepalive};

    use super::{KeepAliveValues, KEEPALIVE_STRUCT_LEN};

    pub(super) fn install(socket: &SockRef<'_>, buf: &[u8; KEEPALIVE_STRUCT_LEN]) -> io::Result<()> {
        let values = KeepAliveValues::decode(buf);
        if !values.enabled {
            return socket.set_keepalive(false);
        }

        let params = TcpKeepalive::new()
            .with_time(granular(values.time_ms))
            .with_interval(granular(values.interval_ms));
        socket.set_tcp_keepalive(&params)
    }

    /// Windows takes milliseconds; elsewhere the kernel counts whole seconds, so
    /// a non-zero sub-second value is rounded up rather than truncated to zero.
    fn granular(ms: u32) -> Duration {
        if cfg!(windows) {
            Duration::from_millis(u64::from(ms))
        } else {
            Duration::from_secs(u64::from(ms).div_ceil(1000))
        }
    }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "macos",
    target_os = "ios",
    windows
)))]
mod platform {
    use std::io;

    use socket2::SockRef;

    use super::KEEPALIVE_STRUCT_LEN;

    pub(super) fn install(_socket: &SockRef<'_>, _buf: &[u8; KEEPALIVE_STRUCT_LEN]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "TCP keep-alive parameters cannot be set on this platform",
        ))
    }
}
