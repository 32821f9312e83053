//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Host chosen from a query plan
//!     → connector.rs (open socket, apply options, connect with timeout)
//!     → socket_options.rs (only explicitly set values are applied)
//!     → keepalive.rs (encode 12-byte control structure, install)
//!     → Hand off stream to the execution pipeline
//! ```
//!
//! # Design Decisions
//! - Socket options are immutable and shared via Arc
//! - Unset options leave platform defaults untouched
//! - Keep-alive failures are reported, never swallowed
//! - Platform calls live behind one private module in keepalive.rs

pub mod connector;
pub mod keepalive;
pub mod socket_options;

pub use connector::{ConnectError, Connector};
pub use keepalive::{install_keep_alive, KeepAliveError, KeepAliveValues, KEEPALIVE_STRUCT_LEN};
pub use socket_options::{SocketOptions, SocketOptionsBuilder};
