//! Outbound socket transport.
//!
//! [`SocketTransport`] owns one connection to a fixed `host:port`, connects
//! lazily within the configured timeout, writes each line in as many calls
//! as the socket needs, and detects timeouts and peer-closed connections.
//! A failure disables the transport for the rest of its life so callers can
//! divert to a fallback without paying for repeated dial attempts.

mod config;
mod connection;
mod pool;
mod socket;


pub use config::{
    ConnectionConfig, DEFAULT_DRAIN_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT,
    InvalidTimeout, timeout_from_secs,
};
pub use connection::{Connection, Connector, EOF_PROBE_IDLE, TcpConnection, TcpConnector};
pub use pool::ConnectionPool;
pub use socket::SocketTransport;
