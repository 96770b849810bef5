//! Ship log lines to a remote collector over TCP, buffering them on local
//! disk when the collector cannot be reached and replaying the buffer later.
//!
//! The crate moves opaque, already formatted lines. A [`FemtoRelay`] sends
//! each line through a [`SocketTransport`] and falls back to a
//! [`FallbackSink`], usually a [`BufferStore`], when delivery fails. A
//! [`Drainer`] replays closed buffer partitions and removes them once sent.
//! Everything runs synchronously on the caller's thread.

pub mod buffer;
pub mod clock;
pub mod drain;
pub mod error;
mod file_config;
pub mod rate_limited_warner;
pub mod relay;
pub mod sink;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

pub use buffer::{BufferPartition, BufferStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use drain::Drainer;
pub use error::{DeliveryError, DrainError, FailureKind, RelayError};
pub use file_config::ConfigError;
pub use relay::{BuildError, FemtoDeferredRelay, FemtoRelay, PendingLine, RelayBuilder};
pub use sink::FallbackSink;
pub use transport::{
    Connection, ConnectionConfig, ConnectionPool, Connector, SocketTransport, TcpConnector,
};
