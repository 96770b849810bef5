//! Immutable connection settings consumed by [`SocketTransport`](super::SocketTransport).

use std::time::Duration;

use thiserror::Error;

/// Default collector host.
pub const DEFAULT_HOST: &str = "data.logentries.com";
/// Default collector port.
pub const DEFAULT_PORT: u16 = 80;
/// Default connect and I/O timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout used by the drainer, which replays whole partitions in one pass.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Rejected timeout value.
#[derive(Debug, Error, PartialEq)]
#[error("timeout must be 0 or a positive number of seconds (got {0})")]
pub struct InvalidTimeout(pub f64);

/// Convert fractional seconds into a timeout.
///
/// The value is split into whole seconds and a microsecond remainder,
/// rounded to the nearest microsecond. Zero yields `None`, meaning the
/// operation never times out.
pub fn timeout_from_secs(secs: f64) -> Result<Option<Duration>, InvalidTimeout> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(InvalidTimeout(secs));
    }
    let whole = secs.floor();
    let micros = ((secs - whole) * 1e6).round() as u32;
    let timeout = Duration::new(whole as u64, micros * 1_000);
    Ok((!timeout.is_zero()).then_some(timeout))
}

/// Endpoint and timing settings for one outbound connection.
///
/// Values are fixed once the transport is constructed; the `with_*` methods
/// consume and return a new value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    connect_timeout: Option<Duration>,
    io_timeout: Option<Duration>,
    persistent: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl ConnectionConfig {
    /// Target `host:port` with default timeouts and a persistent connection.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Some(DEFAULT_TIMEOUT),
            io_timeout: Some(DEFAULT_TIMEOUT),
            persistent: true,
        }
    }

    /// Settings for a bulk replay: non-persistent with the longer drain
    /// timeout.
    pub fn for_drain(self) -> Self {
        Self {
            connect_timeout: Some(DEFAULT_DRAIN_TIMEOUT),
            io_timeout: Some(DEFAULT_DRAIN_TIMEOUT),
            persistent: false,
            ..self
        }
    }

    /// Use `secs` for both the connect and the I/O timeout.
    pub fn with_timeout_secs(self, secs: f64) -> Result<Self, InvalidTimeout> {
        let timeout = timeout_from_secs(secs)?;
        Ok(Self {
            connect_timeout: timeout,
            io_timeout: timeout,
            ..self
        })
    }

    /// Override the connect timeout. `None` waits for the OS default.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Override the read/write timeout applied after connecting.
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Keep the connection open across `close()` calls.
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` string used in diagnostics and as the pool key.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }
}
