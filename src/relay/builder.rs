//! Builder for [`FemtoRelay`] and [`FemtoDeferredRelay`].
//!
//! Collects endpoint, token, timeout and buffer settings, validates them
//! once, and produces either relay flavour. Values may come from code or
//! from an INI file via [`RelayBuilder::from_ini_file`].

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::{
    buffer::BufferStore,
    transport::{
        ConnectionConfig, ConnectionPool, Connector, DEFAULT_HOST, DEFAULT_PORT, SocketTransport,
        TcpConnection, TcpConnector, timeout_from_secs,
    },
};

use super::{FemtoDeferredRelay, FemtoRelay};

/// Errors that may occur while building a relay.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    /// Invalid user supplied configuration.
    #[error("invalid relay configuration: {0}")]
    InvalidConfig(String),
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for relays targeting one collector endpoint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelayBuilder {
    pub(crate) token: Option<String>,
    pub(crate) host: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) timeout_secs: Option<f64>,
    pub(crate) connect_timeout_secs: Option<f64>,
    pub(crate) persistent: Option<bool>,
    pub(crate) buffer_dir: Option<PathBuf>,
    pub(crate) warn_interval: Option<Duration>,
}

impl RelayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the routing token prefixed to every line.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Target `host:port` instead of the default collector.
    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    /// Directory used as the fallback buffer, or as the only destination of
    /// a deferred relay.
    pub fn with_buffer_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.buffer_dir = Some(dir.into());
        self
    }

    option_setter!(
        /// Connect and I/O timeout in fractional seconds. Zero disables it.
        with_timeout_secs, timeout_secs, f64
    );
    option_setter!(
        /// Connect timeout in fractional seconds, overriding `timeout`.
        with_connect_timeout_secs, connect_timeout_secs, f64
    );
    option_setter!(
        /// Keep the connection open across `close()` calls.
        with_persistent, persistent, bool
    );
    option_setter!(
        /// Spacing between warnings about deferred lines.
        with_warn_interval, warn_interval, Duration
    );

    fn validate_token(&self) -> Result<String, BuildError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| BuildError::InvalidConfig("token is required".into()))?;
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(BuildError::InvalidConfig(format!(
                "token must be non-empty without whitespace (got {token:?})"
            )));
        }
        Ok(token.to_owned())
    }

    /// Resolve and validate the connection settings.
    pub fn connection_config(&self) -> Result<ConnectionConfig, BuildError> {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        if host.trim().is_empty() {
            return Err(BuildError::InvalidConfig("host must not be empty".into()));
        }
        let port = self.port.unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(BuildError::InvalidConfig(
                "port must be greater than zero".into(),
            ));
        }
        let mut config = ConnectionConfig::new(host, port);
        if let Some(secs) = self.timeout_secs {
            config = config
                .with_timeout_secs(secs)
                .map_err(|err| BuildError::InvalidConfig(format!("timeout: {err}")))?;
        }
        if let Some(secs) = self.connect_timeout_secs {
            let timeout = timeout_from_secs(secs)
                .map_err(|err| BuildError::InvalidConfig(format!("connect_timeout: {err}")))?;
            config = config.with_connect_timeout(timeout);
        }
        if let Some(persistent) = self.persistent {
            config = config.with_persistent(persistent);
        }
        Ok(config)
    }

    /// Build a TCP relay, buffering to `buffer_dir` when one is set.
    pub fn build(&self) -> Result<FemtoRelay, BuildError> {
        self.build_with_connector(TcpConnector)
    }

    /// Build a TCP relay whose persistent connection is shared through
    /// `pool` with other relays for the same endpoint.
    pub fn build_with_pool(
        &self,
        pool: ConnectionPool<TcpConnection>,
    ) -> Result<FemtoRelay, BuildError> {
        self.build_pooled(TcpConnector, pool)
    }

    pub fn build_with_connector<C: Connector>(
        &self,
        connector: C,
    ) -> Result<FemtoRelay<C>, BuildError> {
        self.build_relay(connector, None)
    }

    pub fn build_pooled<C: Connector>(
        &self,
        connector: C,
        pool: ConnectionPool<C::Connection>,
    ) -> Result<FemtoRelay<C>, BuildError> {
        self.build_relay(connector, Some(pool))
    }

    fn build_relay<C: Connector>(
        &self,
        connector: C,
        pool: Option<ConnectionPool<C::Connection>>,
    ) -> Result<FemtoRelay<C>, BuildError> {
        let token = self.validate_token()?;
        let mut transport = SocketTransport::with_connector(self.connection_config()?, connector);
        if let Some(pool) = pool {
            transport = transport.with_pool(pool);
        }
        let mut relay = FemtoRelay::with_transport(token, transport);
        if let Some(dir) = &self.buffer_dir {
            relay = relay.with_fallback(BufferStore::new(dir));
        }
        if let Some(interval) = self.warn_interval {
            relay = relay.with_warn_interval(interval);
        }
        Ok(relay)
    }

    /// Build a relay that only buffers; requires `buffer_dir`.
    pub fn build_deferred(&self) -> Result<FemtoDeferredRelay, BuildError> {
        self.build_deferred_with_connector(TcpConnector)
    }

    pub fn build_deferred_with_connector<C: Connector>(
        &self,
        connector: C,
    ) -> Result<FemtoDeferredRelay<C>, BuildError> {
        let token = self.validate_token()?;
        let dir = self.buffer_dir.as_ref().ok_or_else(|| {
            BuildError::InvalidConfig("buffer_dir is required for a deferred relay".into())
        })?;
        Ok(FemtoDeferredRelay::with_connector(
            token,
            BufferStore::new(dir),
            self.connection_config()?,
            connector,
        ))
    }
}
