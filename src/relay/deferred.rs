//! Relay that always buffers locally and ships on demand.

use crate::{
    buffer::{BufferPartition, BufferStore},
    drain::Drainer,
    error::{DrainError, RelayError},
    transport::{ConnectionConfig, Connector, TcpConnector},
};

use super::line::PendingLine;

/// Writes every line to a [`BufferStore`]; an external scheduler calls
/// [`drain`](Self::drain) to replay closed partitions.
///
/// Keeps the caller's write path off the network entirely.
pub struct FemtoDeferredRelay<C: Connector = TcpConnector> {
    token: String,
    store: BufferStore,
    drainer: Drainer<C>,
}

impl FemtoDeferredRelay<TcpConnector> {
    pub fn new(token: impl Into<String>, store: BufferStore, config: ConnectionConfig) -> Self {
        Self::with_connector(token, store, config, TcpConnector)
    }
}

impl<C: Connector> FemtoDeferredRelay<C> {
    pub fn with_connector(
        token: impl Into<String>,
        store: BufferStore,
        config: ConnectionConfig,
        connector: C,
    ) -> Self {
        let drainer = Drainer::with_connector(store.clone(), config, connector);
        Self {
            token: token.into(),
            store,
            drainer,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn store(&self) -> &BufferStore {
        &self.store
    }

    pub fn drainer(&self) -> &Drainer<C> {
        &self.drainer
    }

    /// Append `line`, prefixed with the routing token, to the current
    /// partition.
    pub fn write(&mut self, line: &str) -> Result<(), RelayError> {
        let pending = PendingLine::new(self.token.as_str(), line);
        self.store
            .append(&pending.render())
            .map_err(RelayError::Fallback)
    }

    /// Replay closed partitions; see [`Drainer::drain`].
    pub fn drain(&self) -> Result<Vec<BufferPartition>, DrainError> {
        self.drainer.drain()
    }

    /// Nothing is held open between writes.
    pub fn close(&mut self) -> Result<(), RelayError> {
        Ok(())
    }
}
