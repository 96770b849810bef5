//! Replay of closed buffer partitions.
//!
//! A drain pass opens one non-persistent transport, walks the closed
//! partitions in directory order, sends every non-blank line and deletes a
//! partition only after all of its lines went out. A transport failure ends
//! the pass and leaves the partition in place, so lines already sent from it
//! are sent again next time. A partition that cannot be read or deleted is
//! skipped so it never blocks the ones behind it.

#[cfg(test)]
mod tests;

use log::{debug, info, warn};

use crate::{
    buffer::{BufferPartition, BufferStore},
    error::{DeliveryError, DrainError},
    transport::{ConnectionConfig, Connector, SocketTransport, TcpConnector},
};

/// Replays a [`BufferStore`] to the collector.
pub struct Drainer<C: Connector = TcpConnector> {
    store: BufferStore,
    config: ConnectionConfig,
    connector: C,
}

impl Drainer<TcpConnector> {
    /// Drain `store` to the endpoint in `config` over TCP.
    ///
    /// `config` is converted with [`ConnectionConfig::for_drain`].
    pub fn new(store: BufferStore, config: ConnectionConfig) -> Self {
        Self::with_connector(store, config, TcpConnector)
    }
}

impl<C: Connector> Drainer<C> {
    pub fn with_connector(store: BufferStore, config: ConnectionConfig, connector: C) -> Self {
        Self {
            store,
            config: config.for_drain(),
            connector,
        }
    }

    pub fn store(&self) -> &BufferStore {
        &self.store
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Run one pass and return the partitions that were fully sent and
    /// deleted.
    ///
    /// Only a failure to list the buffer directory is returned as an error.
    /// A partition that cannot be read or removed is logged and skipped. A
    /// transport failure stops the pass; the failing partition and any not
    /// yet visited stay on disk.
    pub fn drain(&self) -> Result<Vec<BufferPartition>, DrainError> {
        let partitions = self
            .store
            .list_closed_partitions()
            .map_err(|source| DrainError::List {
                dir: self.store.dir().to_path_buf(),
                source,
            })?;
        if partitions.is_empty() {
            debug!("Drainer: no closed partitions in {}", self.store.dir().display());
            return Ok(Vec::new());
        }
        Ok(self.drain_partitions(partitions))
    }

    fn drain_partitions(&self, partitions: Vec<BufferPartition>) -> Vec<BufferPartition> {
        let mut transport =
            SocketTransport::with_connector(self.config.clone(), self.connector.clone());
        let mut processed = Vec::with_capacity(partitions.len());
        let mut sent_lines = 0usize;
        let mut skipped = 0usize;
        for partition in partitions {
            let lines = match partition.read_lines() {
                Ok(lines) => lines,
                Err(source) => {
                    let err = DrainError::Read {
                        path: partition.path().to_path_buf(),
                        source,
                    };
                    warn!("Drainer: skipping partition: {err}");
                    skipped += 1;
                    continue;
                }
            };
            if let Err(err) = replay(&mut transport, &lines) {
                warn!(
                    "Drainer: stopped at {} after {} partitions: {err}",
                    partition.path().display(),
                    processed.len()
                );
                break;
            }
            sent_lines += lines.len();
            if let Err(source) = partition.remove() {
                let err = DrainError::Remove {
                    path: partition.path().to_path_buf(),
                    source,
                };
                warn!("Drainer: lines sent but partition kept: {err}");
                skipped += 1;
                continue;
            }
            processed.push(partition);
        }
        transport.close();

        info!(
            "Drainer: replayed {sent_lines} lines from {} partitions to {} ({skipped} skipped)",
            processed.len(),
            self.config.endpoint()
        );
        processed
    }
}

fn replay<C: Connector>(
    transport: &mut SocketTransport<C>,
    lines: &[String],
) -> Result<(), DeliveryError> {
    lines.iter().try_for_each(|line| transport.write(line))
}
