//! Line-oriented writer over a single outbound connection.

use std::io;

use log::{debug, warn};

use crate::error::{DeliveryError, FailureKind};

use super::{
    config::ConnectionConfig,
    connection::{Connection, Connector, TcpConnector, is_timeout},
    pool::ConnectionPool,
};

/// Writes newline-terminated lines to one endpoint.
///
/// The first failure to connect, configure, or write disables the transport
/// for the rest of its life: later writes return
/// [`DeliveryError::Unavailable`] without touching the network.
pub struct SocketTransport<C: Connector = TcpConnector> {
    config: ConnectionConfig,
    endpoint: String,
    connector: C,
    connection: Option<C::Connection>,
    pool: Option<ConnectionPool<C::Connection>>,
    failure: Option<FailureKind>,
}

impl SocketTransport<TcpConnector> {
    /// TCP transport for `config`.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connector> SocketTransport<C> {
    pub fn with_connector(config: ConnectionConfig, connector: C) -> Self {
        let endpoint = config.endpoint();
        Self {
            config,
            endpoint,
            connector,
            connection: None,
            pool: None,
            failure: None,
        }
    }

    /// Share idle persistent connections through `pool`.
    pub fn with_pool(mut self, pool: ConnectionPool<C::Connection>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Kind of the failure that disabled this transport, if any.
    pub fn failure(&self) -> Option<FailureKind> {
        self.failure
    }

    /// Whether a live connection is currently held.
    pub fn is_connected(&mut self) -> bool {
        self.connection.as_mut().is_some_and(|conn| conn.is_open())
    }

    /// Send `line` followed by a newline, connecting first if needed.
    pub fn write(&mut self, line: &str) -> Result<(), DeliveryError> {
        if let Some(previous) = self.failure {
            return Err(DeliveryError::Unavailable {
                endpoint: self.endpoint.clone(),
                previous,
            });
        }

        let mut connection = match self.take_open_connection() {
            Ok(conn) => conn,
            Err(err) => {
                warn!("SocketTransport: {err}; not retrying this transport");
                self.failure = Some(err.kind());
                return Err(err);
            }
        };

        let mut payload = String::with_capacity(line.len() + 1);
        payload.push_str(line);
        payload.push('\n');

        match send_all(&mut connection, payload.as_bytes(), &self.endpoint) {
            Ok(()) => {
                self.connection = Some(connection);
                Ok(())
            }
            Err(err) => {
                connection.close();
                warn!("SocketTransport: {err}; not retrying this transport");
                self.failure = Some(err.kind());
                Err(err)
            }
        }
    }

    /// Release the connection. Persistent connections stay open: they are
    /// parked in the pool when one is attached, otherwise kept for the next
    /// write on this transport.
    pub fn close(&mut self) {
        let Some(mut conn) = self.connection.take() else {
            return;
        };
        if !self.config.is_persistent() {
            conn.close();
            debug!("SocketTransport: closed connection to {}", self.endpoint);
            return;
        }
        match &self.pool {
            Some(pool) => {
                pool.park(self.endpoint.clone(), conn);
                debug!("SocketTransport: parked connection to {}", self.endpoint);
            }
            None => self.connection = Some(conn),
        }
    }

    /// Close the connection even when it is persistent.
    pub fn close_persistent(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            conn.close();
            debug!("SocketTransport: closed connection to {}", self.endpoint);
        }
    }

    fn take_open_connection(&mut self) -> Result<C::Connection, DeliveryError> {
        if let Some(mut conn) = self.connection.take() {
            if conn.is_open() {
                return Ok(conn);
            }
            debug!("SocketTransport: {} closed by peer; reconnecting", self.endpoint);
            conn.close();
        }
        self.connect()
    }

    fn connect(&self) -> Result<C::Connection, DeliveryError> {
        let mut conn = match self.checkout_idle() {
            Some(conn) => conn,
            None => self
                .connector
                .open(&self.config)
                .map_err(|source| DeliveryError::Connection {
                    endpoint: self.endpoint.clone(),
                    source,
                })?,
        };
        if let Err(source) = conn.set_timeout(self.config.io_timeout()) {
            conn.close();
            return Err(DeliveryError::ConnectionConfiguration {
                endpoint: self.endpoint.clone(),
                source,
            });
        }
        debug!("SocketTransport: connected to {}", self.endpoint);
        Ok(conn)
    }

    fn checkout_idle(&self) -> Option<C::Connection> {
        if !self.config.is_persistent() {
            return None;
        }
        let mut conn = self.pool.as_ref()?.checkout(&self.endpoint)?;
        if conn.is_open() {
            debug!("SocketTransport: reusing idle connection to {}", self.endpoint);
            Some(conn)
        } else {
            conn.close();
            None
        }
    }
}

impl<C: Connector> Drop for SocketTransport<C> {
    fn drop(&mut self) {
        self.close();
        self.close_persistent();
    }
}

/// Write `payload` in as many calls as the connection needs.
///
/// A zero-length write, a failed call, or a timeout reported while bytes are
/// still outstanding aborts the loop; partial progress is reported in the
/// error. A timeout before the first byte went out is a plain write failure.
fn send_all<T: Connection>(
    conn: &mut T,
    payload: &[u8],
    endpoint: &str,
) -> Result<(), DeliveryError> {
    let length = payload.len();
    let mut sent = 0;
    while sent < length {
        match conn.write(&payload[sent..]) {
            Ok(0) => {
                return Err(DeliveryError::Write {
                    endpoint: endpoint.to_owned(),
                    sent,
                    length,
                    source: io::Error::new(
                        io::ErrorKind::WriteZero,
                        "connection accepted no bytes",
                    ),
                });
            }
            Ok(chunk) => {
                sent = (sent + chunk).min(length);
                if sent < length && conn.timed_out() {
                    return Err(DeliveryError::WriteTimeout {
                        endpoint: endpoint.to_owned(),
                        sent,
                        length,
                    });
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if sent > 0 && (is_timeout(&err) || conn.timed_out()) => {
                return Err(DeliveryError::WriteTimeout {
                    endpoint: endpoint.to_owned(),
                    sent,
                    length,
                });
            }
            Err(source) => {
                return Err(DeliveryError::Write {
                    endpoint: endpoint.to_owned(),
                    sent,
                    length,
                    source,
                });
            }
        }
    }
    Ok(())
}
