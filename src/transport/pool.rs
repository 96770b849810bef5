//! Idle persistent connections shared between transport instances.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use super::connection::Connection;

/// Holds at most one idle connection per endpoint.
///
/// A persistent [`SocketTransport`](super::SocketTransport) parks its
/// connection here on `close()` and the next transport for the same endpoint
/// checks it out instead of dialling. The pool does not serialise use of a
/// checked-out connection; callers must not share one transport across
/// threads without their own locking.
pub struct ConnectionPool<T> {
    idle: Arc<Mutex<HashMap<String, T>>>,
}

impl<T> Clone for ConnectionPool<T> {
    fn clone(&self) -> Self {
        Self {
            idle: Arc::clone(&self.idle),
        }
    }
}

impl<T> Default for ConnectionPool<T> {
    fn default() -> Self {
        Self {
            idle: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Connection> ConnectionPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn checkout(&self, endpoint: &str) -> Option<T> {
        self.idle.lock().remove(endpoint)
    }

    /// Park `connection`, closing any connection it displaces.
    pub(crate) fn park(&self, endpoint: String, connection: T) {
        let displaced = self.idle.lock().insert(endpoint, connection);
        if let Some(mut old) = displaced {
            old.close();
        }
    }

    /// Number of idle connections.
    pub fn len(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close and forget every idle connection.
    pub fn clear(&self) {
        let drained: Vec<T> = self.idle.lock().drain().map(|(_, conn)| conn).collect();
        for mut conn in drained {
            conn.close();
        }
    }
}
