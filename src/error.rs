//! Error types shared by the transport, relay and drain layers.
//!
//! Transport failures are split into the four kinds callers need to tell
//! apart when deciding between falling back and propagating. Filesystem
//! failures are reported separately because nothing sits beneath the local
//! buffer to absorb them.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Coarse classification of a transport failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Dialling the endpoint failed.
    Connection,
    /// The connection opened but its timeout could not be applied.
    ConnectionConfiguration,
    /// A write call failed outright.
    Write,
    /// A write made partial progress and then timed out.
    WriteTimeout,
}

impl FailureKind {
    /// Whether the failure happened before any bytes could be written.
    pub fn is_connect(self) -> bool {
        matches!(
            self,
            FailureKind::Connection | FailureKind::ConnectionConfiguration
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Connection => "connection",
            FailureKind::ConnectionConfiguration => "connection configuration",
            FailureKind::Write => "write",
            FailureKind::WriteTimeout => "write timeout",
        };
        f.write_str(label)
    }
}

/// Failure reported by [`SocketTransport`](crate::transport::SocketTransport).
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Dialling `endpoint` failed or timed out.
    #[error("failed connecting to {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// The I/O timeout could not be applied to an open connection.
    #[error("failed setting timeout on connection to {endpoint}: {source}")]
    ConnectionConfiguration {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// A write call failed (broken pipe, reset, peer closed mid-line), or
    /// timed out before any byte of the line was accepted.
    #[error("error writing to {endpoint} after {sent} of {length} bytes: {source}")]
    Write {
        endpoint: String,
        sent: usize,
        length: usize,
        #[source]
        source: io::Error,
    },
    /// Part of the line was written, then the connection reported a
    /// timeout. `sent` is always non-zero.
    #[error("timed out writing to {endpoint} after {sent} of {length} bytes")]
    WriteTimeout {
        endpoint: String,
        sent: usize,
        length: usize,
    },
    /// The transport failed earlier in its lifetime and no longer dials or
    /// writes.
    #[error("{endpoint} unavailable after an earlier {previous} failure")]
    Unavailable {
        endpoint: String,
        previous: FailureKind,
    },
}

impl DeliveryError {
    /// Classify the error. A short-circuited write reports the kind of the
    /// failure that disabled the transport.
    pub fn kind(&self) -> FailureKind {
        match self {
            DeliveryError::Connection { .. } => FailureKind::Connection,
            DeliveryError::ConnectionConfiguration { .. } => FailureKind::ConnectionConfiguration,
            DeliveryError::Write { .. } => FailureKind::Write,
            DeliveryError::WriteTimeout { .. } => FailureKind::WriteTimeout,
            DeliveryError::Unavailable { previous, .. } => *previous,
        }
    }

    /// Endpoint (`host:port`) the failure relates to.
    pub fn endpoint(&self) -> &str {
        match self {
            DeliveryError::Connection { endpoint, .. }
            | DeliveryError::ConnectionConfiguration { endpoint, .. }
            | DeliveryError::Write { endpoint, .. }
            | DeliveryError::WriteTimeout { endpoint, .. }
            | DeliveryError::Unavailable { endpoint, .. } => endpoint,
        }
    }
}

/// Failure surfaced by [`FemtoRelay`](crate::relay::FemtoRelay) and
/// [`FemtoDeferredRelay`](crate::relay::FemtoDeferredRelay).
#[derive(Debug, Error)]
pub enum RelayError {
    /// Delivery failed and no fallback sink was configured.
    #[error("could not deliver line and no fallback is available: {0}")]
    DeliveryFailed(#[source] DeliveryError),
    /// The fallback sink (usually the local buffer) failed.
    #[error("fallback sink failed: {0}")]
    Fallback(#[source] io::Error),
}

impl RelayError {
    /// Underlying transport error when delivery failed without a fallback.
    pub fn delivery_error(&self) -> Option<&DeliveryError> {
        match self {
            RelayError::DeliveryFailed(err) => Some(err),
            RelayError::Fallback(_) => None,
        }
    }
}

/// Filesystem failure during a drain pass.
///
/// [`Drainer::drain`](crate::Drainer::drain) returns `List`; `Read` and
/// `Remove` are logged against the partition they concern and the pass
/// moves on.
#[derive(Debug, Error)]
pub enum DrainError {
    /// The buffer directory could not be enumerated.
    #[error("failed to list buffer partitions in {dir}: {source}")]
    List {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A closed partition could not be read.
    #[error("failed to read buffer partition {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A fully replayed partition could not be removed.
    #[error("failed to remove drained partition {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FailureKind::Connection, true)]
    #[case(FailureKind::ConnectionConfiguration, true)]
    #[case(FailureKind::Write, false)]
    #[case(FailureKind::WriteTimeout, false)]
    fn connect_kinds_are_flagged(#[case] kind: FailureKind, #[case] expected: bool) {
        assert_eq!(kind.is_connect(), expected);
    }

    #[rstest]
    fn unavailable_reports_previous_kind() {
        let err = DeliveryError::Unavailable {
            endpoint: "127.0.0.1:1".into(),
            previous: FailureKind::WriteTimeout,
        };
        assert_eq!(err.kind(), FailureKind::WriteTimeout);
        assert_eq!(err.endpoint(), "127.0.0.1:1");
        assert!(err.to_string().contains("write timeout"));
    }

    #[rstest]
    fn delivery_failed_exposes_cause() {
        let err = RelayError::DeliveryFailed(DeliveryError::WriteTimeout {
            endpoint: "logs:80".into(),
            sent: 3,
            length: 10,
        });
        let cause = err.delivery_error().expect("cause retained");
        assert_eq!(cause.kind(), FailureKind::WriteTimeout);
        assert!(err.to_string().contains("3 of 10 bytes"));
    }
}
