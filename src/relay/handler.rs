//! Relay that sends over the network and diverts failures to a fallback.

use std::{sync::Arc, time::Duration};

use log::warn;

use crate::{
    clock::{Clock, SystemClock},
    error::{DeliveryError, RelayError},
    rate_limited_warner::RateLimitedWarner,
    sink::FallbackSink,
    transport::{ConnectionConfig, Connector, SocketTransport, TcpConnector},
};

use super::line::PendingLine;

/// Sends routed lines through a [`SocketTransport`], writing them to an
/// optional [`FallbackSink`] when delivery fails.
///
/// With a fallback configured, transport errors never reach the caller; the
/// line is stored with a `DELAYED at <timestamp>` marker instead. Without
/// one, the transport error is returned as [`RelayError::DeliveryFailed`].
/// Errors from the fallback itself are always returned.
pub struct FemtoRelay<C: Connector = TcpConnector> {
    token: String,
    transport: SocketTransport<C>,
    fallback: Option<Box<dyn FallbackSink>>,
    clock: Arc<dyn Clock>,
    warner: RateLimitedWarner,
}

impl FemtoRelay<TcpConnector> {
    pub fn new(token: impl Into<String>, config: ConnectionConfig) -> Self {
        Self::with_transport(token, SocketTransport::new(config))
    }
}

impl<C: Connector> FemtoRelay<C> {
    pub fn with_transport(token: impl Into<String>, transport: SocketTransport<C>) -> Self {
        Self {
            token: token.into(),
            transport,
            fallback: None,
            clock: Arc::new(SystemClock),
            warner: RateLimitedWarner::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: impl FallbackSink + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Clock used for the deferral timestamp.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Minimum spacing between warnings about deferred lines.
    pub fn with_warn_interval(mut self, interval: Duration) -> Self {
        self.warner = RateLimitedWarner::new(interval);
        self
    }

    /// Replace or remove the fallback. Applies from the next write.
    pub fn set_fallback(&mut self, fallback: Option<Box<dyn FallbackSink>>) {
        self.fallback = fallback;
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn transport(&self) -> &SocketTransport<C> {
        &self.transport
    }

    /// Deliver `line`, prefixed with the routing token.
    pub fn write(&mut self, line: &str) -> Result<(), RelayError> {
        let pending = PendingLine::new(self.token.as_str(), line);
        match self.transport.write(&pending.render()) {
            Ok(()) => Ok(()),
            Err(err) => self.defer(&pending, err),
        }
    }

    fn defer(&mut self, pending: &PendingLine, err: DeliveryError) -> Result<(), RelayError> {
        let Some(fallback) = self.fallback.as_mut() else {
            return Err(RelayError::DeliveryFailed(err));
        };
        fallback
            .write(&pending.render_deferred(self.clock.now()))
            .map_err(RelayError::Fallback)?;
        self.warner.record();
        self.warner.warn_if_due(|count| {
            warn!("FemtoRelay deferred {count} lines to the fallback: {err}");
        });
        Ok(())
    }

    /// Close the transport (persistent connections stay open) and the
    /// fallback.
    pub fn close(&mut self) -> Result<(), RelayError> {
        self.transport.close();
        self.warner.flush(|count| {
            warn!("FemtoRelay deferred {count} lines to the fallback before closing");
        });
        match self.fallback.as_mut() {
            Some(fallback) => fallback.close().map_err(RelayError::Fallback),
            None => Ok(()),
        }
    }
}
