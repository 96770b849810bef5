//! Test doubles for exercising the transport without a network.
//!
//! [`ScriptedConnector`] hands out [`ScriptedConnection`]s that share one
//! script: how many bytes each write accepts, which write call fails or
//! times out, whether dials are refused. Clones of a connector share the
//! same script and the same record of what was written.

use std::{io, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::transport::{Connection, ConnectionConfig, Connector};

#[derive(Debug, Default)]
struct Script {
    refuse: bool,
    reject_timeouts: bool,
    max_chunk: Option<usize>,
    fail_call: Option<usize>,
    timeout_call: Option<usize>,
    stall_call: Option<usize>,
    dials: usize,
    write_calls: usize,
    closes: usize,
    eof_through: usize,
    timeouts: Vec<Option<Duration>>,
    written: Vec<u8>,
}

/// Connector whose connections follow a shared script.
#[derive(Clone, Debug, Default)]
pub struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every dial.
    pub fn refusing() -> Self {
        let connector = Self::new();
        connector.script.lock().refuse = true;
        connector
    }

    /// Toggle dial refusal for later dials.
    pub fn set_refusing(&self, refuse: bool) {
        self.script.lock().refuse = refuse;
    }

    /// Fail every attempt to apply a timeout.
    pub fn rejecting_timeouts(self) -> Self {
        self.script.lock().reject_timeouts = true;
        self
    }

    /// Accept at most `bytes` per write call.
    pub fn with_max_chunk(self, bytes: usize) -> Self {
        self.script.lock().max_chunk = Some(bytes);
        self
    }

    /// Make the `call`th write call (1-based, counted across connections)
    /// fail with a broken pipe. Fires once.
    pub fn fail_write_call(&self, call: usize) {
        self.script.lock().fail_call = Some(call);
    }

    /// Make the `call`th write call accept half its buffer and report a
    /// timeout. Fires once.
    pub fn time_out_write_call(&self, call: usize) {
        self.script.lock().timeout_call = Some(call);
    }

    /// Make the `call`th write call accept nothing and fail with a timeout.
    /// Fires once.
    pub fn stall_write_call(&self, call: usize) {
        self.script.lock().stall_call = Some(call);
    }

    /// Simulate the peer closing every connection opened so far.
    pub fn close_from_peer(&self) {
        let mut script = self.script.lock();
        script.eof_through = script.dials;
    }

    pub fn dials(&self) -> usize {
        self.script.lock().dials
    }

    pub fn write_calls(&self) -> usize {
        self.script.lock().write_calls
    }

    pub fn closes(&self) -> usize {
        self.script.lock().closes
    }

    /// Timeouts applied to connections, in order.
    pub fn applied_timeouts(&self) -> Vec<Option<Duration>> {
        self.script.lock().timeouts.clone()
    }

    /// Everything written so far, decoded lossily.
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.script.lock().written).into_owned()
    }

    /// Complete lines written so far, without terminators.
    pub fn lines(&self) -> Vec<String> {
        self.written()
            .split_terminator('\n')
            .map(str::to_owned)
            .collect()
    }
}

impl Connector for ScriptedConnector {
    type Connection = ScriptedConnection;

    fn open(&self, config: &ConnectionConfig) -> io::Result<ScriptedConnection> {
        let mut script = self.script.lock();
        script.dials += 1;
        if script.refuse {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("{} refused connection", config.endpoint()),
            ));
        }
        Ok(ScriptedConnection {
            id: script.dials,
            script: Arc::clone(&self.script),
            timed_out: false,
            closed: false,
        })
    }
}

/// Connection produced by [`ScriptedConnector`].
#[derive(Debug)]
pub struct ScriptedConnection {
    id: usize,
    script: Arc<Mutex<Script>>,
    timed_out: bool,
    closed: bool,
}

impl Connection for ScriptedConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
        }
        let mut script = self.script.lock();
        script.write_calls += 1;
        let call = script.write_calls;
        if script.fail_call == Some(call) {
            script.fail_call = None;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted failure"));
        }
        if script.stall_call == Some(call) {
            script.stall_call = None;
            self.timed_out = true;
            return Err(io::Error::new(io::ErrorKind::TimedOut, "scripted stall"));
        }
        let mut accepted = script.max_chunk.map_or(buf.len(), |max| buf.len().min(max));
        if script.timeout_call == Some(call) {
            script.timeout_call = None;
            accepted = (buf.len() / 2).max(1).min(accepted);
            self.timed_out = true;
        }
        script.written.extend_from_slice(&buf[..accepted]);
        Ok(accepted)
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let mut script = self.script.lock();
        if script.reject_timeouts {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "scripted timeout rejection"));
        }
        script.timeouts.push(timeout);
        Ok(())
    }

    fn timed_out(&self) -> bool {
        self.timed_out
    }

    fn is_open(&mut self) -> bool {
        !self.closed && self.id > self.script.lock().eof_through
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.script.lock().closes += 1;
        }
    }
}
