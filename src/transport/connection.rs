//! Connection primitives for the socket transport.
//!
//! [`Connection`] is the narrow surface the transport drives: partial writes,
//! timeout configuration, timeout and EOF reporting. [`Connector`] opens
//! connections so tests can swap the TCP implementation for a scripted one.

use std::{
    io::{self, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    time::{Duration, Instant},
};

use super::config::ConnectionConfig;

/// An open, exclusively owned outbound connection.
pub trait Connection: Send {
    /// Write some prefix of `buf`, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Apply a read/write timeout. `None` disables it.
    fn set_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Whether the last operation stopped because the timeout elapsed.
    fn timed_out(&self) -> bool;

    /// Whether the connection is still usable. Returns `false` once the peer
    /// has closed its side or [`close`](Connection::close) was called.
    fn is_open(&mut self) -> bool;

    /// Close the connection. Idempotent.
    fn close(&mut self);
}

/// Factory for [`Connection`] values.
pub trait Connector: Clone + Send {
    type Connection: Connection;

    /// Dial the endpoint described by `config` within its connect timeout.
    fn open(&self, config: &ConnectionConfig) -> io::Result<Self::Connection>;
}

pub(crate) fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Plain TCP connector.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Connection = TcpConnection;

    fn open(&self, config: &ConnectionConfig) -> io::Result<TcpConnection> {
        connect_tcp(config).map(TcpConnection::new)
    }
}

fn connect_tcp(config: &ConnectionConfig) -> io::Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (config.host(), config.port())
        .to_socket_addrs()?
        .collect();
    let mut last_err = None;
    for addr in addrs {
        let attempt = match config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => {
                stream.set_nonblocking(false)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no addresses resolved for {}", config.endpoint()),
        )
    }))
}

/// Idle time after which [`TcpConnection::is_open`] probes the socket for
/// EOF. A connection written to more recently is reported open without a
/// probe; a peer close during a burst surfaces as a write error instead.
pub const EOF_PROBE_IDLE: Duration = Duration::from_millis(500);

/// TCP stream wrapped as a [`Connection`].
#[derive(Debug)]
pub struct TcpConnection {
    stream: Option<TcpStream>,
    timed_out: bool,
    last_write: Option<Instant>,
}

impl TcpConnection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream: Some(stream),
            timed_out: false,
            last_write: None,
        }
    }

    fn stream(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "connection closed"))
    }

    /// Probe for EOF without consuming data. Pending inbound bytes count as
    /// open.
    fn peer_open(stream: &TcpStream) -> io::Result<bool> {
        stream.set_nonblocking(true)?;
        let mut probe = [0u8; 1];
        let open = match stream.peek(&mut probe) {
            Ok(0) => false,
            Ok(_) => true,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => true,
            Err(_) => false,
        };
        stream.set_nonblocking(false)?;
        Ok(open)
    }
}

impl Connection for TcpConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.timed_out = false;
        let result = self.stream()?.write(buf);
        match &result {
            Ok(_) => self.last_write = Some(Instant::now()),
            Err(err) if is_timeout(err) => self.timed_out = true,
            Err(_) => {}
        }
        result
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let stream = self.stream()?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)
    }

    fn timed_out(&self) -> bool {
        self.timed_out
    }

    fn is_open(&mut self) -> bool {
        let Some(stream) = self.stream.as_ref() else {
            return false;
        };
        if self
            .last_write
            .is_some_and(|at| at.elapsed() < EOF_PROBE_IDLE)
        {
            return true;
        }
        Self::peer_open(stream).unwrap_or(false)
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        self.close();
    }
}
