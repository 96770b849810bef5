#![allow(dead_code)]

//! Fixtures shared by the integration tests: a line-collecting TCP peer and
//! an address nothing listens on.

use std::{
    io::{BufRead, BufReader},
    net::{SocketAddr, TcpListener},
    sync::mpsc,
    thread,
    time::Duration,
};

use rstest::fixture;

/// Loopback collector that records every line it receives.
pub struct Collector {
    pub addr: SocketAddr,
    lines: mpsc::Receiver<String>,
}

impl Collector {
    /// Wait for `count` lines, failing the test after two seconds.
    pub fn expect_lines(&self, count: usize) -> Vec<String> {
        (0..count)
            .map(|idx| {
                self.lines
                    .recv_timeout(Duration::from_secs(2))
                    .unwrap_or_else(|_| panic!("line {} of {count} not received", idx + 1))
            })
            .collect()
    }

    /// Assert nothing further arrives within a short grace period.
    pub fn expect_silence(&self) {
        assert!(
            self.lines.recv_timeout(Duration::from_millis(200)).is_err(),
            "unexpected extra line"
        );
    }
}

/// Start a collector accepting any number of connections.
#[fixture]
pub fn collector() -> Collector {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("listener has address");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let tx = tx.clone();
            thread::spawn(move || {
                for line in BufReader::new(stream).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        }
    });
    Collector { addr, lines: rx }
}

/// Loopback address whose listener has already been dropped.
#[fixture]
pub fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    listener.local_addr().expect("listener has address")
}
