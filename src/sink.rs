//! Secondary destinations used when the network path is unavailable.

use std::io;

/// Destination that accepts lines the transport could not deliver.
///
/// Errors are not absorbed by the caller: a failing fallback is fatal for
/// the write that triggered it.
pub trait FallbackSink: Send {
    /// Persist a single line. Implementations append their own terminator.
    fn write(&mut self, line: &str) -> io::Result<()>;

    /// Release any resources held by the sink.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: FallbackSink + ?Sized> FallbackSink for Box<S> {
    fn write(&mut self, line: &str) -> io::Result<()> {
        (**self).write(line)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}
