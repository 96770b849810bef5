//! Caller-facing relays.
//!
//! [`FemtoRelay`] hides connect, retry and fallback decisions behind a
//! single `write`/`close` pair. [`FemtoDeferredRelay`] writes straight to
//! the local buffer and ships it when [`drain`](FemtoDeferredRelay::drain)
//! is called. [`RelayBuilder`] assembles either from validated settings.

mod builder;
mod deferred;
mod handler;
mod line;


pub use builder::{BuildError, RelayBuilder};
pub use deferred::FemtoDeferredRelay;
pub use handler::FemtoRelay;
pub use line::{DEFERRED_MARKER, PendingLine};
