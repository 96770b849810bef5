use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// How often to emit warnings about deferred lines.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

/// Batches repeated warnings into one message per interval.
///
/// Callers bump the counter with [`record`](Self::record) and then call
/// [`warn_if_due`](Self::warn_if_due), which hands the accumulated count to
/// the callback at most once per interval. [`flush`](Self::flush) reports
/// whatever is pending immediately.
#[derive(Debug)]
pub struct RateLimitedWarner {
    interval: Duration,
    last_warn: Mutex<Option<Instant>>,
    pending: AtomicU64,
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}

impl RateLimitedWarner {
    /// The first warning is emitted as soon as something is recorded.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_warn: Mutex::new(None),
            pending: AtomicU64::new(0),
        }
    }

    pub fn record(&self) {
        self.pending.fetch_add(1, Ordering::Relaxed);
    }

    pub fn warn_if_due(&self, warn: impl FnOnce(u64)) {
        let now = Instant::now();
        let mut last = self.last_warn.lock();
        if last.is_some_and(|at| now.duration_since(at) < self.interval) {
            return;
        }
        let count = self.pending.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
            *last = Some(now);
        }
    }

    pub fn flush(&self, warn: impl FnOnce(u64)) {
        let count = self.pending.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
            *self.last_warn.lock() = Some(Instant::now());
        }
    }
}
