//! Elapsed-time sources for recording timestamps and playback pacing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Source of elapsed seconds.
///
/// Recording stamps every line with the clock value and playback compares
/// recorded stamps against it, so both sides must use the same notion of
/// "elapsed since start".
pub trait Clock: Send + Sync {
    /// Seconds elapsed since the clock's origin.
    fn elapsed_secs(&self) -> f64;
}

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Monotonic clock relative to the first time any `ProcessClock` is read.
///
/// The origin is process-wide and established lazily, so a recorder and a
/// player created at different moments still share one timeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessClock;

impl Clock for ProcessClock {
    fn elapsed_secs(&self) -> f64 {
        PROCESS_START.get_or_init(Instant::now).elapsed().as_secs_f64()
    }
}

/// Manually driven clock for tests and offline tools.
///
/// Clones share the same time value.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current time in seconds.
    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::Relaxed);
    }

    /// Move the clock forward by `secs`.
    pub fn advance(&self, secs: f64) {
        self.set(self.elapsed_secs() + secs);
    }
}

impl Clock for ManualClock {
    fn elapsed_secs(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}
