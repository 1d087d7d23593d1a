//! Process-wide client state, passed explicitly to whoever needs it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Minimum spacing between coprocessor version checks.
pub const VERSION_CHECK_INTERVAL_S: f64 = 5.0;

/// Monotonic clock in seconds.
pub trait TimeSource: Send + Sync {
    fn now_seconds(&self) -> f64;
}

/// Wall-clock time since construction.
#[derive(Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl TimeSource for MonotonicClock {
    fn now_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to. Used by tests and simulation.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start_s: f64) -> Self {
        Self {
            bits: AtomicU64::new(start_s.to_bits()),
        }
    }

    pub fn set_seconds(&self, now_s: f64) {
        self.bits.store(now_s.to_bits(), Ordering::Relaxed);
    }

    pub fn advance(&self, dt_s: f64) {
        self.set_seconds(self.now_seconds() + dt_s);
    }
}

impl TimeSource for ManualClock {
    fn now_seconds(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// Version-check switch, last-check time and the clock, shared by cameras.
pub struct ClientContext {
    version_check_enabled: AtomicBool,
    last_version_check_bits: AtomicU64,
    clock: Arc<dyn TimeSource>,
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("version_check_enabled", &self.version_check_enabled())
            .field("last_version_check_s", &self.last_version_check_s())
            .field("now_s", &self.now_seconds())
            .finish()
    }
}

impl Default for ClientContext {
    fn default() -> Self {
        Self::new(Arc::new(MonotonicClock::default()))
    }
}

impl ClientContext {
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            version_check_enabled: AtomicBool::new(true),
            last_version_check_bits: AtomicU64::new(f64::NEG_INFINITY.to_bits()),
            clock,
        }
    }

    pub fn now_seconds(&self) -> f64 {
        self.clock.now_seconds()
    }

    pub fn version_check_enabled(&self) -> bool {
        self.version_check_enabled.load(Ordering::Relaxed)
    }

    pub fn set_version_check_enabled(&self, enabled: bool) {
        self.version_check_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn last_version_check_s(&self) -> f64 {
        f64::from_bits(self.last_version_check_bits.load(Ordering::Relaxed))
    }

    /// True when a version check is due; marks it done at the current time.
    pub fn begin_version_check(&self) -> bool {
        if !self.version_check_enabled() {
            return false;
        }
        let now = self.now_seconds();
        if now - self.last_version_check_s() < VERSION_CHECK_INTERVAL_S {
            return false;
        }
        self.last_version_check_bits
            .store(now.to_bits(), Ordering::Relaxed);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_checks_are_rate_limited() {
        let clock = Arc::new(ManualClock::new(10.0));
        let ctx = ClientContext::new(clock.clone());
        assert!(ctx.begin_version_check());
        clock.advance(4.9);
        assert!(!ctx.begin_version_check());
        clock.advance(0.2);
        assert!(ctx.begin_version_check());

        ctx.set_version_check_enabled(false);
        clock.advance(60.0);
        assert!(!ctx.begin_version_check());
    }
}
