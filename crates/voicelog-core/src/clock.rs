//! Monotonic wall clock for event timestamps.
//!
//! Wall-clock milliseconds can step backwards (NTP adjustments, manual
//! changes). Log ordering requires timestamps that never fall below the
//! newest logged event, so the clock returns `max(now, last)`.

use std::sync::atomic::{AtomicI64, Ordering};

/// Millisecond clock that never goes backwards.
#[derive(Debug)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    /// Create a clock that will never report less than `floor`.
    ///
    /// Seed with the newest logged timestamp so a restart after a clock
    /// step still produces ordered events.
    pub const fn new(floor: i64) -> Self {
        Self {
            last: AtomicI64::new(floor),
        }
    }

    /// Current time in milliseconds since the Unix epoch, clamped to be
    /// no lower than any value previously returned.
    pub fn now_ms(&self) -> i64 {
        self.observe(chrono::Utc::now().timestamp_millis())
    }

    /// Fold a wall-clock reading into the clock and return the result.
    pub fn observe(&self, wall_ms: i64) -> i64 {
        self.last.fetch_max(wall_ms, Ordering::SeqCst).max(wall_ms)
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_goes_backwards() {
        let clock = MonotonicClock::new(0);
        assert_eq!(clock.observe(100), 100);
        assert_eq!(clock.observe(50), 100);
        assert_eq!(clock.observe(150), 150);
    }

    #[test]
    fn floor_is_respected() {
        let clock = MonotonicClock::new(i64::MAX);
        assert_eq!(clock.now_ms(), i64::MAX);
    }

    #[test]
    fn now_is_plausible() {
        let clock = MonotonicClock::default();
        // 2020-01-01T00:00:00Z
        assert!(clock.now_ms() > 1_577_836_800_000);
    }
}
