//! Fixed-Step Clock
//!
//! Decides, on every host callback, whether a logical tick is due.
//! At most one tick runs per callback; the time left over after whole
//! frames carries into the next callback.

use std::time::{Duration, Instant};

/// Logical ticks per second.
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Frame scheduler driven by host timestamps.
#[derive(Clone, Debug)]
pub struct FixedStepClock {
    frame: Duration,
    reference: Option<Instant>,
}

impl Default for FixedStepClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

impl FixedStepClock {
    /// Clock ticking `tick_rate` times per second. Starts stopped.
    pub fn new(tick_rate: u32) -> Self {
        let frame = Duration::from_nanos(1_000_000_000 / tick_rate.max(1) as u64);
        Self { frame, reference: None }
    }

    /// One frame.
    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Start (or restart) measuring from `now`.
    pub fn reset(&mut self, now: Instant) {
        self.reference = Some(now);
    }

    /// Stop scheduling. Later callbacks never tick.
    pub fn stop(&mut self) {
        self.reference = None;
    }

    /// Is the clock running?
    pub fn is_running(&self) -> bool {
        self.reference.is_some()
    }

    /// Handle a host callback. Returns `true` when one tick should run.
    ///
    /// Elapsed time below one frame does nothing. Otherwise the reference
    /// moves to `now - (elapsed mod frame)`, so the remainder carries over
    /// but any additional whole frames are dropped.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(reference) = self.reference else {
            return false;
        };

        let elapsed = now.saturating_duration_since(reference);
        if elapsed < self.frame {
            return false;
        }

        let remainder_nanos = elapsed.as_nanos() % self.frame.as_nanos();
        let remainder = Duration::from_nanos(remainder_nanos as u64);
        self.reference = Some(now.checked_sub(remainder).unwrap_or(now));
        true
    }
}
