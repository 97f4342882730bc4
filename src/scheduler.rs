//! Elapsed-time cadences for the cooperative main loop.
//!
//! A [`Cadence`] is an `{interval, last_fired}` pair compared against a
//! monotonic clock that the caller reads once per tick.  Nothing here
//! sleeps; independent cadences just sit side by side in the loop.
//!
//! ```text
//!   tick ──▶ now_ms ──▶ display.due(now)?   ──▶ refresh readout
//!                   └─▶ telemetry.due(now)? ──▶ report
//! ```

/// A periodic timer driven by explicit `now` readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    interval_ms: u64,
    last_fired_ms: Option<u64>,
}

impl Cadence {
    /// First fire `interval_ms` after `anchor_ms`.
    pub const fn anchored(interval_ms: u64, anchor_ms: u64) -> Self {
        Self {
            interval_ms,
            last_fired_ms: Some(anchor_ms),
        }
    }

    /// First fire on the very next poll.
    pub const fn immediate(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_fired_ms: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn last_fired_ms(&self) -> Option<u64> {
        self.last_fired_ms
    }

    /// Returns `true` and records `now_ms` when the interval has elapsed.
    ///
    /// The next deadline is measured from the poll that fired, not from the
    /// previous deadline, so a slow tick shifts the schedule instead of
    /// producing a burst.
    pub fn due(&mut self, now_ms: u64) -> bool {
        let fire = match self.last_fired_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        };
        if fire {
            self.last_fired_ms = Some(now_ms);
        }
        fire
    }

    /// Milliseconds until the next fire (zero when already due).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.last_fired_ms {
            None => 0,
            Some(last) => self.interval_ms.saturating_sub(now_ms.saturating_sub(last)),
        }
    }

    /// Make the next poll fire regardless of elapsed time.
    pub fn rearm_immediate(&mut self) {
        self.last_fired_ms = None;
    }
}
