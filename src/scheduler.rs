//! Millisecond interval timers for the cooperative control loop.
//!
//! The loop never sleeps on a single job: every periodic activity (probe
//! read, display refresh, WiFi retry, weather refresh) owns an
//! [`IntervalTimer`] that is polled once per pass and fires when its
//! interval has elapsed.
//!
//! ```text
//!  loop pass ──▶ temp.poll(now)     ──▶ read probe, thermostat input
//!            ──▶ wifi.poll(now)     ──▶ reconnect attempt
//!            ──▶ weather.poll(now)  ──▶ refresh linked station
//!            ──▶ display.poll(now)  ──▶ render snapshot
//! ```
//!
//! Time is injected (`now_ms`) so tests drive the timers without sleeping.

/// Fires at most once per `interval_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    interval_ms: u64,
    /// `None` until the first fire when created with [`immediate`](Self::immediate).
    last_ms: Option<u64>,
}

impl IntervalTimer {
    /// First fire once `interval_ms` has passed since boot (t = 0).
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: Some(0),
        }
    }

    /// First fire on the first poll.
    pub const fn immediate(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    /// Returns `true` and re-arms when the interval has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if !self.is_due(now_ms) {
            return false;
        }
        self.last_ms = Some(now_ms);
        true
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }

    /// Restart the interval from `now_ms` without firing.
    pub fn reset(&mut self, now_ms: u64) {
        self.last_ms = Some(now_ms);
    }

    /// Make the next poll fire regardless of elapsed time.
    pub fn trigger(&mut self) {
        self.last_ms = None;
    }

    /// Takes effect on the next poll; the anchor is kept.
    pub fn set_interval_ms(&mut self, interval_ms: u64) {
        self.interval_ms = interval_ms;
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}
