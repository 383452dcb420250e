//! Debounced, edge-triggered drop detector.
//!
//! ## Hardware
//!
//! IR break-beam sensor under the ice block.  The GPIO interrupt fires on
//! the configured edge and its handler does exactly one thing: raise the
//! [`EdgeFlag`].  The control loop calls [`DropDetector::poll`] once per
//! pass, which test-and-clears the flag and applies the debounce window.
//!
//! ```text
//!   ISR ──raise()──▶ EdgeFlag (AtomicBool) ──take()──▶ DropDetector::poll()
//! ```
//!
//! The debounce window is anchored at the last *accepted* detection, so a
//! burst of bounce is absorbed into a single event no matter how irregular
//! the poll cadence is.
//!
//! On boards without a usable interrupt line, [`PollingEdgeDetector`]
//! samples the pin from the loop and raises the same flag.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::InputPin;
use log::{debug, info};
use serde::{Deserialize, Serialize};

// ───────────────────────────────────────────────────────────────
// Edge flag (the only datum shared with interrupt context)
// ───────────────────────────────────────────────────────────────

/// Single-word flag written from interrupt context, cleared by the loop.
pub struct EdgeFlag(AtomicBool);

impl EdgeFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// ISR side.  Lock-free, no allocation.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Test-and-clear.  Returns whether the flag was raised.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for EdgeFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Flag raised by the drop sensor GPIO interrupt on the device.
pub static DROP_EDGE: EdgeFlag = EdgeFlag::new();

/// ISR handler: register on the drop sensor GPIO.
pub fn drop_sensor_isr() {
    DROP_EDGE.raise();
}

// ───────────────────────────────────────────────────────────────
// Trigger edge
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerEdge {
    Rising,
    Falling,
    Either,
}

impl TriggerEdge {
    /// Whether a `prev` → `now` level change is an edge of this kind.
    pub fn matches(self, prev_high: bool, now_high: bool) -> bool {
        match self {
            Self::Rising => !prev_high && now_high,
            Self::Falling => prev_high && !now_high,
            Self::Either => prev_high != now_high,
        }
    }
}

/// The underlying signal watch (GPIO interrupt or a polling sampler).
pub trait EdgeWatch {
    fn enable_watch(&mut self, edge: TriggerEdge);
    fn disable_watch(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Drop detector
// ───────────────────────────────────────────────────────────────

pub struct DropDetector<'a> {
    flag: &'a EdgeFlag,
    edge: TriggerEdge,
    debounce_ms: u32,
    last_detection_ms: u64,
}

impl<'a> DropDetector<'a> {
    pub fn new(flag: &'a EdgeFlag, edge: TriggerEdge, debounce_ms: u32) -> Self {
        Self {
            flag,
            edge,
            debounce_ms,
            last_detection_ms: 0,
        }
    }

    /// Consume a pending raw edge.  Returns `true` only for an edge that
    /// lands at least `debounce_ms` after the previous accepted detection.
    /// A bounce clears the flag without moving the debounce anchor.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if !self.flag.take() {
            return false;
        }
        if now_ms.saturating_sub(self.last_detection_ms) >= u64::from(self.debounce_ms) {
            self.last_detection_ms = now_ms;
            true
        } else {
            debug!("Drop sensor: bounce absorbed at {} ms", now_ms);
            false
        }
    }

    /// Clear any pending edge and zero the debounce anchor.
    pub fn reset(&mut self) {
        self.flag.clear();
        self.last_detection_ms = 0;
    }

    pub fn set_debounce_ms(&mut self, debounce_ms: u32) {
        self.debounce_ms = debounce_ms;
    }

    pub fn debounce_ms(&self) -> u32 {
        self.debounce_ms
    }

    /// Change the trigger edge.  The watch is disabled while the edge is
    /// swapped so no half-configured interrupt can fire.
    pub fn set_trigger_edge(&mut self, edge: TriggerEdge, watch: &mut impl EdgeWatch) {
        watch.disable_watch();
        self.edge = edge;
        watch.enable_watch(edge);
        info!("Drop sensor: trigger edge set to {:?}", edge);
    }

    pub fn trigger_edge(&self) -> TriggerEdge {
        self.edge
    }

    pub fn time_since_last_detection(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_detection_ms)
    }

    /// A raw edge is pending (not yet polled).
    pub fn is_triggered(&self) -> bool {
        self.flag.is_raised()
    }
}

// ───────────────────────────────────────────────────────────────
// Polling fallback
// ───────────────────────────────────────────────────────────────

/// Samples a digital input every loop pass and raises the flag on the
/// configured edge.  Stands in for the GPIO interrupt on platforms that
/// don't have one wired.
pub struct PollingEdgeDetector<'a, P: InputPin> {
    pin: P,
    flag: &'a EdgeFlag,
    edge: TriggerEdge,
    armed: bool,
    last_high: Option<bool>,
}

impl<'a, P: InputPin> PollingEdgeDetector<'a, P> {
    pub fn new(pin: P, flag: &'a EdgeFlag, edge: TriggerEdge) -> Self {
        Self {
            pin,
            flag,
            edge,
            armed: true,
            last_high: None,
        }
    }

    /// Read the pin once.  A failed read leaves the previous level intact.
    pub fn sample(&mut self) {
        let Ok(high) = self.pin.is_high() else {
            return;
        };
        if let Some(prev) = self.last_high {
            if self.armed && self.edge.matches(prev, high) {
                self.flag.raise();
            }
        }
        self.last_high = Some(high);
    }
}

impl<P: InputPin> EdgeWatch for PollingEdgeDetector<'_, P> {
    fn enable_watch(&mut self, edge: TriggerEdge) {
        self.edge = edge;
        self.armed = true;
        // Re-baseline so the level at re-enable isn't mistaken for an edge.
        self.last_high = None;
    }

    fn disable_watch(&mut self) {
        self.armed = false;
    }
}
