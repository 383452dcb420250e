//! Front button: ISR-stamped, debounced press latch.
//!
//! ## Hardware
//!
//! Active-low momentary switch with internal pull-up.  The GPIO fires on
//! the falling edge; the ISR only records a raw timestamp into a
//! [`PressStamp`].  [`ButtonLatch::update_inputs`] (called from the main
//! loop) turns a new stamp into a pending press unless it lands inside the
//! debounce window, and [`ButtonLatch::was_pressed`] consumes it.
//!
//! A press acts exactly like a detected drop.

use core::sync::atomic::{AtomicU32, Ordering};

use log::debug;

use crate::app::ports::ManualTrigger;

pub const DEBOUNCE_MS: u32 = 50;

/// Raw ISR timestamp (milliseconds since boot, truncated to u32, never 0).
pub struct PressStamp(AtomicU32);

impl PressStamp {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// ISR side.  Lock-free atomic store.
    pub fn record(&self, now_ms: u32) {
        self.0.store(now_ms.max(1), Ordering::Release);
    }

    fn load(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for PressStamp {
    fn default() -> Self {
        Self::new()
    }
}

/// Stamp written by the button GPIO interrupt on the device.
pub static BUTTON_PRESS: PressStamp = PressStamp::new();

/// ISR handler: register on the button GPIO falling edge.
pub fn button_isr_handler(now_ms: u32) {
    BUTTON_PRESS.record(now_ms);
}

pub struct ButtonLatch<'a> {
    gpio: i32,
    stamp: &'a PressStamp,
    last_seen: u32,
    last_accepted_ms: Option<u32>,
    pending: bool,
}

impl<'a> ButtonLatch<'a> {
    pub fn new(gpio: i32, stamp: &'a PressStamp) -> Self {
        Self {
            gpio,
            stamp,
            last_seen: stamp.load(),
            last_accepted_ms: None,
            pending: false,
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }
}

impl ManualTrigger for ButtonLatch<'_> {
    fn update_inputs(&mut self, _now_ms: u64) {
        let isr_ms = self.stamp.load();
        if isr_ms == 0 || isr_ms == self.last_seen {
            return;
        }
        self.last_seen = isr_ms;

        let bounce = self
            .last_accepted_ms
            .is_some_and(|prev| isr_ms.wrapping_sub(prev) < DEBOUNCE_MS);
        if bounce {
            debug!("Button: bounce at {} ms ignored", isr_ms);
            return;
        }
        self.last_accepted_ms = Some(isr_ms);
        self.pending = true;
    }

    fn was_pressed(&mut self) -> bool {
        core::mem::take(&mut self.pending)
    }
}
