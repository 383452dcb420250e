//! WS2812 ("NeoPixel") strip driver.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-times are generated by an RMT TX channel, one
//! high/low pulse pair per bit, GRB byte order.
//! On host/test: the frame buffer and a commit counter are kept in memory.

use crate::app::ports::LightSink;
use crate::drivers::led_fade::Rgb;
use crate::pins::NEOPIXEL_COUNT;

#[cfg(target_os = "espidf")]
use esp_idf_hal::rmt::{FixedLengthSignal, PinState, Pulse, TxRmtDriver};

#[cfg(target_os = "espidf")]
const BITS: usize = NEOPIXEL_COUNT * 24;

pub struct NeoPixelStrip {
    pixels: [Rgb; NEOPIXEL_COUNT],
    healthy: bool,
    commits: u32,
    #[cfg(target_os = "espidf")]
    tx: Option<TxRmtDriver<'static>>,
    #[cfg(target_os = "espidf")]
    bit_pulses: Option<[(Pulse, Pulse); 2]>,
}

impl NeoPixelStrip {
    /// Bring up the strip on an already-configured RMT channel.  A failed
    /// init leaves the strip inert and unhealthy.
    #[cfg(target_os = "espidf")]
    pub fn new(tx: Option<TxRmtDriver<'static>>) -> Self {
        use core::time::Duration;

        let bit_pulses = tx.as_ref().and_then(|tx| {
            let hz = tx.counter_clock().ok()?;
            let ns = |n| Duration::from_nanos(n);
            let t0h = Pulse::new_with_duration(hz, PinState::High, &ns(350)).ok()?;
            let t0l = Pulse::new_with_duration(hz, PinState::Low, &ns(800)).ok()?;
            let t1h = Pulse::new_with_duration(hz, PinState::High, &ns(700)).ok()?;
            let t1l = Pulse::new_with_duration(hz, PinState::Low, &ns(600)).ok()?;
            Some([(t0h, t0l), (t1h, t1l)])
        });
        let healthy = bit_pulses.is_some();
        if !healthy {
            log::warn!("NeoPixel: RMT channel unavailable, strip disabled");
        }
        let mut strip = Self {
            pixels: [(0, 0, 0); NEOPIXEL_COUNT],
            healthy,
            commits: 0,
            tx,
            bit_pulses,
        };
        strip.commit();
        strip
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        log::info!("NeoPixel(sim): {} pixels", NEOPIXEL_COUNT);
        Self {
            pixels: [(0, 0, 0); NEOPIXEL_COUNT],
            healthy: true,
            commits: 0,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    pub fn pixels(&self) -> &[Rgb; NEOPIXEL_COUNT] {
        &self.pixels
    }

    pub fn commits(&self) -> u32 {
        self.commits
    }

    #[cfg(target_os = "espidf")]
    fn platform_show(&mut self) {
        let (Some(tx), Some(pulses)) = (self.tx.as_mut(), self.bit_pulses.as_ref()) else {
            return;
        };
        let mut signal = FixedLengthSignal::<BITS>::new();
        let mut i = 0;
        for &(r, g, b) in &self.pixels {
            let grb = (u32::from(g) << 16) | (u32::from(r) << 8) | u32::from(b);
            for bit in (0..24).rev() {
                let pair = &pulses[((grb >> bit) & 1) as usize];
                if signal.set(i, pair).is_err() {
                    return;
                }
                i += 1;
            }
        }
        if let Err(e) = tx.start_blocking(&signal) {
            log::warn!("NeoPixel: RMT transmit failed: {e}");
            self.healthy = false;
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_show(&mut self) {}
}

#[cfg(not(target_os = "espidf"))]
impl Default for NeoPixelStrip {
    fn default() -> Self {
        Self::new()
    }
}

impl LightSink for NeoPixelStrip {
    fn set_uniform_color(&mut self, r: u8, g: u8, b: u8) {
        self.pixels = [(r, g, b); NEOPIXEL_COUNT];
    }

    fn commit(&mut self) {
        self.platform_show();
        self.commits = self.commits.wrapping_add(1);
    }

    fn light_healthy(&self) -> bool {
        self.healthy
    }
}
