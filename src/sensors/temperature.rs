//! DS18B20 cold-plate temperature probe (1-Wire, 12-bit).
//!
//! Conversions are pipelined to keep the control loop non-blocking: each
//! [`TemperatureProbe::read_celsius`] call reads the scratchpad of the
//! conversion started by the *previous* call, then starts the next one.
//! At 12-bit resolution a conversion takes 750 ms, well inside the probe
//! read interval.
//!
//! ## Fault handling
//!
//! `-127 °C` (disconnected) and `85 °C` (power-on value, e.g. after a brown
//! out) are treated as "no new data": the last good reading is returned
//! and the health flag drops.  The very first read always returns the
//! initial value because no conversion has completed yet.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-banged 1-Wire on [`pins::TEMP_ONEWIRE_GPIO`].
//! On host/test: scratchpads are synthesised from an injectable value.
//!
//! [`pins::TEMP_ONEWIRE_GPIO`]: crate::pins::TEMP_ONEWIRE_GPIO

use log::warn;

use crate::error::{Result, SensorError};

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Disconnected-device sentinel.
pub const DISCONNECTED_C: f32 = -127.0;
/// Power-on reset register value.
pub const POWER_ON_RESET_C: f32 = 85.0;
/// Value reported before the first valid conversion.
pub const INITIAL_C: f32 = 20.0;

// ── Host simulation ───────────────────────────────────────────

/// Simulated probe temperature in 1/16 °C steps.
#[cfg(not(target_os = "espidf"))]
static SIM_PROBE_RAW: AtomicI32 = AtomicI32::new(20 * 16);
#[cfg(not(target_os = "espidf"))]
static SIM_PROBE_PRESENT: AtomicBool = AtomicBool::new(true);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_probe_celsius(celsius: f32) {
    SIM_PROBE_RAW.store((celsius * 16.0) as i32, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_probe_present(present: bool) {
    SIM_PROBE_PRESENT.store(present, Ordering::Relaxed);
}

// ── Scratchpad decoding ───────────────────────────────────────

/// Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1, reflected).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

/// Decode a 9-byte scratchpad into °C.  Sentinels are errors.
pub fn decode_scratchpad(sp: &[u8; 9]) -> Result<f32> {
    if crc8(&sp[..8]) != sp[8] {
        return Err(SensorError::CrcMismatch.into());
    }
    let raw = i16::from_le_bytes([sp[0], sp[1]]);
    let celsius = f32::from(raw) / 16.0;
    if is_sentinel(celsius) {
        return Err(SensorError::Sentinel.into());
    }
    Ok(celsius)
}

pub fn is_sentinel(celsius: f32) -> bool {
    (celsius - DISCONNECTED_C).abs() < 0.01 || (celsius - POWER_ON_RESET_C).abs() < 0.01
}

/// Build a scratchpad for a raw 1/16 °C value (12-bit config byte).
fn encode_scratchpad(raw: i16) -> [u8; 9] {
    let [lo, hi] = raw.to_le_bytes();
    let mut sp = [lo, hi, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0];
    sp[8] = crc8(&sp[..8]);
    sp
}

// ── Probe ─────────────────────────────────────────────────────

pub struct TemperatureProbe {
    gpio: i32,
    present: bool,
    healthy: bool,
    conversion_pending: bool,
    last_good_c: f32,
}

impl TemperatureProbe {
    /// Probe the bus for a device.  Absence is not an error here: the
    /// probe simply keeps reporting the initial value.
    pub fn new(gpio: i32) -> Self {
        let present = Self::bus_reset(gpio);
        if !present {
            warn!("Temperature probe: no device on GPIO {}", gpio);
        }
        Self {
            gpio,
            present,
            healthy: present,
            conversion_pending: false,
            last_good_c: INITIAL_C,
        }
    }

    /// Latest temperature, or the last good one on any fault.
    pub fn read_celsius(&mut self) -> f32 {
        match self.read_raw() {
            Ok(c) => {
                self.last_good_c = c;
                self.healthy = true;
            }
            Err(e) => {
                if self.conversion_pending || !self.present {
                    warn!("Temperature probe: {} (keeping {:.2} C)", e, self.last_good_c);
                }
                self.healthy = false;
            }
        }
        self.conversion_pending = self.start_conversion();
        self.last_good_c
    }

    /// GPIO carrying the 1-Wire bus.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    pub fn present(&self) -> bool {
        self.present
    }

    pub fn healthy(&self) -> bool {
        self.healthy
    }

    pub fn last_good_c(&self) -> f32 {
        self.last_good_c
    }

    fn read_raw(&mut self) -> Result<f32> {
        if !self.conversion_pending {
            return Err(SensorError::NoDevice.into());
        }
        let sp = self.read_scratchpad()?;
        decode_scratchpad(&sp)
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn bus_reset(gpio: i32) -> bool {
        onewire::reset(gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    fn bus_reset(_gpio: i32) -> bool {
        SIM_PROBE_PRESENT.load(Ordering::Relaxed)
    }

    #[cfg(target_os = "espidf")]
    fn start_conversion(&mut self) -> bool {
        if !onewire::reset(self.gpio) {
            return false;
        }
        onewire::write_byte(self.gpio, onewire::SKIP_ROM);
        onewire::write_byte(self.gpio, onewire::CONVERT_T);
        true
    }

    #[cfg(not(target_os = "espidf"))]
    fn start_conversion(&mut self) -> bool {
        SIM_PROBE_PRESENT.load(Ordering::Relaxed)
    }

    #[cfg(target_os = "espidf")]
    fn read_scratchpad(&mut self) -> Result<[u8; 9]> {
        if !onewire::reset(self.gpio) {
            return Err(SensorError::NoDevice.into());
        }
        onewire::write_byte(self.gpio, onewire::SKIP_ROM);
        onewire::write_byte(self.gpio, onewire::READ_SCRATCHPAD);
        let mut sp = [0u8; 9];
        for b in &mut sp {
            *b = onewire::read_byte(self.gpio);
        }
        Ok(sp)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_scratchpad(&mut self) -> Result<[u8; 9]> {
        if !SIM_PROBE_PRESENT.load(Ordering::Relaxed) {
            // An absent device reads as all-ones on an open-drain bus.
            return Ok([0xFF; 9]);
        }
        let raw = SIM_PROBE_RAW.load(Ordering::Relaxed);
        Ok(encode_scratchpad(raw.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16))
    }
}

/// Bit-banged 1-Wire master (standard speed).
#[cfg(target_os = "espidf")]
mod onewire {
    use esp_idf_svc::sys::{
        esp_rom_delay_us, gpio_get_level, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD, gpio_set_direction,
        gpio_set_level,
    };

    pub const SKIP_ROM: u8 = 0xCC;
    pub const CONVERT_T: u8 = 0x44;
    pub const READ_SCRATCHPAD: u8 = 0xBE;

    fn drive_low(pin: i32) {
        // SAFETY: pin configured as open-drain by hw_init; main-loop only.
        unsafe {
            gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD);
            gpio_set_level(pin as _, 0);
        }
    }

    fn release(pin: i32) {
        unsafe {
            gpio_set_level(pin as _, 1);
        }
    }

    fn sample(pin: i32) -> bool {
        unsafe { gpio_get_level(pin as _) != 0 }
    }

    fn delay_us(us: u32) {
        unsafe { esp_rom_delay_us(us) }
    }

    /// Reset pulse; true when a device answered with a presence pulse.
    pub fn reset(pin: i32) -> bool {
        drive_low(pin);
        delay_us(480);
        release(pin);
        delay_us(70);
        let present = !sample(pin);
        delay_us(410);
        present
    }

    fn write_bit(pin: i32, bit: bool) {
        drive_low(pin);
        if bit {
            delay_us(6);
            release(pin);
            delay_us(64);
        } else {
            delay_us(60);
            release(pin);
            delay_us(10);
        }
    }

    fn read_bit(pin: i32) -> bool {
        drive_low(pin);
        delay_us(6);
        release(pin);
        delay_us(9);
        let bit = sample(pin);
        delay_us(55);
        bit
    }

    pub fn write_byte(pin: i32, byte: u8) {
        for i in 0..8 {
            write_bit(pin, (byte >> i) & 1 == 1);
        }
    }

    pub fn read_byte(pin: i32) -> u8 {
        (0..8).fold(0u8, |acc, i| if read_bit(pin) { acc | (1 << i) } else { acc })
    }
}
