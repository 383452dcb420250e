//! GPIO / peripheral pin assignments for the AtomS3 controller.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Drop sensor (IR break-beam, open collector)
// ---------------------------------------------------------------------------

/// Digital input with interrupt; idles HIGH, pulses LOW while a drop
/// crosses the beam.
pub const DROP_SENSOR_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Temperature probe (DS18B20 on the cold plate)
// ---------------------------------------------------------------------------

/// 1-Wire data line, external 4.7 kOhm pull-up.
pub const TEMP_ONEWIRE_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Peltier module (MOSFET gate)
// ---------------------------------------------------------------------------

/// Digital output: HIGH = cooling.
pub const PELTIER_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// NeoPixel strip
// ---------------------------------------------------------------------------

/// RMT-driven WS2812 data line.
pub const NEOPIXEL_GPIO: i32 = 8;
pub const NEOPIXEL_COUNT: usize = 8;

// ---------------------------------------------------------------------------
// Audio player (DFPlayer-compatible, UART1 @ 9600 baud)
// ---------------------------------------------------------------------------

pub const AUDIO_UART_TX_GPIO: i32 = 1;
pub const AUDIO_UART_RX_GPIO: i32 = 2;
pub const AUDIO_BAUD_RATE: u32 = 9600;

// ---------------------------------------------------------------------------
// Front button (under the display)
// ---------------------------------------------------------------------------

/// Active-low, internal pull-up.
pub const BUTTON_GPIO: i32 = 41;
