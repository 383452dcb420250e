//! Light animation engine for the NeoPixel ring under the ice.
//!
//! Two layers share the one strip:
//!
//! 1. **Effects** (highest priority): the one-shot white fade fired by a
//!    drop, the boot blink sequence and the operator's test light.  While
//!    any effect runs, ambient updates are skipped entirely.
//! 2. **Ambient**: a slow achromatic breathing pulse while the Peltier
//!    is cooling, a steady red glow while it is idle, black when disabled.
//!
//! The main loop calls [`FadeAnimator::tick`] then
//! [`FadeAnimator::ambient_tick`] every pass; both are non-blocking and
//! time-driven.
//!
//! | Output       | Colour          | Cadence               |
//! |--------------|-----------------|-----------------------|
//! | Drop fade    | white, linear ↓ | every tick            |
//! | Cooling      | grey 10..=80    | step 2 every 30 ms    |
//! | Idle         | red             | steady                |
//! | Boot         | green           | 4 blinks, 1 s on/off  |
//! | Test light   | white           | 5 s hold              |

use crate::app::ports::LightSink;

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

pub const BLACK: Rgb = (0, 0, 0);

const PULSE_MIN: i16 = 10;
const PULSE_MAX: i16 = 80;
const PULSE_START: i16 = 30;
const PULSE_STEP: i16 = 2;
const PULSE_PERIOD_MS: u64 = 30;

const STARTUP_BLINKS: u64 = 4;
const BLINK_PHASE_MS: u64 = 1_000;

pub const TEST_LIGHT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Effect {
    /// Peak white at `started_ms`, ramping linearly to black.
    Fade { started_ms: u64, peak: u8 },
    /// Green on/off blinks.
    StartupBlink { started_ms: u64, peak: u8 },
    /// Solid colour until `until_ms`.
    Hold { until_ms: u64, colour: Rgb },
}

pub struct FadeAnimator<L: LightSink> {
    light: L,
    effect: Option<Effect>,
    fade_ms: u32,
    pulse_level: i16,
    pulse_dir: i16,
    last_pulse_ms: Option<u64>,
    last_output: Option<Rgb>,
}

impl<L: LightSink> FadeAnimator<L> {
    pub fn new(light: L, fade_ms: u32) -> Self {
        Self {
            light,
            effect: None,
            fade_ms,
            pulse_level: PULSE_START,
            pulse_dir: 1,
            last_pulse_ms: None,
            last_output: None,
        }
    }

    // ── Effects ───────────────────────────────────────────────

    /// Drop reaction: full `peak` white now, then fade.  A retrigger
    /// restarts the fade from `peak` (last trigger wins).
    pub fn on_trigger(&mut self, now_ms: u64, peak: u8) {
        self.effect = Some(Effect::Fade {
            started_ms: now_ms,
            peak,
        });
        self.emit((peak, peak, peak));
    }

    /// Four green blinks, driven by [`tick`](Self::tick).
    pub fn start_sequence(&mut self, now_ms: u64, peak: u8) {
        self.effect = Some(Effect::StartupBlink {
            started_ms: now_ms,
            peak,
        });
        self.emit((0, peak, 0));
    }

    /// Full white for [`TEST_LIGHT_MS`].
    pub fn test_light(&mut self, now_ms: u64) {
        self.effect = Some(Effect::Hold {
            until_ms: now_ms + TEST_LIGHT_MS,
            colour: (255, 255, 255),
        });
        self.emit((255, 255, 255));
    }

    /// Advance the running effect, if any.
    pub fn tick(&mut self, now_ms: u64) {
        let Some(effect) = self.effect else {
            return;
        };
        let (colour, done) = match effect {
            Effect::Fade { started_ms, peak } => {
                let elapsed = now_ms.saturating_sub(started_ms);
                if elapsed >= u64::from(self.fade_ms) {
                    (BLACK, true)
                } else {
                    let level = fade_level(peak, elapsed, self.fade_ms);
                    ((level, level, level), false)
                }
            }
            Effect::StartupBlink { started_ms, peak } => {
                let phase = now_ms.saturating_sub(started_ms) / BLINK_PHASE_MS;
                if phase >= STARTUP_BLINKS * 2 {
                    (BLACK, true)
                } else if phase % 2 == 0 {
                    ((0, peak, 0), false)
                } else {
                    (BLACK, false)
                }
            }
            Effect::Hold { until_ms, colour } => {
                if now_ms >= until_ms {
                    (BLACK, true)
                } else {
                    (colour, false)
                }
            }
        };
        if done {
            self.effect = None;
        }
        self.emit(colour);
    }

    /// True while an effect owns the strip (drop fade, boot blinks or test
    /// light).  Used to hold off competing visual updates.
    pub fn is_active(&self) -> bool {
        self.effect.is_some()
    }

    /// True only while the drop fade itself runs.
    pub fn is_fading(&self) -> bool {
        matches!(self.effect, Some(Effect::Fade { .. }))
    }

    // ── Ambient ───────────────────────────────────────────────

    /// Idle-time lighting.  `cooling` selects the breathing pulse over the
    /// steady red glow.  No-op while an effect runs.
    pub fn ambient_tick(&mut self, now_ms: u64, cooling: bool, enabled: bool, brightness: u8) {
        if self.effect.is_some() {
            return;
        }
        if !enabled {
            self.emit(BLACK);
            return;
        }
        if let Some(last) = self.last_pulse_ms {
            if now_ms.saturating_sub(last) < PULSE_PERIOD_MS {
                return;
            }
        }
        self.last_pulse_ms = Some(now_ms);

        if cooling {
            self.pulse_level += self.pulse_dir * PULSE_STEP;
            if self.pulse_level >= PULSE_MAX {
                self.pulse_level = PULSE_MAX;
                self.pulse_dir = -1;
            } else if self.pulse_level <= PULSE_MIN {
                self.pulse_level = PULSE_MIN;
                self.pulse_dir = 1;
            }
            let v = scale(self.pulse_level as u8, brightness);
            self.emit((v, v, v));
        } else {
            self.emit((brightness, 0, 0));
        }
    }

    // ── Settings ──────────────────────────────────────────────

    pub fn set_fade_duration_ms(&mut self, ms: u32) {
        self.fade_ms = ms;
    }

    pub fn fade_duration_ms(&self) -> u32 {
        self.fade_ms
    }

    pub fn pulse_level(&self) -> u8 {
        self.pulse_level as u8
    }

    pub fn light(&self) -> &L {
        &self.light
    }

    pub fn light_mut(&mut self) -> &mut L {
        &mut self.light
    }

    fn emit(&mut self, rgb: Rgb) {
        if self.last_output == Some(rgb) {
            return;
        }
        self.light.set_uniform_color(rgb.0, rgb.1, rgb.2);
        self.light.commit();
        self.last_output = Some(rgb);
    }
}

/// `peak * (1 - elapsed / total)`, ratio clamped to [0, 1].
fn fade_level(peak: u8, elapsed_ms: u64, total_ms: u32) -> u8 {
    if total_ms == 0 {
        return 0;
    }
    let ratio = (1.0 - elapsed_ms as f32 / total_ms as f32).clamp(0.0, 1.0);
    (ratio * f32::from(peak)) as u8
}

/// `level * brightness / 255`.
fn scale(level: u8, brightness: u8) -> u8 {
    ((u16::from(level) * u16::from(brightness)) / 255) as u8
}
