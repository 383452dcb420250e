//! Hardware adapter: bridges real peripherals to the per-tick port traits.
//!
//! Owns the temperature probe, the audio player, the button latch and the
//! status panel, exposing them through [`TemperatureSource`],
//! [`AudioSink`], [`ManualTrigger`] and [`StatusDisplay`] (and therefore
//! [`ControlIo`](crate::app::ports::ControlIo)).  The Peltier and the light
//! strip are owned by the service's thermostat and animator instead.  On
//! non-espidf targets the underlying drivers use cfg-gated simulation stubs.

use crate::adapters::display::TextPanel;
use crate::app::ports::{AudioSink, ManualTrigger, StatusDisplay, TemperatureSource};
use crate::app::status::StatusSnapshot;
use crate::drivers::audio::AudioPlayer;
use crate::drivers::button::ButtonLatch;
use crate::sensors::temperature::TemperatureProbe;

/// Concrete adapter that combines the loop's hardware behind port traits.
pub struct HardwareAdapter<'a> {
    probe: TemperatureProbe,
    audio: AudioPlayer,
    button: ButtonLatch<'a>,
    panel: TextPanel,
}

impl<'a> HardwareAdapter<'a> {
    pub fn new(
        probe: TemperatureProbe,
        audio: AudioPlayer,
        button: ButtonLatch<'a>,
        panel: TextPanel,
    ) -> Self {
        Self {
            probe,
            audio,
            button,
            panel,
        }
    }

    pub fn audio_mut(&mut self) -> &mut AudioPlayer {
        &mut self.audio
    }

    pub fn panel(&self) -> &TextPanel {
        &self.panel
    }
}

// ── TemperatureSource ─────────────────────────────────────────

impl TemperatureSource for HardwareAdapter<'_> {
    fn request_reading(&mut self) -> f32 {
        self.probe.read_celsius()
    }

    fn probe_healthy(&self) -> bool {
        self.probe.healthy()
    }
}

// ── AudioSink ─────────────────────────────────────────────────

impl AudioSink for HardwareAdapter<'_> {
    fn play_event_sound(&mut self) {
        self.audio.play_event_sound();
    }

    fn audio_healthy(&self) -> bool {
        self.audio.audio_healthy()
    }
}

// ── ManualTrigger ─────────────────────────────────────────────

impl ManualTrigger for HardwareAdapter<'_> {
    fn update_inputs(&mut self, now_ms: u64) {
        self.button.update_inputs(now_ms);
    }

    fn was_pressed(&mut self) -> bool {
        self.button.was_pressed()
    }
}

// ── StatusDisplay ─────────────────────────────────────────────

impl StatusDisplay for HardwareAdapter<'_> {
    fn render(&mut self, status: &StatusSnapshot) {
        self.panel.render(status);
    }
}
