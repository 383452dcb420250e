//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production), one
//! `TAG | key=value` line per event.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | state={:?} | T={:.2}\u{00b0}C | set={:.1} react={:.1} | drops={} | {}",
                    t.state,
                    t.temperature_c,
                    t.setpoint_c,
                    t.reactivate_c,
                    t.drop_count,
                    if t.running { "running" } else { "paused" },
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::DropDetected { count, source } => {
                info!("DROP  | count={} source={:?}", count, source);
            }
            AppEvent::Paused => info!("LOOP  | paused"),
            AppEvent::Resumed => info!("LOOP  | resumed"),
            AppEvent::SettingsChanged => info!("CONF  | settings changed"),
            AppEvent::ProbeFault => warn!("PROBE | sentinel reading discarded"),
            AppEvent::WeatherUpdated { station, temp_c } => {
                info!("WTHR  | {}={:.1}\u{00b0}C", station, temp_c);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
        }
    }
}
