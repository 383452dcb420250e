//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log lines on the device,
//! recording in tests).

use crate::fsm::StateId;

/// What caused a drop reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropSource {
    Sensor,
    Button,
    Api,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the thermostat's initial state).
    Started(StateId),

    /// The thermostat moved between states.
    StateChanged { from: StateId, to: StateId },

    /// A drop reaction ran.  `count` is the new total.
    DropDetected { count: u32, source: DropSource },

    /// The control loop was paused / resumed by the operator.
    Paused,
    Resumed,

    /// Runtime settings changed (persisted later by auto-save).
    SettingsChanged,

    /// The probe returned an error sentinel; the cached value is kept.
    ProbeFault,

    /// A station reading was refreshed.
    WeatherUpdated { station: &'static str, temp_c: f32 },

    /// Periodic telemetry snapshot, one per probe read.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot suitable for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub state: StateId,
    pub temperature_c: f32,
    pub setpoint_c: f32,
    pub reactivate_c: f32,
    pub drop_count: u32,
    pub running: bool,
}
