//! Shared mutable context threaded through every FSM handler.
//!
//! `ThermostatContext` is the blackboard state handlers read from and write
//! to: the latest probe temperature, the thresholds (re-written by the
//! owner whenever settings change), the hold / idle timer anchors, and the
//! actuator command the owner applies after each update.

/// The shared context passed to every state handler function.
#[derive(Debug, Clone)]
pub struct ThermostatContext {
    // -- Timing --
    /// Monotonic time of the current update (ms).
    pub now_ms: u64,

    // -- Inputs --
    /// Last known probe temperature (°C).
    pub current_temp: f32,
    /// Cooling stops being requested at or below this (°C).
    pub setpoint: f32,
    /// Idle cooling resumes at or above this (°C).
    pub reactivate_temp: f32,
    /// Minimum time cooling stays on after first reaching the setpoint.
    pub hold_ms: u64,
    /// Maximum time cooling may stay off regardless of temperature.
    pub max_idle_ms: u64,

    // -- Timer anchors --
    pub setpoint_reached_ms: u64,
    pub cooling_stopped_ms: u64,

    // -- Outputs --
    /// Desired actuator state.  Applied to the sink by the owner.
    pub actuator_on: bool,
    /// Set while holding at the setpoint (sub-state of cooling).
    pub in_hold: bool,
}

impl ThermostatContext {
    pub fn new(setpoint: f32, reactivate_temp: f32, hold_ms: u64, max_idle_ms: u64) -> Self {
        Self {
            now_ms: 0,
            current_temp: crate::sensors::temperature::INITIAL_C,
            setpoint,
            reactivate_temp,
            hold_ms,
            max_idle_ms,
            setpoint_reached_ms: 0,
            cooling_stopped_ms: 0,
            actuator_on: false,
            in_hold: false,
        }
    }

    /// Time spent holding at the setpoint (0 when not holding).
    pub fn hold_elapsed_ms(&self) -> u64 {
        if self.in_hold {
            self.now_ms.saturating_sub(self.setpoint_reached_ms)
        } else {
            0
        }
    }

    /// Time since cooling last stopped.
    pub fn idle_elapsed_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.cooling_stopped_ms)
    }
}
