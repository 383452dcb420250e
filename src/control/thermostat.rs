//! Asymmetric-hysteresis cooling thermostat.
//!
//! Wraps the table-driven [`Fsm`] and owns the cooling actuator.  The FSM
//! decides; this type writes the decision to the [`ActuatorSink`] and adds
//! the operator overrides.
//!
//! Cooling stops once the plate has held at or below the setpoint for the
//! hold duration, and restarts when the plate warms to the reactivate
//! temperature or the idle timer runs out, whichever comes first.
//!
//! ## Manual overrides
//!
//! `turn_on` / `turn_off` drive the actuator unconditionally and move the
//! FSM to the matching macro-state, but never touch the hold or idle timer
//! anchors.  After `turn_off` the idle timer therefore still counts from
//! the last natural stop.

use log::{debug, warn};

use crate::app::ports::ActuatorSink;
use crate::fsm::context::ThermostatContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};

pub struct HysteresisThermostat<A: ActuatorSink> {
    fsm: Fsm,
    ctx: ThermostatContext,
    actuator: A,
    /// Last state written to the actuator.
    applied: bool,
}

impl<A: ActuatorSink> HysteresisThermostat<A> {
    /// Create the thermostat in `Idle` with the actuator off.
    pub fn new(
        mut actuator: A,
        setpoint: f32,
        reactivate_temp: f32,
        hold_ms: u64,
        max_idle_ms: u64,
    ) -> Self {
        let mut ctx = ThermostatContext::new(setpoint, reactivate_temp, hold_ms, max_idle_ms);
        let mut fsm = Fsm::new(build_state_table(), StateId::Idle);
        fsm.start(&mut ctx);
        actuator.set_state(false);
        Self {
            fsm,
            ctx,
            actuator,
            applied: false,
        }
    }

    // ── Control ───────────────────────────────────────────────

    /// Run one evaluation against the cached temperature.
    pub fn update(&mut self, now_ms: u64) {
        self.ctx.now_ms = now_ms;
        self.fsm.update(&mut self.ctx);
        self.apply();
    }

    /// Start cooling now, bypassing both reactivation conditions.
    /// No-op while already cooling or holding.
    pub fn force_activate(&mut self, now_ms: u64) {
        if self.fsm.current_state() != StateId::Idle {
            debug!("force_activate ignored: already {:?}", self.fsm.current_state());
            return;
        }
        self.ctx.now_ms = now_ms;
        self.fsm.force_transition(StateId::Cooling, &mut self.ctx);
        self.apply();
    }

    /// Operator override: actuator on.
    pub fn turn_on(&mut self, now_ms: u64) {
        self.ctx.now_ms = now_ms;
        if self.fsm.current_state() == StateId::Idle {
            self.fsm.force_transition(StateId::Cooling, &mut self.ctx);
        }
        self.ctx.actuator_on = true;
        self.write_actuator(true);
    }

    /// Operator override: actuator off.
    pub fn turn_off(&mut self, now_ms: u64) {
        self.ctx.now_ms = now_ms;
        self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        self.ctx.actuator_on = false;
        self.write_actuator(false);
    }

    // ── Inputs ────────────────────────────────────────────────

    pub fn set_current_temp(&mut self, temp_c: f32) {
        self.ctx.current_temp = temp_c;
    }

    pub fn set_setpoint(&mut self, temp_c: f32) {
        self.ctx.setpoint = temp_c;
        self.warn_if_inverted();
    }

    pub fn set_reactivate_temp(&mut self, temp_c: f32) {
        self.ctx.reactivate_temp = temp_c;
        self.warn_if_inverted();
    }

    pub fn set_hold_ms(&mut self, ms: u64) {
        self.ctx.hold_ms = ms;
    }

    pub fn set_max_idle_ms(&mut self, ms: u64) {
        self.ctx.max_idle_ms = ms;
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_cooling(&self) -> bool {
        self.ctx.actuator_on
    }

    pub fn is_holding(&self) -> bool {
        self.ctx.in_hold
    }

    pub fn current_temp(&self) -> f32 {
        self.ctx.current_temp
    }

    pub fn setpoint(&self) -> f32 {
        self.ctx.setpoint
    }

    pub fn reactivate_temp(&self) -> f32 {
        self.ctx.reactivate_temp
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply(&mut self) {
        if self.ctx.actuator_on != self.applied {
            self.write_actuator(self.ctx.actuator_on);
        }
    }

    fn write_actuator(&mut self, on: bool) {
        self.actuator.set_state(on);
        self.applied = on;
    }

    /// Accepted as given; idle will reactivate on every update.
    fn warn_if_inverted(&self) {
        if self.ctx.reactivate_temp <= self.ctx.setpoint {
            warn!(
                "Reactivate {:.1} °C is not above setpoint {:.1} °C",
                self.ctx.reactivate_temp, self.ctx.setpoint
            );
        }
    }
}
