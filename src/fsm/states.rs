//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  COOLING ──[temp <= setpoint]──▶ HOLDING
//!     ▲  ▲                          │   │
//!     │  └──────[temp > setpoint]───┘   │
//!     │                         [hold elapsed]
//!     │                                 ▼
//!     └──[temp >= reactivate OR idle timer]── IDLE
//! ```

use super::context::ThermostatContext;
use super::{StateDescriptor, StateId};
use log::debug;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Cooling
        StateDescriptor {
            id: StateId::Cooling,
            name: "Cooling",
            on_enter: Some(cooling_enter),
            on_exit: None,
            on_update: cooling_update,
        },
        // Index 1: Holding
        StateDescriptor {
            id: StateId::Holding,
            name: "Holding",
            on_enter: Some(holding_enter),
            on_exit: Some(holding_exit),
            on_update: holding_update,
        },
        // Index 2: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLING state (not yet at setpoint)
// ═══════════════════════════════════════════════════════════════════════════

fn cooling_enter(ctx: &mut ThermostatContext) {
    ctx.actuator_on = true;
}

fn cooling_update(ctx: &mut ThermostatContext) -> Option<StateId> {
    if ctx.current_temp <= ctx.setpoint {
        return Some(StateId::Holding);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  HOLDING state (at setpoint, actuator still on)
// ═══════════════════════════════════════════════════════════════════════════

fn holding_enter(ctx: &mut ThermostatContext) {
    ctx.actuator_on = true;
    ctx.in_hold = true;
    ctx.setpoint_reached_ms = ctx.now_ms;
    debug!(
        "Setpoint {:.1} °C reached, holding for {} ms",
        ctx.setpoint, ctx.hold_ms
    );
}

fn holding_exit(ctx: &mut ThermostatContext) {
    ctx.in_hold = false;
}

fn holding_update(ctx: &mut ThermostatContext) -> Option<StateId> {
    if ctx.current_temp > ctx.setpoint {
        return Some(StateId::Cooling);
    }
    if ctx.hold_elapsed_ms() >= ctx.hold_ms {
        ctx.cooling_stopped_ms = ctx.now_ms;
        return Some(StateId::Idle);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state (actuator off)
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut ThermostatContext) {
    ctx.actuator_on = false;
}

fn idle_update(ctx: &mut ThermostatContext) -> Option<StateId> {
    if ctx.current_temp >= ctx.reactivate_temp {
        debug!(
            "Reactivating: {:.1} °C >= {:.1} °C",
            ctx.current_temp, ctx.reactivate_temp
        );
        return Some(StateId::Cooling);
    }
    if ctx.idle_elapsed_ms() >= ctx.max_idle_ms {
        debug!("Reactivating: idle for {} ms", ctx.idle_elapsed_ms());
        return Some(StateId::Cooling);
    }
    None
}
