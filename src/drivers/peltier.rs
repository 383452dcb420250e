//! Peltier module driver (logic-level MOSFET on the cold plate).
//!
//! A dumb binary actuator: the thermostat decides, this driver only
//! drives the gate.  Generic over any `embedded-hal` output so the host
//! tests can substitute a recording pin.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::ActuatorSink;

pub struct PeltierDriver<P: OutputPin> {
    pin: P,
    on: bool,
    healthy: bool,
}

impl<P: OutputPin> PeltierDriver<P> {
    /// Takes ownership of the gate pin and forces it low.
    pub fn new(pin: P) -> Self {
        let mut drv = Self {
            pin,
            on: false,
            healthy: true,
        };
        drv.write(false);
        drv
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// False once a gate write has failed.
    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    fn write(&mut self, on: bool) {
        let res = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match res {
            Ok(()) => self.on = on,
            Err(_) => {
                warn!("Peltier: gate write failed (on={})", on);
                self.healthy = false;
            }
        }
    }
}

impl<P: OutputPin> ActuatorSink for PeltierDriver<P> {
    fn set_state(&mut self, on: bool) {
        self.write(on);
    }
}
