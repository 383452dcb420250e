//! Application core: domain logic behind port traits.
//!
//! This module contains the control loop of the installation: thermostat
//! orchestration, drop reactions, lighting, setpoint linking and settings
//! lifecycle.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod status;
