//! Glacier installation firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod fsm;
pub mod scheduler;
pub mod weather;

pub mod error;
pub mod pins;

// Platform-facing modules; the ESP-IDF implementations are guarded by cfg
// attributes inside and host builds get simulation stubs.
pub mod adapters;
pub mod api;
pub mod control;
pub mod drivers;
pub mod sensors;
