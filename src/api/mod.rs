//! Dashboard web API.
//!
//! Handlers never touch core state: commands travel over
//! [`channels::API_COMMANDS`] to the control loop, and status is read from
//! the snapshot the loop publishes after every tick.

pub mod channels;
pub mod form;
pub mod handlers;
