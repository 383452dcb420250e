//! Sensor drivers: the drop detector and the cold-plate probe.

pub mod drop_detector;
pub mod temperature;
