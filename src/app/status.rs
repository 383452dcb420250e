//! Point-in-time status published by the control loop.
//!
//! The snapshot is the only view collaborators get of the core: the web API
//! serializes it for `/api/status` and the display renders it.  It is `Copy`
//! and heap-free so it can sit in a static critical-section mutex.

use serde::Serialize;

use crate::config::SystemConfig;
use crate::weather::{STATIONS, SetpointMode, WeatherReading};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatStatus {
    pub cooling: bool,
    pub holding: bool,
    pub setpoint: f32,
    pub reactivate_temp: f32,
}

/// Per-collaborator health flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareHealth {
    pub temp_sensor: bool,
    pub drop_detector: bool,
    pub neo_pixel: bool,
    pub audio_player: bool,
    pub wifi: bool,
    pub web_server: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StationWeather {
    pub name: &'static str,
    pub temp: f32,
    pub humidity: f32,
}

/// Settings echoed back in dashboard units.  Fractional so that a value
/// read here and posted back unchanged lands on the same millisecond count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub freeze_duration_sec: f32,
    pub reactivate_timer_min: f32,
    pub led_fade_time_sec: f32,
    pub led_brightness: u8,
    pub cube_light: bool,
    pub cube_light_brightness: u8,
}

impl SettingsView {
    pub fn from_config(c: &SystemConfig) -> Self {
        Self {
            freeze_duration_sec: c.hold_duration_ms as f32 / 1_000.0,
            reactivate_timer_min: c.max_idle_ms as f32 / 60_000.0,
            led_fade_time_sec: c.fade_duration_ms as f32 / 1_000.0,
            led_brightness: c.led_brightness,
            cube_light: c.ambient_enabled,
            cube_light_brightness: c.ambient_brightness,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub thermostat: ThermostatStatus,
    /// Cached cold-plate temperature (°C).
    pub peltier_temp: f32,
    pub drop_count: u32,
    pub running: bool,
    /// `-1` manual, otherwise a station index.
    pub setpoint_mode: i32,
    pub manual_setpoint: f32,
    pub hardware: HardwareHealth,
    pub weather: [StationWeather; STATIONS.len()],
    pub settings: SettingsView,
}

impl StatusSnapshot {
    /// Station weather rows in [`STATIONS`] order.
    pub fn weather_rows(
        readings: &[WeatherReading; STATIONS.len()],
    ) -> [StationWeather; STATIONS.len()] {
        core::array::from_fn(|i| StationWeather {
            name: STATIONS[i].name,
            temp: readings[i].temp_c,
            humidity: readings[i].humidity,
        })
    }

    /// Short label for the display's first line.
    pub fn mode_label(&self) -> &'static str {
        match SetpointMode::from_selector(self.setpoint_mode) {
            Some(SetpointMode::Station(i)) => STATIONS[i].name,
            _ => "Manual",
        }
    }
}
