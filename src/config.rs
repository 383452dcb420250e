//! System configuration parameters
//!
//! All tunable parameters for the glacier installation.
//! Values are persisted by the settings store and can be overridden at
//! runtime from the web dashboard.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::sensors::drop_detector::TriggerEdge;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Thermostat ---
    /// Setpoint used while not linked to a weather station (°C)
    pub manual_setpoint_c: f32,
    /// Temperature at/above which idle cooling resumes (°C)
    pub reactivate_temp_c: f32,
    /// Minimum time cooling stays on after first reaching setpoint
    pub hold_duration_ms: u32,
    /// Maximum time cooling may stay off regardless of temperature
    pub max_idle_ms: u32,

    // --- Lighting ---
    /// Drop flash peak brightness (0-255)
    pub led_brightness: u8,
    /// One-shot fade length
    pub fade_duration_ms: u32,
    /// Ambient cube light on/off
    pub ambient_enabled: bool,
    /// Ambient cube light brightness (0-255)
    pub ambient_brightness: u8,

    // --- Drop sensor ---
    pub drop_debounce_ms: u32,
    pub drop_trigger_edge: TriggerEdge,

    // --- Audio ---
    /// Player volume (0-30)
    pub audio_volume: u8,
    pub drop_sound_track: u8,

    // --- Timing ---
    /// Temperature probe read interval
    pub temp_read_interval_ms: u32,
    /// Status display refresh interval
    pub display_interval_ms: u32,
    /// Weather refresh interval while WiFi is up
    pub weather_update_interval_ms: u32,
    /// WiFi reconnect interval while down
    pub wifi_retry_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Thermostat
            manual_setpoint_c: -1.0,
            reactivate_temp_c: 13.0,
            hold_duration_ms: 240_000, // 4 min
            max_idle_ms: 900_000,      // 15 min

            // Lighting
            led_brightness: 255,
            fade_duration_ms: 3_000,
            ambient_enabled: true,
            ambient_brightness: 128,

            // Drop sensor
            drop_debounce_ms: 50,
            drop_trigger_edge: TriggerEdge::Falling,

            // Audio
            audio_volume: 30,
            drop_sound_track: 1,

            // Timing
            temp_read_interval_ms: 5_000,
            display_interval_ms: 500,
            weather_update_interval_ms: 300_000, // 5 min
            wifi_retry_interval_ms: 60_000,
        }
    }
}

/// Range-check every field.  Out-of-range values are rejected, never
/// clamped.  Used by the settings store before persisting and by the
/// service before applying a dashboard update.
pub fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(-40.0..=30.0).contains(&cfg.manual_setpoint_c) {
        return Err(ConfigError::ValidationFailed(
            "manual_setpoint_c must be -40.0–30.0",
        ));
    }
    if !(-40.0..=40.0).contains(&cfg.reactivate_temp_c) {
        return Err(ConfigError::ValidationFailed(
            "reactivate_temp_c must be -40.0–40.0",
        ));
    }
    if cfg.reactivate_temp_c <= cfg.manual_setpoint_c {
        return Err(ConfigError::ValidationFailed(
            "reactivate_temp_c must be > manual_setpoint_c",
        ));
    }
    if !(1_000..=3_600_000).contains(&cfg.hold_duration_ms) {
        return Err(ConfigError::ValidationFailed(
            "hold_duration_ms must be 1 s–1 h",
        ));
    }
    if !(10_000..=86_400_000).contains(&cfg.max_idle_ms) {
        return Err(ConfigError::ValidationFailed(
            "max_idle_ms must be 10 s–24 h",
        ));
    }
    if !(100..=60_000).contains(&cfg.fade_duration_ms) {
        return Err(ConfigError::ValidationFailed(
            "fade_duration_ms must be 100–60000",
        ));
    }
    if cfg.audio_volume > 30 {
        return Err(ConfigError::ValidationFailed("audio_volume must be 0–30"));
    }
    if !(1..=5_000).contains(&cfg.drop_debounce_ms) {
        return Err(ConfigError::ValidationFailed(
            "drop_debounce_ms must be 1–5000",
        ));
    }
    if !(500..=60_000).contains(&cfg.temp_read_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "temp_read_interval_ms must be 500–60000",
        ));
    }
    if !(100..=10_000).contains(&cfg.display_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "display_interval_ms must be 100–10000",
        ));
    }
    if !(60_000..=3_600_000).contains(&cfg.weather_update_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "weather_update_interval_ms must be 1 min–1 h",
        ));
    }
    if !(5_000..=3_600_000).contains(&cfg.wifi_retry_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "wifi_retry_interval_ms must be 5 s–1 h",
        ));
    }
    Ok(())
}
