//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (the web API
//! task, the boot sequence) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::weather::SetpointMode;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Run the drop reaction as if the sensor fired.
    TriggerDrop,

    /// Cooling → operator off; idle → forced on.
    ToggleCooling,

    /// Force cooling on (no-op while already cooling).
    ForceCooling,

    /// Flip the pause flag of the control loop.
    TogglePause,

    /// Apply a partial settings update.
    UpdateSettings(SettingsUpdate),

    /// Restore compiled-in defaults, persist them and request a restart.
    ResetSettings,

    /// Full-white test light.
    TestLight,

    /// Play the event sound once.
    TestAudio,
}

/// A partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub setpoint_mode: Option<SetpointMode>,
    pub manual_setpoint_c: Option<f32>,
    pub reactivate_temp_c: Option<f32>,
    pub hold_duration_ms: Option<u32>,
    pub max_idle_ms: Option<u32>,
    pub fade_duration_ms: Option<u32>,
    pub led_brightness: Option<u8>,
    pub ambient_enabled: Option<bool>,
    pub ambient_brightness: Option<u8>,
}

impl SettingsUpdate {
    /// Whether any persisted setting is touched (the mode is runtime-only).
    pub fn touches_config(&self) -> bool {
        self.manual_setpoint_c.is_some()
            || self.reactivate_temp_c.is_some()
            || self.hold_duration_ms.is_some()
            || self.max_idle_ms.is_some()
            || self.fade_duration_ms.is_some()
            || self.led_brightness.is_some()
            || self.ambient_enabled.is_some()
            || self.ambient_brightness.is_some()
    }
}

/// Outcome of a command, rendered by the web API as `{status,message,..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandReply {
    pub ok: bool,
    pub message: &'static str,
    /// Set by `TogglePause`.
    pub running: Option<bool>,
    /// Set by `TriggerDrop`.
    pub drop_count: Option<u32>,
}

impl CommandReply {
    pub fn ok(message: &'static str) -> Self {
        Self {
            ok: true,
            message,
            running: None,
            drop_count: None,
        }
    }

    pub fn error(message: &'static str) -> Self {
        Self {
            ok: false,
            ..Self::ok(message)
        }
    }
}
