//! `application/x-www-form-urlencoded` decoding for `/api/update`.

use core::fmt;
use core::str::FromStr;

use crate::app::commands::SettingsUpdate;
use crate::weather::SetpointMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    /// A numeric field did not parse; carries the field name.
    Malformed(&'static str),
    /// `setpointMode` is neither `-1` nor a station index.
    UnknownStation,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(field) => write!(f, "invalid value for {field}"),
            Self::UnknownStation => write!(f, "unknown setpoint mode"),
        }
    }
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Percent-decode one component (`+` is a space).  A broken escape is kept
/// literally.
pub fn url_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                        continue;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Iterate decoded `(key, value)` pairs.
pub fn pairs(body: &str) -> impl Iterator<Item = (String, String)> + '_ {
    body.split('&').filter(|p| !p.is_empty()).map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (url_decode(k), url_decode(v))
    })
}

fn number<T: FromStr>(field: &'static str, value: &str) -> Result<Option<T>, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| FormError::Malformed(field))
}

/// A millisecond count.  The dashboard scales its second and minute inputs
/// in JavaScript, so fractional values like `1100.0000000000002` arrive and
/// are truncated.
fn millis(field: &'static str, value: &str) -> Result<Option<u32>, FormError> {
    let Some(ms) = number::<f64>(field, value)? else {
        return Ok(None);
    };
    if !ms.is_finite() || !(0.0..=f64::from(u32::MAX)).contains(&ms) {
        return Err(FormError::Malformed(field));
    }
    Ok(Some(ms as u32))
}

fn flag(field: &'static str, value: &str) -> Result<Option<bool>, FormError> {
    match value.trim() {
        "" => Ok(None),
        "1" | "true" | "on" => Ok(Some(true)),
        "0" | "false" | "off" => Ok(Some(false)),
        _ => Err(FormError::Malformed(field)),
    }
}

/// Decode the dashboard's settings form.  Unknown fields are ignored and an
/// empty value leaves the setting untouched.
pub fn parse_settings_form(body: &str) -> Result<SettingsUpdate, FormError> {
    let mut update = SettingsUpdate::default();
    for (key, value) in pairs(body) {
        match key.as_str() {
            "setpointMode" => {
                if let Some(sel) = number::<i32>("setpointMode", &value)? {
                    update.setpoint_mode =
                        Some(SetpointMode::from_selector(sel).ok_or(FormError::UnknownStation)?);
                }
            }
            "manualSetpoint" => update.manual_setpoint_c = number("manualSetpoint", &value)?,
            "reactivateTemp" => update.reactivate_temp_c = number("reactivateTemp", &value)?,
            "freezeDuration" => update.hold_duration_ms = millis("freezeDuration", &value)?,
            "reactivateTimer" => update.max_idle_ms = millis("reactivateTimer", &value)?,
            "ledFadeTime" => update.fade_duration_ms = millis("ledFadeTime", &value)?,
            "ledBrightness" => update.led_brightness = number("ledBrightness", &value)?,
            "cubeLight" => update.ambient_enabled = flag("cubeLight", &value)?,
            "cubeLightBrightness" => {
                update.ambient_brightness = number("cubeLightBrightness", &value)?;
            }
            _ => {}
        }
    }
    Ok(update)
}
