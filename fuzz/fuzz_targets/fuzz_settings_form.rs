//! Fuzz target: `parse_settings_form`
//!
//! Feeds arbitrary (lossily decoded) bodies into the dashboard form parser.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Accept/reject is deterministic
//! - A body with no recognised field parses to an empty update
//!
//! cargo fuzz run fuzz_settings_form

#![no_main]

use glacier::api::form::{pairs, parse_settings_form, url_decode};
use glacier::app::commands::SettingsUpdate;
use libfuzzer_sys::fuzz_target;

const FIELDS: [&str; 9] = [
    "setpointMode",
    "manualSetpoint",
    "reactivateTemp",
    "freezeDuration",
    "reactivateTimer",
    "ledFadeTime",
    "ledBrightness",
    "cubeLight",
    "cubeLightBrightness",
];

fuzz_target!(|data: &[u8]| {
    let body = String::from_utf8_lossy(data);

    let first = parse_settings_form(&body);
    let second = parse_settings_form(&body);
    assert_eq!(first.is_ok(), second.is_ok(), "parser must be deterministic");

    if let Err(e) = &first {
        assert!(!e.to_string().is_empty());
    }

    let recognised = pairs(&body).any(|(k, _)| FIELDS.contains(&k.as_str()));
    if !recognised {
        assert_eq!(first, Ok(SettingsUpdate::default()));
    }

    let _ = url_decode(&body);
});
