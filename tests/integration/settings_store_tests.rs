//! Settings persistence through the simulated NVS store.

use super::mock_hw::{LogSink, MockIo, MockNet, make_app};

use glacier::adapters::nvs::{SETTINGS_NAMESPACE, SettingsStore};
use glacier::app::commands::{AppCommand, SettingsUpdate};
use glacier::app::ports::{ConfigError, ConfigPort, StoragePort};
use glacier::config::SystemConfig;
use glacier::sensors::drop_detector::EdgeFlag;

#[test]
fn dashboard_update_survives_a_reboot() {
    let store = SettingsStore::new().unwrap();
    let boot_config = store.load().unwrap();
    assert_eq!(boot_config, SystemConfig::default());

    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, boot_config);
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();

    let update = SettingsUpdate {
        manual_setpoint_c: Some(-4.0),
        max_idle_ms: Some(600_000),
        ambient_brightness: Some(32),
        ..SettingsUpdate::default()
    };
    let cmd = AppCommand::UpdateSettings(update);
    assert!(app.handle_command(cmd, 0, &mut io, &mut net, &mut sink).ok);
    assert!(app.auto_save_if_needed(5_000, &store));

    // "Reboot": a fresh service from what the store holds.
    let reloaded = store.load().unwrap();
    assert!((reloaded.manual_setpoint_c + 4.0).abs() < 1e-6);
    assert_eq!(reloaded.max_idle_ms, 600_000);
    assert_eq!(reloaded.ambient_brightness, 32);

    let flag2 = EdgeFlag::new();
    let app2 = make_app(&flag2, reloaded);
    assert!((app2.thermostat().setpoint() + 4.0).abs() < 1e-6);
}

#[test]
fn store_refuses_what_validation_refuses() {
    let store = SettingsStore::new().unwrap();
    store.load().unwrap();
    let bad = SystemConfig {
        led_brightness: 200,
        hold_duration_ms: 10,
        ..SystemConfig::default()
    };
    assert!(matches!(store.save(&bad), Err(ConfigError::ValidationFailed(_))));
    assert_eq!(store.load().unwrap().led_brightness, 255, "nothing partially written");
}

#[test]
fn each_setting_is_its_own_key() {
    let store = SettingsStore::new().unwrap();
    store.load().unwrap();
    for key in [
        "setpoint",
        "reactivateT",
        "freezeDur",
        "reactTimer",
        "neoBright",
        "fadeDur",
        "tempInt",
        "audioVol",
        "dropTrack",
        "weatherInt",
        "cubeLight",
        "cubeBright",
        "debounce",
        "initialized",
    ] {
        assert!(store.storage().exists(SETTINGS_NAMESPACE, key), "missing key {key}");
    }
}

#[test]
fn reset_then_reload_gives_defaults() {
    let store = SettingsStore::new().unwrap();
    store
        .save(&SystemConfig {
            fade_duration_ms: 9_000,
            ..SystemConfig::default()
        })
        .unwrap();
    store.reset_to_defaults().unwrap();
    assert_eq!(store.load().unwrap(), SystemConfig::default());
}
