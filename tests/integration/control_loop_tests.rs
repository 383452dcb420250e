//! Control loop scenarios: thermostat cycle, drop reaction, pause, probe
//! faults, display gating, weather linking and settings persistence.
//!
//! Time is injected; every test drives `tick(now_ms)` directly.

use super::mock_hw::{
    LogSink, MockIo, MockNet, MockStore, TestApp, actuator_on, fast_config, make_app,
};

use glacier::app::commands::{AppCommand, SettingsUpdate};
use glacier::app::events::{AppEvent, DropSource};
use glacier::config::{SystemConfig, validate_config};
use glacier::fsm::StateId;
use glacier::sensors::drop_detector::EdgeFlag;
use glacier::weather::SetpointMode;

const STEP_MS: u64 = 500;

/// Tick every [`STEP_MS`] from `from` to `to` inclusive.
fn run(
    app: &mut TestApp<'_>,
    io: &mut MockIo,
    net: &mut MockNet,
    sink: &mut LogSink,
    from: u64,
    to: u64,
) {
    let mut t = from;
    while t <= to {
        app.tick(t, io, net, sink);
        t += STEP_MS;
    }
}

fn drops(sink: &LogSink, source: DropSource) -> usize {
    sink.count(|e| matches!(e, AppEvent::DropDetected { source: s, .. } if *s == source))
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn fast_config_is_a_config_the_device_accepts() {
    assert_eq!(validate_config(&fast_config()), Ok(()));
}

#[test]
fn boot_starts_cooling_with_green_blink() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut sink = LogSink::new();

    app.start(0, &mut sink);

    assert_eq!(app.state(), StateId::Cooling);
    assert!(actuator_on(&app));
    assert_eq!(sink.events.first(), Some(&AppEvent::Started(StateId::Cooling)));
    assert_eq!(app.animator().light().last(), Some((0, 255, 0)));
    assert!(app.is_running());
}

// ── Thermostat cycle ──────────────────────────────────────────

#[test]
fn hold_window_then_reactivation_by_temperature() {
    let flag = EdgeFlag::new();
    let config = SystemConfig {
        manual_setpoint_c: -1.0,
        reactivate_temp_c: 16.0,
        hold_duration_ms: 10_000,
        ..fast_config()
    };
    let mut app = make_app(&flag, config);
    let mut io = MockIo::new(20.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    app.tick(0, &mut io, &mut net, &mut sink);
    assert_eq!(app.state(), StateId::Cooling);

    // Setpoint reached at t = 500.
    io.temp_c = -1.0;
    app.tick(500, &mut io, &mut net, &mut sink);
    assert_eq!(app.state(), StateId::Holding);
    assert!(actuator_on(&app));

    let mut t = 1_000;
    while t < 10_500 {
        app.tick(t, &mut io, &mut net, &mut sink);
        assert!(actuator_on(&app), "actuator dropped out of the hold at {t} ms");
        t += STEP_MS;
    }

    app.tick(10_500, &mut io, &mut net, &mut sink);
    assert_eq!(app.state(), StateId::Idle);
    assert!(!actuator_on(&app));

    // Warming below the reactivate threshold keeps it idle.
    io.temp_c = 15.0;
    app.tick(11_000, &mut io, &mut net, &mut sink);
    assert!(!actuator_on(&app));

    io.temp_c = 16.0;
    app.tick(11_500, &mut io, &mut net, &mut sink);
    assert_eq!(app.state(), StateId::Cooling);
    assert!(actuator_on(&app));

    let transitions: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (StateId::Cooling, StateId::Holding),
            (StateId::Holding, StateId::Idle),
            (StateId::Idle, StateId::Cooling),
        ]
    );
}

#[test]
fn warming_during_hold_restarts_the_race() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(-2.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    app.tick(0, &mut io, &mut net, &mut sink);
    assert_eq!(app.state(), StateId::Holding);

    io.temp_c = 0.5;
    app.tick(500, &mut io, &mut net, &mut sink);
    assert_eq!(app.state(), StateId::Cooling);
    assert!(actuator_on(&app));
}

#[test]
fn idle_timer_reactivates_without_warming() {
    let flag = EdgeFlag::new();
    let config = SystemConfig {
        hold_duration_ms: 1_000,
        max_idle_ms: 30_000,
        ..fast_config()
    };
    let mut app = make_app(&flag, config);
    let mut io = MockIo::new(-5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    app.tick(0, &mut io, &mut net, &mut sink);
    assert_eq!(app.state(), StateId::Holding);

    run(&mut app, &mut io, &mut net, &mut sink, 500, 1_000);
    assert_eq!(app.state(), StateId::Idle);

    // Stays cold the whole time; only the idle timer can restart cooling.
    run(&mut app, &mut io, &mut net, &mut sink, 1_500, 30_500);
    assert!(!actuator_on(&app));

    app.tick(31_000, &mut io, &mut net, &mut sink);
    assert!(actuator_on(&app));
}

// ── Drop reaction ─────────────────────────────────────────────

#[test]
fn drop_while_idle_reacts_within_one_tick() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);
    app.tick(0, &mut io, &mut net, &mut sink);

    let reply = app.handle_command(AppCommand::ToggleCooling, 100, &mut io, &mut net, &mut sink);
    assert!(reply.ok);
    assert_eq!(app.state(), StateId::Idle);
    assert!(!actuator_on(&app));

    let colours_before = app.animator().light().colours.len();
    flag.raise();
    app.tick(200, &mut io, &mut net, &mut sink);

    assert_eq!(app.drop_count(), 1);
    assert!(actuator_on(&app));
    assert_eq!(app.state(), StateId::Cooling);
    assert_eq!(io.sounds, 1);
    assert!(
        app.animator().light().colours[colours_before..].contains(&(255, 255, 255)),
        "full-brightness flash missing"
    );
    assert!(app.animator().is_fading());
    assert_eq!(drops(&sink, DropSource::Sensor), 1);
}

#[test]
fn bounce_inside_debounce_window_is_absorbed() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    flag.raise();
    app.tick(1_000, &mut io, &mut net, &mut sink);
    flag.raise();
    app.tick(1_020, &mut io, &mut net, &mut sink);
    assert_eq!(app.drop_count(), 1);
    assert!(!flag.is_raised(), "bounce must still clear the flag");

    flag.raise();
    app.tick(1_050, &mut io, &mut net, &mut sink);
    assert_eq!(app.drop_count(), 2);
    assert_eq!(io.sounds, 2);
}

#[test]
fn button_press_runs_the_same_reaction() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    io.press_pending = true;
    app.tick(500, &mut io, &mut net, &mut sink);

    assert_eq!(app.drop_count(), 1);
    assert_eq!(io.sounds, 1);
    assert_eq!(drops(&sink, DropSource::Button), 1);
}

#[test]
fn api_drop_reports_the_new_count() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    let reply = app.handle_command(AppCommand::TriggerDrop, 100, &mut io, &mut net, &mut sink);
    assert_eq!(reply.message, "Drop triggered!");
    assert_eq!(reply.drop_count, Some(1));
    assert_eq!(drops(&sink, DropSource::Api), 1);
}

// ── Pause ─────────────────────────────────────────────────────

#[test]
fn pause_stops_sensing_but_not_lighting() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);
    app.tick(0, &mut io, &mut net, &mut sink);

    let reply = app.handle_command(AppCommand::TogglePause, 100, &mut io, &mut net, &mut sink);
    assert_eq!(reply.message, "System PAUSED");
    assert_eq!(reply.running, Some(false));
    assert!(!app.is_running());

    let reads = io.reads;
    let frames = app.animator().light().colours.len();
    flag.raise();
    run(&mut app, &mut io, &mut net, &mut sink, 200, 1_500);

    assert_eq!(app.drop_count(), 0, "sensor drops are ignored while paused");
    assert_eq!(io.reads, reads, "probe is not read while paused");
    assert!(app.animator().light().colours.len() > frames, "startup blink kept animating");

    let reply = app.handle_command(AppCommand::TogglePause, 1_600, &mut io, &mut net, &mut sink);
    assert_eq!(reply.message, "System RESUMED");
    assert_eq!(reply.running, Some(true));

    // The edge latched while paused was discarded on resume.
    app.tick(1_700, &mut io, &mut net, &mut sink);
    assert_eq!(app.drop_count(), 0);
    assert!(sink.events.contains(&AppEvent::Paused));
    assert!(sink.events.contains(&AppEvent::Resumed));
}

#[test]
fn button_still_works_while_paused() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);
    app.handle_command(AppCommand::TogglePause, 0, &mut io, &mut net, &mut sink);

    io.press_pending = true;
    app.tick(100, &mut io, &mut net, &mut sink);
    assert_eq!(app.drop_count(), 1);
}

// ── Probe faults ──────────────────────────────────────────────

#[test]
fn sentinel_reading_keeps_the_cached_temperature() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(4.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    app.tick(0, &mut io, &mut net, &mut sink);
    assert!((app.status().peltier_temp - 4.0).abs() < 1e-6);

    io.temp_c = -127.0;
    io.probe_ok = false;
    app.tick(500, &mut io, &mut net, &mut sink);
    assert!((app.status().peltier_temp - 4.0).abs() < 1e-6);
    assert!(!app.status().hardware.temp_sensor);
    assert_eq!(sink.count(|e| *e == AppEvent::ProbeFault), 1);

    io.temp_c = 85.0;
    app.tick(1_000, &mut io, &mut net, &mut sink);
    assert!((app.status().peltier_temp - 4.0).abs() < 1e-6);
    assert_eq!(sink.count(|e| *e == AppEvent::ProbeFault), 2);
}

#[test]
fn every_probe_read_emits_telemetry() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(4.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    run(&mut app, &mut io, &mut net, &mut sink, 0, 2_000);
    assert_eq!(io.reads, 5);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 5);
}

// ── Display gating ────────────────────────────────────────────

#[test]
fn display_waits_for_light_effects_to_finish() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(4.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    // Startup blinks run for eight seconds.
    run(&mut app, &mut io, &mut net, &mut sink, 0, 7_900);
    assert_eq!(io.renders, 0);

    app.tick(8_000, &mut io, &mut net, &mut sink);
    assert_eq!(io.renders, 1);
    assert_eq!(io.last_render.map(|s| s.drop_count), Some(0));

    // A test light suspends it again.
    app.handle_command(AppCommand::TestLight, 8_100, &mut io, &mut net, &mut sink);
    assert_eq!(app.animator().light().last(), Some((255, 255, 255)));
    run(&mut app, &mut io, &mut net, &mut sink, 8_100, 13_000);
    assert_eq!(io.renders, 1);

    run(&mut app, &mut io, &mut net, &mut sink, 13_100, 13_600);
    assert!(io.renders > 1);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn toggle_and_force_cooling() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    let reply = app.handle_command(AppCommand::ToggleCooling, 10, &mut io, &mut net, &mut sink);
    assert_eq!(reply.message, "Peltier turned OFF (will restart based on thermostat logic)");
    assert!(!actuator_on(&app));

    let reply = app.handle_command(AppCommand::ToggleCooling, 20, &mut io, &mut net, &mut sink);
    assert_eq!(reply.message, "Peltier forced ON");
    assert!(actuator_on(&app));

    let writes = app.thermostat().actuator().writes.len();
    let reply = app.handle_command(AppCommand::ForceCooling, 30, &mut io, &mut net, &mut sink);
    assert!(reply.ok);
    assert_eq!(app.thermostat().actuator().writes.len(), writes, "no-op while cooling");
}

#[test]
fn test_audio_plays_once() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();

    let reply = app.handle_command(AppCommand::TestAudio, 0, &mut io, &mut net, &mut sink);
    assert_eq!(reply.message, "Audio playing");
    assert_eq!(io.sounds, 1);
    assert_eq!(app.drop_count(), 0);
}

// ── Weather ───────────────────────────────────────────────────

#[test]
fn wifi_retry_follows_its_interval() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    run(&mut app, &mut io, &mut net, &mut sink, 0, 59_900);
    assert_eq!(net.connect_attempts, 1);
    app.tick(60_000, &mut io, &mut net, &mut sink);
    assert_eq!(net.connect_attempts, 2);
    assert!(!app.status().hardware.wifi);
}

#[test]
fn connect_triggers_a_weather_refresh() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::online([-7.0, 3.0, 25.0, 18.0]);
    net.connected = false;
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    app.tick(0, &mut io, &mut net, &mut sink);
    assert_eq!(net.connect_attempts, 1);
    app.tick(500, &mut io, &mut net, &mut sink);
    assert_eq!(net.refreshes, 1);
    assert_eq!(net.fetches, 4);

    let status = app.status();
    assert!(status.hardware.wifi);
    assert!((status.weather[2].temp - 25.0).abs() < 1e-6);
    assert_eq!(status.weather[2].name, "Hong Kong");

    // Next refresh only after the weather interval.
    run(&mut app, &mut io, &mut net, &mut sink, 1_000, 5_000);
    assert_eq!(net.fetches, 4);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::WeatherUpdated { .. })), 4);
}

#[test]
fn slow_weather_fetches_never_stall_the_loop() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::online([-7.0, 3.0, 25.0, 18.0]);
    net.deferred = true;
    let mut sink = LogSink::new();
    app.start(0, &mut sink);

    let link = SettingsUpdate {
        setpoint_mode: Some(SetpointMode::Station(2)),
        ..SettingsUpdate::default()
    };
    let cmd = AppCommand::UpdateSettings(link);
    let reply = app.handle_command(cmd, 0, &mut io, &mut net, &mut sink);
    assert_eq!(reply.message, "Linked to station");
    assert!(net.is_busy());
    // Hong Kong's built-in reading until the fetch lands.
    assert!((app.thermostat().setpoint() - 26.0).abs() < 1e-6);

    run(&mut app, &mut io, &mut net, &mut sink, 0, 2_000);
    assert_eq!(io.reads, 5, "probe kept its schedule while the fetch was out");
    assert_eq!(sink.count(|e| matches!(e, AppEvent::WeatherUpdated { .. })), 0);
    assert!((app.thermostat().setpoint() - 26.0).abs() < 1e-6);

    net.complete();
    app.tick(2_500, &mut io, &mut net, &mut sink);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::WeatherUpdated { .. })), 4);
    assert!((app.thermostat().setpoint() - 25.0).abs() < 1e-6);
    assert_eq!(net.refreshes, 1);
}

#[test]
fn linking_a_station_drives_the_setpoint() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, SystemConfig::default());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::online([-7.0, 3.0, 25.0, 18.0]);
    let mut sink = LogSink::new();

    let link = SettingsUpdate {
        setpoint_mode: Some(SetpointMode::Station(0)),
        ..SettingsUpdate::default()
    };
    let cmd = AppCommand::UpdateSettings(link);
    let reply = app.handle_command(cmd, 0, &mut io, &mut net, &mut sink);
    assert_eq!(reply.message, "Linked to station");
    assert_eq!(app.setpoint_mode(), SetpointMode::Station(0));
    assert!((app.thermostat().setpoint() + 7.0).abs() < 1e-6);
    assert_eq!(app.status().setpoint_mode, 0);
    assert!(!app.is_config_dirty(), "the mode is not persisted");

    let manual = SettingsUpdate {
        setpoint_mode: Some(SetpointMode::Manual),
        ..SettingsUpdate::default()
    };
    let cmd = AppCommand::UpdateSettings(manual);
    let reply = app.handle_command(cmd, 10, &mut io, &mut net, &mut sink);
    assert_eq!(reply.message, "Switched to manual mode");
    assert!((app.thermostat().setpoint() + 1.0).abs() < 1e-6);
    assert_eq!(app.status().setpoint_mode, -1);
}

#[test]
fn linking_connects_first_when_offline() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, SystemConfig::default());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::online([-7.0, 3.0, 25.0, 18.0]);
    net.connected = false;
    let mut sink = LogSink::new();

    let link = SettingsUpdate {
        setpoint_mode: Some(SetpointMode::Station(3)),
        ..SettingsUpdate::default()
    };
    let cmd = AppCommand::UpdateSettings(link);
    let reply = app.handle_command(cmd, 0, &mut io, &mut net, &mut sink);
    assert!(reply.ok);
    assert_eq!(reply.message, "Connected to WiFi and linked to station");
    assert!((app.thermostat().setpoint() - 18.0).abs() < 1e-6);
}

#[test]
fn linking_without_wifi_stays_manual() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, SystemConfig::default());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();

    let link = SettingsUpdate {
        setpoint_mode: Some(SetpointMode::Station(2)),
        ..SettingsUpdate::default()
    };
    let cmd = AppCommand::UpdateSettings(link);
    let reply = app.handle_command(cmd, 0, &mut io, &mut net, &mut sink);
    assert!(!reply.ok);
    assert_eq!(reply.message, "WiFi connection failed, staying in manual mode");
    assert_eq!(app.setpoint_mode(), SetpointMode::Manual);
    assert!((app.thermostat().setpoint() + 1.0).abs() < 1e-6);
}

// ── Settings ──────────────────────────────────────────────────

#[test]
fn invalid_update_is_rejected_whole() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, SystemConfig::default());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();

    let update = SettingsUpdate {
        led_brightness: Some(10),
        reactivate_temp_c: Some(-5.0),
        ..SettingsUpdate::default()
    };
    let cmd = AppCommand::UpdateSettings(update);
    let reply = app.handle_command(cmd, 0, &mut io, &mut net, &mut sink);
    assert!(!reply.ok);
    assert_eq!(app.config().led_brightness, 255);
    assert!(!app.is_config_dirty());
    assert!(!sink.events.contains(&AppEvent::SettingsChanged));
}

#[test]
fn update_applies_and_auto_saves_after_delay() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, SystemConfig::default());
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    let store = MockStore::default();

    let update = SettingsUpdate {
        hold_duration_ms: Some(60_000),
        fade_duration_ms: Some(1_500),
        ambient_enabled: Some(false),
        ..SettingsUpdate::default()
    };
    let cmd = AppCommand::UpdateSettings(update);
    let reply = app.handle_command(cmd, 1_000, &mut io, &mut net, &mut sink);
    assert_eq!(reply.message, "Settings updated");
    assert_eq!(app.animator().fade_duration_ms(), 1_500);
    assert!(app.is_config_dirty());
    assert!(sink.events.contains(&AppEvent::SettingsChanged));

    assert!(!app.auto_save_if_needed(5_999, &store));
    assert!(app.auto_save_if_needed(6_000, &store));
    assert!(!app.is_config_dirty());
    let saved = store.saved.borrow().clone().unwrap();
    assert_eq!(saved.hold_duration_ms, 60_000);
    assert!(!saved.ambient_enabled);
    assert!((app.status().settings.freeze_duration_sec - 60.0).abs() < 1e-6);
}

#[test]
fn failed_save_retries_after_another_delay() {
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, fast_config());
    let store = MockStore::default();
    store.fail.set(true);

    app.mark_config_dirty(0);
    assert!(!app.auto_save_if_needed(5_000, &store));
    assert!(app.is_config_dirty());

    store.fail.set(false);
    assert!(!app.auto_save_if_needed(9_999, &store));
    assert!(app.auto_save_if_needed(10_000, &store));
    assert_eq!(store.saves.get(), 1);
}

#[test]
fn reset_restores_defaults_and_requests_restart() {
    let flag = EdgeFlag::new();
    let config = SystemConfig {
        led_brightness: 40,
        ..fast_config()
    };
    let mut app = make_app(&flag, config);
    let mut io = MockIo::new(5.0);
    let mut net = MockNet::offline();
    let mut sink = LogSink::new();
    let store = MockStore::default();

    let reply = app.handle_command(AppCommand::ResetSettings, 0, &mut io, &mut net, &mut sink);
    assert_eq!(reply.message, "Settings reset to defaults. Device will restart in 3 seconds...");
    assert_eq!(app.config(), &SystemConfig::default());
    assert!(app.take_restart_request());
    assert!(!app.take_restart_request(), "request is consumed");

    app.force_save_if_dirty(&store);
    assert_eq!(store.saves.get(), 1);
    assert_eq!(store.saved.borrow().as_ref(), Some(&SystemConfig::default()));
}
