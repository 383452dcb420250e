//! Web API end to end: request → channel → control loop → reply JSON.
//!
//! The handler's poll callback drains the command channel into a real
//! `AppService`, standing in for the control loop task.  The channels are
//! process-wide statics, so these tests run one at a time.

use std::sync::{Mutex, MutexGuard};

use super::mock_hw::{LogSink, MockIo, MockNet, TestApp, make_app};

use glacier::api::channels;
use glacier::api::handlers::{Method, REPLY_POLL_MS, REPLY_TIMEOUT_MS, handle_request};
use glacier::app::commands::{AppCommand, CommandReply};
use glacier::config::SystemConfig;
use glacier::sensors::drop_detector::EdgeFlag;

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// Empty both channels so the next test starts clean.
fn flush_channels() {
    channels::drain_commands(|_| CommandReply::ok("flushed"));
    assert!(channels::take_reply(u32::MAX).is_none());
}

struct Loop {
    io: MockIo,
    net: MockNet,
    sink: LogSink,
}

impl Loop {
    fn new() -> Self {
        Self {
            io: MockIo::new(5.0),
            net: MockNet::offline(),
            sink: LogSink::new(),
        }
    }

    /// Answer every queued command the way the control loop task does.
    fn serve(&mut self, app: &mut TestApp<'_>, now_ms: u64) {
        channels::drain_commands(|cmd| {
            app.handle_command(cmd, now_ms, &mut self.io, &mut self.net, &mut self.sink)
        });
    }
}

#[test]
fn drop_request_round_trips_through_the_loop() {
    let _g = serial();
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, SystemConfig::default());
    let mut l = Loop::new();
    app.start(0, &mut l.sink);

    let resp = handle_request(Method::Post, "/api/drop", "", |_| {
        l.serve(&mut app, 100);
    });

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, r#"{"status":"ok","message":"Drop triggered!","dropCount":1}"#);
    assert_eq!(app.drop_count(), 1);
    assert_eq!(l.io.sounds, 1);
    flush_channels();
}

#[test]
fn pause_toggle_reports_running_flag() {
    let _g = serial();
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, SystemConfig::default());
    let mut l = Loop::new();

    let resp = handle_request(Method::Post, "/api/system/toggle", "", |_| {
        l.serve(&mut app, 0);
    });

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, r#"{"status":"ok","message":"System PAUSED","running":false}"#);
    assert!(!app.is_running());
    flush_channels();
}

#[test]
fn settings_form_updates_the_service() {
    let _g = serial();
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, SystemConfig::default());
    let mut l = Loop::new();

    let resp = handle_request(
        Method::Post,
        "/api/update",
        "ledBrightness=100&cubeLight=0&freezeDuration=120000",
        |_| {
            l.serve(&mut app, 0);
        },
    );

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, r#"{"status":"ok","message":"Settings updated"}"#);
    assert_eq!(app.config().led_brightness, 100);
    assert!(!app.config().ambient_enabled);
    assert_eq!(app.config().hold_duration_ms, 120_000);
    assert!(app.is_config_dirty());
    flush_channels();
}

#[test]
fn out_of_range_setting_is_refused() {
    let _g = serial();
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, SystemConfig::default());
    let mut l = Loop::new();

    let resp = handle_request(Method::Post, "/api/update", "reactivateTemp=-30", |_| {
        l.serve(&mut app, 0);
    });

    assert_eq!(resp.status, 400);
    assert!(resp.body.starts_with(r#"{"status":"error","message":"#));
    assert!((app.config().reactivate_temp_c - 13.0).abs() < 1e-6);
    flush_channels();
}

#[test]
fn malformed_form_never_reaches_the_loop() {
    let _g = serial();
    let resp = handle_request(Method::Post, "/api/update", "ledBrightness=lots", |_| {
        panic!("nothing should be queued");
    });
    assert_eq!(resp.status, 400);
    assert_eq!(resp.body, r#"{"error":"invalid value for ledBrightness"}"#);
    assert_eq!(channels::drain_commands(|_| CommandReply::ok("x")), 0);
}

#[test]
fn unknown_route_is_404() {
    let _g = serial();
    let resp = handle_request(Method::Get, "/api/firmware", "", |_| {});
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body, r#"{"error":"Not found"}"#);
}

#[test]
fn status_serves_the_published_snapshot() {
    let _g = serial();
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, SystemConfig::default());
    let mut l = Loop::new();
    app.start(0, &mut l.sink);
    app.tick(0, &mut l.io, &mut l.net, &mut l.sink);
    channels::publish_status(app.status());

    let resp = handle_request(Method::Get, "/api/status", "", |_| {});
    assert_eq!(resp.status, 200);

    let v: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(v["thermostat"]["cooling"], true);
    assert_eq!(v["thermostat"]["reactivateTemp"], 13.0);
    assert_eq!(v["peltierTemp"], 5.0);
    assert_eq!(v["dropCount"], 0);
    assert_eq!(v["running"], true);
    assert_eq!(v["setpointMode"], -1);
    assert_eq!(v["manualSetpoint"], -1.0);
    assert_eq!(v["hardware"]["dropDetector"], true);
    assert_eq!(v["hardware"]["wifi"], false);
    assert_eq!(v["weather"].as_array().map(Vec::len), Some(4));
    assert_eq!(v["weather"][0]["name"], "Ilulissat");
    assert_eq!(v["settings"]["freezeDurationSec"], 240.0);
    assert_eq!(v["settings"]["cubeLight"], true);
}

#[test]
fn status_settings_post_back_unchanged() {
    let _g = serial();
    let flag = EdgeFlag::new();
    let mut app = make_app(&flag, SystemConfig::default());
    let mut l = Loop::new();

    let body = "reactivateTimer=30000&ledFadeTime=2500&freezeDuration=1500";
    let resp = handle_request(Method::Post, "/api/update", body, |_| l.serve(&mut app, 0));
    assert_eq!(resp.status, 200);

    channels::publish_status(app.status());
    let resp = handle_request(Method::Get, "/api/status", "", |_| {});
    let v: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    let settings = &v["settings"];
    let idle_min = settings["reactivateTimerMin"].as_f64().unwrap();
    let fade_sec = settings["ledFadeTimeSec"].as_f64().unwrap();
    let hold_sec = settings["freezeDurationSec"].as_f64().unwrap();
    assert_eq!((idle_min, fade_sec, hold_sec), (0.5, 2.5, 1.5));

    // What the dashboard sends when the user saves without editing.
    let echo = format!(
        "reactivateTimer={}&ledFadeTime={}&freezeDuration={}",
        idle_min * 60_000.0,
        fade_sec * 1_000.0,
        hold_sec * 1_000.0
    );
    let resp = handle_request(Method::Post, "/api/update", &echo, |_| l.serve(&mut app, 10));
    assert_eq!(resp.status, 200, "{}", resp.body);
    assert_eq!(app.config().max_idle_ms, 30_000);
    assert_eq!(app.config().fade_duration_ms, 2_500);
    assert_eq!(app.config().hold_duration_ms, 1_500);
    flush_channels();
}

#[test]
fn full_queue_answers_503() {
    let _g = serial();
    let mut queued = 0;
    while channels::submit(AppCommand::TestAudio).is_ok() {
        queued += 1;
    }
    assert_eq!(queued, 8);

    let resp = handle_request(Method::Post, "/api/drop", "", |_| {});
    assert_eq!(resp.status, 503);
    assert_eq!(resp.body, r#"{"error":"Command queue full"}"#);
    flush_channels();
}

#[test]
fn silent_loop_times_out() {
    let _g = serial();
    let mut polls = 0;
    let resp = handle_request(Method::Post, "/api/test/audio", "", |ms| {
        assert_eq!(ms, REPLY_POLL_MS);
        polls += 1;
    });
    assert_eq!(resp.status, 504);
    assert_eq!(polls, REPLY_TIMEOUT_MS / REPLY_POLL_MS);
    flush_channels();
}

#[test]
fn stale_replies_are_discarded() {
    let _g = serial();
    let stale = channels::submit(AppCommand::TestLight).unwrap();
    channels::drain_commands(|_| CommandReply::ok("late"));

    let fresh = channels::submit(AppCommand::TestAudio).unwrap();
    assert!(fresh > stale);
    channels::drain_commands(|_| CommandReply::ok("Audio playing"));

    let reply = channels::take_reply(fresh).unwrap();
    assert_eq!(reply.message, "Audio playing");
    flush_channels();
}
