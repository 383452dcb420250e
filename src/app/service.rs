//! Application service: the hexagonal core and the control loop.
//!
//! [`AppService`] owns the thermostat, the drop detector, the light
//! animator and the runtime state around them (drop counter, pause flag,
//! setpoint mode, station readings, interval timers).  All other I/O
//! flows through port traits injected at call sites, so the whole loop is
//! testable with mock adapters and an injected clock.
//!
//! ```text
//!  ControlIo ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                │          AppService          │
//! WeatherPort ◀─▶│ Detector · Thermostat · Fade │ ──▶ StatusSnapshot
//!                └──────────────────────────────┘
//! ```
//!
//! One [`tick`](AppService::tick) is one pass of the cooperative loop:
//!
//! 1. sample inputs (button);
//! 2. when running: probe read on its interval, thermostat update, drop
//!    poll (a drop forces cooling on in the same tick);
//! 3. always: fade tick, ambient tick;
//! 4. WiFi retry / weather refresh;
//! 5. display refresh unless a light effect is running;
//! 6. a button press runs the same drop reaction.

use log::{debug, info, warn};

use crate::config::{SystemConfig, validate_config};
use crate::control::thermostat::HysteresisThermostat;
use crate::drivers::led_fade::FadeAnimator;
use crate::fsm::StateId;
use crate::scheduler::IntervalTimer;
use crate::sensors::drop_detector::DropDetector;
use crate::sensors::temperature::{INITIAL_C, is_sentinel};
use crate::weather::{STATIONS, SetpointMode, StationReading, WeatherReading};

use super::commands::{AppCommand, CommandReply, SettingsUpdate};
use super::events::{AppEvent, DropSource, TelemetryData};
use super::ports::{
    ActuatorSink, ConfigError, ConfigPort, ControlIo, EventSink, LightSink, WeatherPort,
};
use super::status::{HardwareHealth, SettingsView, StatusSnapshot, ThermostatStatus};

/// Auto-save delay after the last settings change.
const AUTO_SAVE_DELAY_MS: u64 = 5_000;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<'a, A: ActuatorSink, L: LightSink> {
    config: SystemConfig,
    thermostat: HysteresisThermostat<A>,
    detector: DropDetector<'a>,
    animator: FadeAnimator<L>,

    running: bool,
    drop_count: u32,
    /// Not persisted: every boot starts in manual mode.
    setpoint_mode: SetpointMode,
    weather: [WeatherReading; STATIONS.len()],
    cached_temp_c: f32,
    health: HardwareHealth,

    temp_timer: IntervalTimer,
    display_timer: IntervalTimer,
    wifi_timer: IntervalTimer,
    weather_timer: IntervalTimer,

    config_dirty: bool,
    dirty_since_ms: u64,
    restart_requested: bool,
}

impl<'a, A: ActuatorSink, L: LightSink> AppService<'a, A, L> {
    /// Construct the service from configuration.  The thermostat starts
    /// idle with the actuator off; call [`start`](Self::start) next.
    pub fn new(
        config: SystemConfig,
        actuator: A,
        light: L,
        mut detector: DropDetector<'a>,
    ) -> Self {
        let thermostat = HysteresisThermostat::new(
            actuator,
            config.manual_setpoint_c,
            config.reactivate_temp_c,
            u64::from(config.hold_duration_ms),
            u64::from(config.max_idle_ms),
        );
        detector.set_debounce_ms(config.drop_debounce_ms);
        let animator = FadeAnimator::new(light, config.fade_duration_ms);

        Self {
            temp_timer: IntervalTimer::immediate(u64::from(config.temp_read_interval_ms)),
            display_timer: IntervalTimer::new(u64::from(config.display_interval_ms)),
            wifi_timer: IntervalTimer::immediate(u64::from(config.wifi_retry_interval_ms)),
            weather_timer: IntervalTimer::new(u64::from(config.weather_update_interval_ms)),
            config,
            thermostat,
            detector,
            animator,
            running: true,
            drop_count: 0,
            setpoint_mode: SetpointMode::Manual,
            weather: STATIONS.map(|s| WeatherReading::default_for(&s)),
            cached_temp_c: INITIAL_C,
            health: HardwareHealth {
                drop_detector: true,
                ..HardwareHealth::default()
            },
            config_dirty: false,
            dirty_since_ms: 0,
            restart_requested: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Boot: cooling starts immediately and the green startup blinks run.
    pub fn start(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        self.thermostat.turn_on(now_ms);
        self.animator.start_sequence(now_ms, self.config.led_brightness);
        sink.emit(&AppEvent::Started(self.thermostat.state()));
        info!("AppService started in {:?}", self.thermostat.state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One pass of the control loop.  Never blocks and never fails:
    /// collaborator faults degrade to stale data.
    pub fn tick(
        &mut self,
        now_ms: u64,
        io: &mut impl ControlIo,
        net: &mut impl WeatherPort,
        sink: &mut impl EventSink,
    ) {
        let prev_state = self.thermostat.state();

        // 1. Inputs
        io.update_inputs(now_ms);

        // 2. Sensing and thermostat, only while running
        if self.running {
            if self.temp_timer.poll(now_ms) {
                self.read_probe(io, sink);
            }
            self.thermostat.set_current_temp(self.cached_temp_c);
            self.thermostat.update(now_ms);

            if self.detector.poll(now_ms) {
                self.drop_reaction(now_ms, DropSource::Sensor, io, sink);
            }
        }

        // 3. Lighting runs even while paused
        self.animator.tick(now_ms);
        self.animator.ambient_tick(
            now_ms,
            self.thermostat.is_cooling(),
            self.config.ambient_enabled,
            self.config.ambient_brightness,
        );

        // 4. Network
        self.service_network(now_ms, net, sink);

        // 5. Display
        self.refresh_health(&*io, &*net);
        if !self.animator.is_active() && self.display_timer.poll(now_ms) {
            io.render(&self.status());
        }

        // 6. Button
        if io.was_pressed() {
            self.drop_reaction(now_ms, DropSource::Button, io, sink);
        }

        self.emit_transition(prev_state, sink);
    }

    fn read_probe(&mut self, io: &mut impl ControlIo, sink: &mut impl EventSink) {
        let reading = io.request_reading();
        if is_sentinel(reading) || !reading.is_finite() {
            warn!(
                "Probe returned {:.1} °C, keeping {:.1} °C",
                reading, self.cached_temp_c
            );
            sink.emit(&AppEvent::ProbeFault);
        } else {
            self.cached_temp_c = reading;
        }
        sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
    }

    /// Count, flash, chime, and force cooling on, all within this tick.
    fn drop_reaction(
        &mut self,
        now_ms: u64,
        source: DropSource,
        io: &mut impl ControlIo,
        sink: &mut impl EventSink,
    ) {
        self.drop_count = self.drop_count.wrapping_add(1);
        self.animator.on_trigger(now_ms, self.config.led_brightness);
        io.play_event_sound();
        self.thermostat.force_activate(now_ms);
        info!("Drop #{} ({:?})", self.drop_count, source);
        sink.emit(&AppEvent::DropDetected {
            count: self.drop_count,
            source,
        });
    }

    fn service_network(
        &mut self,
        now_ms: u64,
        net: &mut impl WeatherPort,
        sink: &mut impl EventSink,
    ) {
        if net.is_connected() {
            if self.weather_timer.poll(now_ms) && !net.request_refresh() {
                debug!("Weather refresh already pending");
            }
        } else if self.wifi_timer.poll(now_ms) {
            match net.connect() {
                Ok(()) => {
                    info!("WiFi connected");
                    self.weather_timer.trigger();
                }
                Err(e) => warn!(
                    "WiFi connect failed ({e}), retry in {} ms",
                    self.wifi_timer.interval_ms()
                ),
            }
        }
        self.collect_weather(net, sink);
    }

    /// Apply whatever station fetches have finished.  A linked station's
    /// temperature becomes the setpoint.
    fn collect_weather(&mut self, net: &mut impl WeatherPort, sink: &mut impl EventSink) {
        let mut updated = false;
        while let Some(StationReading { index, result }) = net.poll_reading() {
            let Some(station) = STATIONS.get(index) else {
                continue;
            };
            match result {
                Ok(reading) => {
                    self.weather[index] = reading;
                    updated = true;
                    debug!("Weather {}: {:.1} °C", station.name, reading.temp_c);
                    sink.emit(&AppEvent::WeatherUpdated {
                        station: station.name,
                        temp_c: reading.temp_c,
                    });
                }
                Err(e) => warn!("Weather fetch for {} failed: {e}", station.name),
            }
        }
        if updated {
            self.apply_setpoint();
        }
    }

    fn apply_setpoint(&mut self) {
        let setpoint = match self.setpoint_mode {
            SetpointMode::Manual => self.config.manual_setpoint_c,
            SetpointMode::Station(i) => self.weather[i].temp_c,
        };
        if (self.thermostat.setpoint() - setpoint).abs() > f32::EPSILON {
            info!("Setpoint -> {:.1} °C ({:?})", setpoint, self.setpoint_mode);
        }
        self.thermostat.set_setpoint(setpoint);
    }

    fn refresh_health(&mut self, io: &impl ControlIo, net: &impl WeatherPort) {
        self.health.temp_sensor = io.probe_healthy();
        self.health.audio_player = io.audio_healthy();
        self.health.neo_pixel = self.animator.light().light_healthy();
        self.health.wifi = net.is_connected();
    }

    fn emit_transition(&self, prev: StateId, sink: &mut impl EventSink) {
        let now = self.thermostat.state();
        if now != prev {
            sink.emit(&AppEvent::StateChanged { from: prev, to: now });
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (from the web API task).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        io: &mut impl ControlIo,
        net: &mut impl WeatherPort,
        sink: &mut impl EventSink,
    ) -> CommandReply {
        let prev_state = self.thermostat.state();
        let reply = match cmd {
            AppCommand::TriggerDrop => {
                self.drop_reaction(now_ms, DropSource::Api, io, sink);
                CommandReply {
                    drop_count: Some(self.drop_count),
                    ..CommandReply::ok("Drop triggered!")
                }
            }
            AppCommand::ToggleCooling => {
                if self.thermostat.is_cooling() {
                    self.thermostat.turn_off(now_ms);
                    CommandReply::ok("Peltier turned OFF (will restart based on thermostat logic)")
                } else {
                    self.thermostat.force_activate(now_ms);
                    CommandReply::ok("Peltier forced ON")
                }
            }
            AppCommand::ForceCooling => {
                self.thermostat.force_activate(now_ms);
                CommandReply::ok("Peltier forced ON")
            }
            AppCommand::TogglePause => self.toggle_pause(sink),
            AppCommand::UpdateSettings(update) => self.apply_update(update, now_ms, net, sink),
            AppCommand::ResetSettings => {
                self.replace_config(SystemConfig::default(), now_ms);
                self.setpoint_mode = SetpointMode::Manual;
                self.apply_setpoint();
                self.restart_requested = true;
                sink.emit(&AppEvent::SettingsChanged);
                warn!("Settings reset to defaults, restart requested");
                CommandReply::ok("Settings reset to defaults. Device will restart in 3 seconds...")
            }
            AppCommand::TestLight => {
                self.animator.test_light(now_ms);
                CommandReply::ok("LED test running (5 seconds)")
            }
            AppCommand::TestAudio => {
                io.play_event_sound();
                CommandReply::ok("Audio playing")
            }
        };
        self.emit_transition(prev_state, sink);
        reply
    }

    fn toggle_pause(&mut self, sink: &mut impl EventSink) -> CommandReply {
        self.running = !self.running;
        let message = if self.running {
            // Edges latched while paused are stale.
            self.detector.reset();
            sink.emit(&AppEvent::Resumed);
            "System RESUMED"
        } else {
            sink.emit(&AppEvent::Paused);
            "System PAUSED"
        };
        info!("{message}");
        CommandReply {
            running: Some(self.running),
            ..CommandReply::ok(message)
        }
    }

    /// Validate the whole update first; nothing is applied if any field is
    /// out of range.
    fn apply_update(
        &mut self,
        update: SettingsUpdate,
        now_ms: u64,
        net: &mut impl WeatherPort,
        sink: &mut impl EventSink,
    ) -> CommandReply {
        let mut next = self.config.clone();
        if let Some(v) = update.manual_setpoint_c {
            next.manual_setpoint_c = v;
        }
        if let Some(v) = update.reactivate_temp_c {
            next.reactivate_temp_c = v;
        }
        if let Some(v) = update.hold_duration_ms {
            next.hold_duration_ms = v;
        }
        if let Some(v) = update.max_idle_ms {
            next.max_idle_ms = v;
        }
        if let Some(v) = update.fade_duration_ms {
            next.fade_duration_ms = v;
        }
        if let Some(v) = update.led_brightness {
            next.led_brightness = v;
        }
        if let Some(v) = update.ambient_enabled {
            next.ambient_enabled = v;
        }
        if let Some(v) = update.ambient_brightness {
            next.ambient_brightness = v;
        }
        if let Err(e) = validate_config(&next) {
            warn!("Settings update rejected: {e}");
            return CommandReply::error(match e {
                ConfigError::ValidationFailed(msg) => msg,
                _ => "Invalid settings",
            });
        }

        if update.touches_config() && next != self.config {
            self.replace_config(next, now_ms);
            sink.emit(&AppEvent::SettingsChanged);
            info!("Settings updated");
        }

        let reply = match update.setpoint_mode {
            None => CommandReply::ok("Settings updated"),
            Some(SetpointMode::Manual) => {
                self.setpoint_mode = SetpointMode::Manual;
                CommandReply::ok("Switched to manual mode")
            }
            Some(SetpointMode::Station(i)) => self.link_station(i, now_ms, net, sink),
        };
        self.apply_setpoint();
        reply
    }

    fn link_station(
        &mut self,
        index: usize,
        now_ms: u64,
        net: &mut impl WeatherPort,
        sink: &mut impl EventSink,
    ) -> CommandReply {
        let was_connected = net.is_connected();
        if !was_connected {
            if let Err(e) = net.connect() {
                self.wifi_timer.reset(now_ms);
                self.setpoint_mode = SetpointMode::Manual;
                warn!("Station link failed: {e}");
                return CommandReply::error("WiFi connection failed, staying in manual mode");
            }
        }
        self.setpoint_mode = SetpointMode::Station(index);
        // Until the fresh reading lands the station's last known value applies.
        if !net.request_refresh() {
            debug!("Weather refresh already pending");
        }
        self.weather_timer.reset(now_ms);
        self.collect_weather(net, sink);
        info!("Linked to {}", STATIONS[index].name);
        if was_connected {
            CommandReply::ok("Linked to station")
        } else {
            CommandReply::ok("Connected to WiFi and linked to station")
        }
    }

    /// Swap in a new config and push every value the components cache.
    fn replace_config(&mut self, config: SystemConfig, now_ms: u64) {
        self.thermostat.set_reactivate_temp(config.reactivate_temp_c);
        self.thermostat.set_hold_ms(u64::from(config.hold_duration_ms));
        self.thermostat.set_max_idle_ms(u64::from(config.max_idle_ms));
        self.detector.set_debounce_ms(config.drop_debounce_ms);
        self.animator.set_fade_duration_ms(config.fade_duration_ms);
        self.temp_timer.set_interval_ms(u64::from(config.temp_read_interval_ms));
        self.display_timer.set_interval_ms(u64::from(config.display_interval_ms));
        self.wifi_timer.set_interval_ms(u64::from(config.wifi_retry_interval_ms));
        self.weather_timer.set_interval_ms(u64::from(config.weather_update_interval_ms));
        self.config = config;
        self.mark_config_dirty(now_ms);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            thermostat: ThermostatStatus {
                cooling: self.thermostat.is_cooling(),
                holding: self.thermostat.is_holding(),
                setpoint: self.thermostat.setpoint(),
                reactivate_temp: self.thermostat.reactivate_temp(),
            },
            peltier_temp: self.cached_temp_c,
            drop_count: self.drop_count,
            running: self.running,
            setpoint_mode: self.setpoint_mode.selector(),
            manual_setpoint: self.config.manual_setpoint_c,
            hardware: self.health,
            weather: StatusSnapshot::weather_rows(&self.weather),
            settings: SettingsView::from_config(&self.config),
        }
    }

    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            state: self.thermostat.state(),
            temperature_c: self.cached_temp_c,
            setpoint_c: self.thermostat.setpoint(),
            reactivate_c: self.thermostat.reactivate_temp(),
            drop_count: self.drop_count,
            running: self.running,
        }
    }

    pub fn state(&self) -> StateId {
        self.thermostat.state()
    }

    pub fn drop_count(&self) -> u32 {
        self.drop_count
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn setpoint_mode(&self) -> SetpointMode {
        self.setpoint_mode
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn thermostat(&self) -> &HysteresisThermostat<A> {
        &self.thermostat
    }

    pub fn animator(&self) -> &FadeAnimator<L> {
        &self.animator
    }

    /// Reported by `main` once the HTTP server is listening.
    pub fn set_web_server_up(&mut self, up: bool) {
        self.health.web_server = up;
    }

    /// Consume a pending restart request (factory reset).
    pub fn take_restart_request(&mut self) -> bool {
        core::mem::take(&mut self.restart_requested)
    }

    // ── Config dirty-flag management ──────────────────────────

    pub fn mark_config_dirty(&mut self, now_ms: u64) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_ms = now_ms;
        }
    }

    /// Persist once the change is [`AUTO_SAVE_DELAY_MS`] old.
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, now_ms: u64, storage: &impl ConfigPort) -> bool {
        if !self.config_dirty || now_ms.saturating_sub(self.dirty_since_ms) < AUTO_SAVE_DELAY_MS {
            return false;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Settings auto-saved");
                true
            }
            Err(e) => {
                // Retry after another delay rather than every tick.
                self.dirty_since_ms = now_ms;
                warn!("Settings auto-save failed: {e}");
                false
            }
        }
    }

    /// Save now if dirty (factory reset, restart).
    pub fn force_save_if_dirty(&mut self, storage: &impl ConfigPort) {
        if !self.config_dirty {
            return;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Settings force-saved");
            }
            Err(e) => warn!("Settings force-save failed: {e}"),
        }
    }

    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}
