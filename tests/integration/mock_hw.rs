//! Mock collaborators for integration tests.
//!
//! Every fake records what the control loop did to it so tests can assert
//! on the full command history without touching real GPIO, RMT or UART.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use glacier::app::events::AppEvent;
use glacier::app::ports::{
    ActuatorSink, AudioSink, ConfigError, ConfigPort, EventSink, LightSink, ManualTrigger,
    StatusDisplay, TemperatureSource, WeatherPort,
};
use glacier::app::service::AppService;
use glacier::app::status::StatusSnapshot;
use glacier::config::SystemConfig;
use glacier::error::CommsError;
use glacier::sensors::drop_detector::{DropDetector, EdgeFlag};
use glacier::weather::{STATIONS, StationReading, WeatherReading};

// ── Actuator ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockActuator {
    pub writes: Vec<bool>,
}

#[allow(dead_code)]
impl MockActuator {
    pub fn is_on(&self) -> bool {
        self.writes.last().copied().unwrap_or(false)
    }
}

impl ActuatorSink for MockActuator {
    fn set_state(&mut self, on: bool) {
        self.writes.push(on);
    }
}

// ── Light strip ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockLight {
    pub colours: Vec<(u8, u8, u8)>,
    pub commits: u32,
}

#[allow(dead_code)]
impl MockLight {
    pub fn last(&self) -> Option<(u8, u8, u8)> {
        self.colours.last().copied()
    }
}

impl LightSink for MockLight {
    fn set_uniform_color(&mut self, r: u8, g: u8, b: u8) {
        self.colours.push((r, g, b));
    }

    fn commit(&mut self) {
        self.commits += 1;
    }
}

// ── Probe, audio, button, display ─────────────────────────────

pub struct MockIo {
    /// Value the probe returns on the next read.
    pub temp_c: f32,
    pub reads: u32,
    pub probe_ok: bool,
    pub sounds: u32,
    pub audio_ok: bool,
    pub press_pending: bool,
    pub renders: u32,
    pub last_render: Option<StatusSnapshot>,
}

impl MockIo {
    pub fn new(temp_c: f32) -> Self {
        Self {
            temp_c,
            reads: 0,
            probe_ok: true,
            sounds: 0,
            audio_ok: true,
            press_pending: false,
            renders: 0,
            last_render: None,
        }
    }
}

impl TemperatureSource for MockIo {
    fn request_reading(&mut self) -> f32 {
        self.reads += 1;
        self.temp_c
    }

    fn probe_healthy(&self) -> bool {
        self.probe_ok
    }
}

impl AudioSink for MockIo {
    fn play_event_sound(&mut self) {
        self.sounds += 1;
    }

    fn audio_healthy(&self) -> bool {
        self.audio_ok
    }
}

impl ManualTrigger for MockIo {
    fn update_inputs(&mut self, _now_ms: u64) {}

    fn was_pressed(&mut self) -> bool {
        core::mem::take(&mut self.press_pending)
    }
}

impl StatusDisplay for MockIo {
    fn render(&mut self, status: &StatusSnapshot) {
        self.renders += 1;
        self.last_render = Some(*status);
    }
}

// ── Network ───────────────────────────────────────────────────

pub struct MockNet {
    pub connected: bool,
    pub can_connect: bool,
    pub connect_attempts: u32,
    pub refreshes: u32,
    pub fetches: u32,
    /// Per-station temperature served; `None` fails the fetch.
    pub temps: [Option<f32>; STATIONS.len()],
    /// Hold finished fetches back until [`MockNet::complete`] runs.
    pub deferred: bool,
    in_flight: Vec<StationReading>,
    ready: VecDeque<StationReading>,
}

#[allow(dead_code)]
impl MockNet {
    pub fn offline() -> Self {
        Self {
            connected: false,
            can_connect: false,
            connect_attempts: 0,
            refreshes: 0,
            fetches: 0,
            temps: [None; STATIONS.len()],
            deferred: false,
            in_flight: Vec::new(),
            ready: VecDeque::new(),
        }
    }

    pub fn online(temps: [f32; STATIONS.len()]) -> Self {
        Self {
            connected: true,
            can_connect: true,
            temps: temps.map(Some),
            ..Self::offline()
        }
    }

    /// Release every fetch held back by `deferred`.
    pub fn complete(&mut self) {
        self.ready.extend(self.in_flight.drain(..));
    }

    pub fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }
}

impl WeatherPort for MockNet {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> Result<(), CommsError> {
        self.connect_attempts += 1;
        if self.can_connect {
            self.connected = true;
            Ok(())
        } else {
            Err(CommsError::WifiConnectFailed)
        }
    }

    fn request_refresh(&mut self) -> bool {
        if !self.connected || self.is_busy() {
            return false;
        }
        self.refreshes += 1;
        for (index, temp) in self.temps.iter().enumerate() {
            self.fetches += 1;
            let result = match *temp {
                Some(temp_c) => Ok(WeatherReading {
                    temp_c,
                    humidity: 50.0,
                    dew_point_c: temp_c - 5.0,
                }),
                None => Err(CommsError::HttpStatus(503)),
            };
            let reading = StationReading { index, result };
            if self.deferred {
                self.in_flight.push(reading);
            } else {
                self.ready.push_back(reading);
            }
        }
        true
    }

    fn poll_reading(&mut self) -> Option<StationReading> {
        self.ready.pop_front()
    }
}

// ── Settings store ────────────────────────────────────────────

#[derive(Default)]
pub struct MockStore {
    pub saved: RefCell<Option<SystemConfig>>,
    pub saves: Cell<u32>,
    pub fail: Cell<bool>,
}

impl ConfigPort for MockStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        Ok(self.saved.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        if self.fail.get() {
            return Err(ConfigError::IoError);
        }
        self.saves.set(self.saves.get() + 1);
        *self.saved.borrow_mut() = Some(config.clone());
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

pub type TestApp<'a> = AppService<'a, MockActuator, MockLight>;

/// Config with the fastest valid probe interval so every 500 ms tick reads.
#[allow(dead_code)]
pub fn fast_config() -> SystemConfig {
    SystemConfig {
        temp_read_interval_ms: 500,
        ..SystemConfig::default()
    }
}

pub fn make_app(flag: &EdgeFlag, config: SystemConfig) -> TestApp<'_> {
    let detector = DropDetector::new(flag, config.drop_trigger_edge, config.drop_debounce_ms);
    AppService::new(config, MockActuator::default(), MockLight::default(), detector)
}

#[allow(dead_code)]
pub fn actuator_on(app: &TestApp<'_>) -> bool {
    app.thermostat().actuator().is_on()
}
