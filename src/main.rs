//! Glacier Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single non-blocking control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter     LogEventSink    SettingsStore             │
//! │  (probe+audio+btn)   (EventSink)     (Config+NVS)              │
//! │  PeltierDriver       WeatherLink     EspHttpServer             │
//! │  NeoPixelStrip       (WiFi, queue)   (api::handlers)           │
//! │                      WeatherWorker ─ HTTPS fetch thread        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Thermostat FSM · DropDetector · FadeAnimator          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  api::channels (HTTP task ⇄ loop) · IntervalTimer scheduling   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::rmt::{TxRmtDriver, config::TransmitConfig};
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::http::Method as HttpMethod;
use esp_idf_svc::http::server::{Configuration as HttpServerConfig, EspHttpServer};
use esp_idf_svc::io::{Read, Write};
use esp_idf_svc::wifi::EspWifi;

use glacier::adapters::display::TextPanel;
use glacier::adapters::hardware::HardwareAdapter;
use glacier::adapters::log_sink::LogEventSink;
use glacier::adapters::nvs::SettingsStore;
use glacier::adapters::time::MonotonicClock;
use glacier::adapters::weather_client::{
    WEATHER_CHANNELS, WeatherClient, WeatherLink, WeatherWorker,
};
use glacier::adapters::wifi::WifiAdapter;
use glacier::api::channels;
use glacier::api::handlers::{self, Method, ROUTES};
use glacier::app::ports::ConfigPort;
use glacier::app::service::AppService;
use glacier::config::SystemConfig;
use glacier::drivers::audio::AudioPlayer;
use glacier::drivers::button::{BUTTON_PRESS, ButtonLatch};
use glacier::drivers::hw_init::{self, GpioEdgeWatch};
use glacier::drivers::neopixel::NeoPixelStrip;
use glacier::drivers::peltier::PeltierDriver;
use glacier::pins;
use glacier::sensors::drop_detector::{DROP_EDGE, DropDetector};
use glacier::sensors::temperature::TemperatureProbe;

/// Loop pass period; everything else is driven by `IntervalTimer`s.
const LOOP_PERIOD_MS: u32 = 10;
/// Delay between the reset reply and the restart.
const RESTART_DELAY_MS: u32 = 3_000;
/// Largest accepted form body.
const MAX_FORM: usize = 512;

fn start_http_server() -> Result<EspHttpServer<'static>> {
    let mut server = EspHttpServer::new(&HttpServerConfig::default())?;

    for (method, path) in ROUTES {
        let esp_method = match method {
            Method::Get => HttpMethod::Get,
            Method::Post => HttpMethod::Post,
        };
        server.fn_handler(path, esp_method, move |mut req| -> Result<()> {
            let mut buf = [0u8; MAX_FORM];
            let mut len = 0;
            while len < buf.len() {
                let n = req.read(&mut buf[len..])?;
                if n == 0 {
                    break;
                }
                len += n;
            }
            let body = core::str::from_utf8(&buf[..len]).unwrap_or("");

            let resp = handlers::handle_request(method, path, body, FreeRtos::delay_ms);
            let headers = [("Content-Type", "application/json; charset=utf-8")];
            req.into_response(resp.status, None, &headers)?
                .write_all(resp.body.as_bytes())?;
            Ok(())
        })?;
    }

    info!("HTTP: {} routes registered", ROUTES.len());
    Ok(server)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Glacier v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 1b. Peripherals ───────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    if let Err(e) = hw_init::init_isr_service() {
        error!("ISR service init failed: {}, drop sensor and button inert", e);
    }

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ── 1c. Settings (first boot persists defaults) ───────────
    let store = match SettingsStore::new() {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            None
        }
    };
    let config = match store.as_ref().map(|s| s.load()) {
        Some(Ok(cfg)) => cfg,
        Some(Err(e)) => {
            warn!("Settings load failed ({}), using defaults", e);
            SystemConfig::default()
        }
        None => SystemConfig::default(),
    };

    // ── 2. Outputs and inputs ─────────────────────────────────
    let peltier = PeltierDriver::new(PinDriver::output(peripherals.pins.gpio7)?);

    let rmt = TxRmtDriver::new(
        peripherals.rmt.channel0,
        peripherals.pins.gpio8,
        &TransmitConfig::new().clock_divider(1),
    )
    .map_err(|e| warn!("NeoPixel RMT init failed: {e}"))
    .ok();
    let strip = NeoPixelStrip::new(rmt);

    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio1,
        peripherals.pins.gpio2,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(pins::AUDIO_BAUD_RATE)),
    )
    .map_err(|e| warn!("Audio UART init failed: {e}"))
    .ok();
    let audio = AudioPlayer::new(uart, config.audio_volume, config.drop_sound_track);

    let mut hw = HardwareAdapter::new(
        TemperatureProbe::new(pins::TEMP_ONEWIRE_GPIO),
        audio,
        ButtonLatch::new(pins::BUTTON_GPIO, &BUTTON_PRESS),
        TextPanel::new(),
    );

    let mut detector =
        DropDetector::new(&DROP_EDGE, config.drop_trigger_edge, config.drop_debounce_ms);
    let mut drop_watch = GpioEdgeWatch::new(pins::DROP_SENSOR_GPIO);
    detector.set_trigger_edge(config.drop_trigger_edge, &mut drop_watch);

    // ── 2b. WiFi + weather ────────────────────────────────────
    let mut wifi = WifiAdapter::new(EspWifi::new(peripherals.modem, sysloop, None)?);
    match (option_env!("GLACIER_WIFI_SSID"), option_env!("GLACIER_WIFI_PASS")) {
        (Some(ssid), pass) => {
            if let Err(e) = wifi.set_credentials(ssid, pass.unwrap_or("")) {
                warn!("WiFi credentials rejected: {}", e);
            }
        }
        (None, _) => warn!("No WiFi credentials compiled in; weather stays at defaults"),
    }
    let mut weather = WeatherLink::new(wifi, &WEATHER_CHANNELS);
    if let Err(e) = WeatherWorker::new(WeatherClient::new(), &WEATHER_CHANNELS).spawn() {
        error!("Weather worker failed to start ({e}); stations stay at defaults");
    }

    // ── 3. App service: cooling starts immediately ────────────
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(config, peltier, strip, detector);
    app.start(clock.now_ms(), &mut sink);

    // ── 3b. HTTP server ───────────────────────────────────────
    let _server = match start_http_server() {
        Ok(s) => {
            app.set_web_server_up(true);
            Some(s)
        }
        Err(e) => {
            error!("HTTP server failed to start: {e}");
            None
        }
    };

    info!("System ready. Entering control loop.");

    // ── 4. Control loop ───────────────────────────────────────
    loop {
        let now = clock.now_ms();

        channels::drain_commands(|cmd| {
            app.handle_command(cmd, now, &mut hw, &mut weather, &mut sink)
        });
        app.tick(now, &mut hw, &mut weather, &mut sink);
        channels::publish_status(app.status());

        if let Some(store) = store.as_ref() {
            app.auto_save_if_needed(now, store);
        }

        if app.take_restart_request() {
            if let Some(store) = store.as_ref() {
                app.force_save_if_dirty(store);
            }
            info!("Restarting in {} ms", RESTART_DELAY_MS);
            FreeRtos::delay_ms(RESTART_DELAY_MS);
            esp_idf_hal::reset::restart();
        }

        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}
