//! Open-Meteo weather client.
//!
//! One HTTPS GET per station, decoding only the `current` block of the
//! forecast response.
//!
//! ```text
//! GET https://api.open-meteo.com/v1/forecast?latitude=69.2198&longitude=-51.0986
//!     &current=temperature_2m,relative_humidity_2m,dew_point_2m&timezone=America/Godthab
//!
//! { "current": { "temperature_2m": -4.1, "relative_humidity_2m": 81,
//!               "dew_point_2m": -6.6, .. }, .. }
//! ```
//!
//! A fetch can take seconds, so it never runs on the control loop.  The
//! loop holds a [`WeatherLink`] (the [`WeatherPort`]), the worker thread
//! holds a [`WeatherWorker`], and the two meet in [`WeatherChannels`]:
//!
//! ```text
//! ┌──────────────┐  refresh   ┌────────────────┐  HTTPS  ┌────────────┐
//! │ Control Loop │───────────▶│ Weather Worker │────────▶│ Open-Meteo │
//! │ (WeatherLink)│◀───────────│  (own thread)  │         └────────────┘
//! └──────────────┘  readings  └────────────────┘
//! ```

use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};
use serde::Deserialize;

use crate::adapters::wifi::WifiAdapter;
use crate::app::ports::WeatherPort;
use crate::error::CommsError;
use crate::weather::{STATIONS, StationReading, WeatherReading, WeatherStation};

#[cfg(target_os = "espidf")]
use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};

const API_BASE: &str = "https://api.open-meteo.com/v1/forecast";
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,dew_point_2m";

/// Largest response body accepted.
pub const MAX_BODY: usize = 4_096;

/// Room for two full refreshes the loop has not collected yet.
const READING_DEPTH: usize = STATIONS.len() * 2;

/// Worker sleep between checks for a refresh request.
const WORKER_IDLE_MS: u64 = 200;

const WORKER_STACK_BYTES: usize = 8 * 1024;

/// Request URL for one station; coordinates carry four decimals.
pub fn build_url(station: &WeatherStation) -> String {
    format!(
        "{API_BASE}?latitude={:.4}&longitude={:.4}&current={CURRENT_FIELDS}&timezone={}",
        station.latitude, station.longitude, station.timezone
    )
}

#[derive(Deserialize)]
struct ForecastBody {
    current: CurrentBlock,
}

#[derive(Deserialize)]
struct CurrentBlock {
    temperature_2m: f32,
    relative_humidity_2m: f32,
    dew_point_2m: f32,
}

/// Decode the `current` block.  Unknown fields are ignored.
pub fn parse_current(body: &[u8]) -> Result<WeatherReading, CommsError> {
    let parsed: ForecastBody = serde_json::from_slice(body).map_err(|_| CommsError::BadPayload)?;
    Ok(WeatherReading {
        temp_c: parsed.current.temperature_2m,
        humidity: parsed.current.relative_humidity_2m,
        dew_point_c: parsed.current.dew_point_2m,
    })
}

// ───────────────────────────────────────────────────────────────
// HTTP client
// ───────────────────────────────────────────────────────────────

pub struct WeatherClient {
    /// Simulation: canned response body served instead of HTTP.
    #[cfg(not(target_os = "espidf"))]
    sim_body: Option<Vec<u8>>,
}

impl WeatherClient {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim_body: None,
        }
    }

    /// Blocking fetch of one station.  Only the worker calls this.
    pub fn fetch_current(
        &mut self,
        station: &WeatherStation,
    ) -> Result<WeatherReading, CommsError> {
        let url = build_url(station);
        let body = self.http_get(&url)?;
        let reading = parse_current(&body)?;
        info!(
            "Weather: {} {:.1}\u{00b0}C {:.0}% (dew {:.1})",
            station.name, reading.temp_c, reading.humidity, reading.dew_point_c
        );
        Ok(reading)
    }

    #[cfg(target_os = "espidf")]
    fn http_get(&mut self, url: &str) -> Result<Vec<u8>, CommsError> {
        use esp_idf_svc::http::client::Client as HttpClient;
        use esp_idf_svc::io::Read;

        let conf = HttpClientConfiguration {
            timeout: Some(Duration::from_secs(5)),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let conn = EspHttpConnection::new(&conf).map_err(|_| CommsError::HttpRequestFailed)?;
        let mut client = HttpClient::wrap(conn);
        let request = client.get(url).map_err(|_| CommsError::HttpRequestFailed)?;
        let mut response = request.submit().map_err(|_| CommsError::HttpRequestFailed)?;

        let status = response.status();
        if status != 200 {
            return Err(CommsError::HttpStatus(status));
        }

        let mut body = Vec::new();
        let mut chunk = [0u8; 512];
        loop {
            let n = response.read(&mut chunk).map_err(|_| CommsError::HttpRequestFailed)?;
            if n == 0 {
                break;
            }
            if body.len() + n > MAX_BODY {
                return Err(CommsError::BadPayload);
            }
            body.extend_from_slice(&chunk[..n]);
        }
        Ok(body)
    }

    #[cfg(not(target_os = "espidf"))]
    fn http_get(&mut self, url: &str) -> Result<Vec<u8>, CommsError> {
        log::debug!("Weather(sim): GET {url}");
        self.sim_body.clone().ok_or(CommsError::HttpStatus(503))
    }

    /// Simulation: body returned by every subsequent fetch (`None` = 503).
    #[cfg(not(target_os = "espidf"))]
    pub fn set_sim_body(&mut self, body: Option<&str>) {
        self.sim_body = body.map(|b| b.as_bytes().to_vec());
    }
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Loop ↔ worker channels
// ───────────────────────────────────────────────────────────────

/// Refresh requests in, per-station results out.
pub struct WeatherChannels {
    requests: Channel<CriticalSectionRawMutex, (), 1>,
    readings: Channel<CriticalSectionRawMutex, StationReading, READING_DEPTH>,
}

impl WeatherChannels {
    pub const fn new() -> Self {
        Self {
            requests: Channel::new(),
            readings: Channel::new(),
        }
    }
}

impl Default for WeatherChannels {
    fn default() -> Self {
        Self::new()
    }
}

/// The channel pair used by the firmware.
pub static WEATHER_CHANNELS: WeatherChannels = WeatherChannels::new();

// ───────────────────────────────────────────────────────────────
// Worker
// ───────────────────────────────────────────────────────────────

/// Owns the HTTP client and runs fetches off the control loop.
pub struct WeatherWorker<'c> {
    client: WeatherClient,
    channels: &'c WeatherChannels,
}

impl<'c> WeatherWorker<'c> {
    pub fn new(client: WeatherClient, channels: &'c WeatherChannels) -> Self {
        Self { client, channels }
    }

    /// Serve one pending refresh: fetch every station and post each result.
    /// Returns `false` when nothing was requested.
    pub fn serve_pending(&mut self) -> bool {
        if self.channels.requests.try_receive().is_err() {
            return false;
        }
        for (index, station) in STATIONS.iter().enumerate() {
            let result = self.client.fetch_current(station);
            if self.channels.readings.try_send(StationReading { index, result }).is_err() {
                warn!("Weather: result queue full, dropping {}", station.name);
            }
        }
        true
    }

    pub fn client_mut(&mut self) -> &mut WeatherClient {
        &mut self.client
    }
}

impl WeatherWorker<'static> {
    /// Run the worker on its own thread for the life of the firmware.
    pub fn spawn(mut self) -> std::io::Result<std::thread::JoinHandle<()>> {
        std::thread::Builder::new()
            .name("weather".into())
            .stack_size(WORKER_STACK_BYTES)
            .spawn(move || {
                info!("Weather worker started");
                loop {
                    if !self.serve_pending() {
                        std::thread::sleep(Duration::from_millis(WORKER_IDLE_MS));
                    }
                }
            })
    }
}

// ───────────────────────────────────────────────────────────────
// Loop-side port
// ───────────────────────────────────────────────────────────────

/// The control loop's [`WeatherPort`]: the WiFi link plus the request and
/// result ends of the worker channels.
pub struct WeatherLink<'c> {
    wifi: WifiAdapter,
    channels: &'c WeatherChannels,
}

impl<'c> WeatherLink<'c> {
    pub fn new(wifi: WifiAdapter, channels: &'c WeatherChannels) -> Self {
        Self { wifi, channels }
    }

    pub fn wifi_mut(&mut self) -> &mut WifiAdapter {
        &mut self.wifi
    }
}

impl WeatherPort for WeatherLink<'_> {
    fn is_connected(&self) -> bool {
        self.wifi.is_connected()
    }

    fn connect(&mut self) -> Result<(), CommsError> {
        self.wifi.connect().map_err(CommsError::from)
    }

    fn request_refresh(&mut self) -> bool {
        if !self.wifi.is_connected() {
            return false;
        }
        self.channels.requests.try_send(()).is_ok()
    }

    fn poll_reading(&mut self) -> Option<StationReading> {
        self.channels.readings.try_receive().ok()
    }
}
