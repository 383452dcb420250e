//! Weather stations the setpoint can be linked to.
//!
//! The installation mirrors the live temperature of a glacier town (or a
//! city, for contrast) on the cold plate.  In [`SetpointMode::Station`] the
//! station's latest reading replaces the manual setpoint on every refresh.

use serde::{Deserialize, Serialize};

use crate::error::CommsError;

/// A fixed weather station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherStation {
    pub name: &'static str,
    pub latitude: f32,
    pub longitude: f32,
    /// IANA zone passed to the forecast API.
    pub timezone: &'static str,
    /// Shown until the first successful fetch.
    pub default_temp_c: f32,
    pub default_humidity: f32,
}

pub const STATIONS: [WeatherStation; 4] = [
    WeatherStation {
        name: "Ilulissat",
        latitude: 69.2198,
        longitude: -51.0986,
        timezone: "America/Godthab",
        default_temp_c: -2.0,
        default_humidity: 50.0,
    },
    WeatherStation {
        name: "El Calafate",
        latitude: -50.3375,
        longitude: -72.2647,
        timezone: "America/Argentina/Rio_Gallegos",
        default_temp_c: -2.0,
        default_humidity: 50.0,
    },
    WeatherStation {
        name: "Hong Kong",
        latitude: 22.3193,
        longitude: 114.1694,
        timezone: "Asia/Hong_Kong",
        default_temp_c: 26.0,
        default_humidity: 75.0,
    },
    WeatherStation {
        name: "Shenzhen",
        latitude: 22.5431,
        longitude: 114.0579,
        timezone: "Asia/Shanghai",
        default_temp_c: 14.0,
        default_humidity: 75.0,
    },
];

/// Current conditions at a station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temp_c: f32,
    pub humidity: f32,
    pub dew_point_c: f32,
}

impl WeatherReading {
    pub fn default_for(station: &WeatherStation) -> Self {
        Self {
            temp_c: station.default_temp_c,
            humidity: station.default_humidity,
            dew_point_c: 0.0,
        }
    }
}

/// Outcome of one background station fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationReading {
    /// Index into [`STATIONS`].
    pub index: usize,
    pub result: Result<WeatherReading, CommsError>,
}

/// Where the thermostat setpoint comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SetpointMode {
    #[default]
    Manual,
    /// Index into [`STATIONS`].
    Station(usize),
}

impl SetpointMode {
    /// Decode the wire selector: `-1` is manual, `0..` a station index.
    /// Anything else is rejected.
    pub fn from_selector(selector: i32) -> Option<Self> {
        match selector {
            -1 => Some(Self::Manual),
            i if i >= 0 && (i as usize) < STATIONS.len() => Some(Self::Station(i as usize)),
            _ => None,
        }
    }

    /// Inverse of [`from_selector`](Self::from_selector).
    #[allow(clippy::cast_possible_wrap)]
    pub fn selector(self) -> i32 {
        match self {
            Self::Manual => -1,
            Self::Station(i) => i as i32,
        }
    }
}
