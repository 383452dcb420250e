//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements         | Connects to              |
//! |------------------|--------------------|--------------------------|
//! | `display`        | -                  | Status text panel        |
//! | `hardware`       | TemperatureSource  | DS18B20 one-wire probe   |
//! |                  | AudioSink          | DFPlayer Mini UART       |
//! |                  | ManualTrigger      | Push button GPIO         |
//! |                  | StatusDisplay      | `display::TextPanel`     |
//! | `log_sink`       | EventSink          | Serial log output        |
//! | `nvs`            | ConfigPort         | NVS / in-memory store    |
//! |                  | StoragePort        |                          |
//! | `time`           | -                  | ESP32 system timer       |
//! | `weather_client` | WeatherPort        | Open-Meteo over HTTPS    |
//! | `wifi`           | -                  | ESP-IDF WiFi STA         |

pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod weather_client;
pub mod wifi;
