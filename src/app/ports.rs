//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (probe, actuator, light strip, audio, display, network,
//! storage) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! Every collaborator reports its own health flag; the core keeps running
//! regardless and simply treats writes to a dead sink as inert.

use crate::config::SystemConfig;
use crate::error::CommsError;
use crate::weather::StationReading;

use super::status::StatusSnapshot;

// ───────────────────────────────────────────────────────────────
// Temperature source (driven adapter: probe → domain)
// ───────────────────────────────────────────────────────────────

pub trait TemperatureSource {
    /// Latest reading in °C.  On a fault the adapter returns its last good
    /// value or a sentinel; the core treats a sentinel as "no new data".
    fn request_reading(&mut self) -> f32;

    /// Whether the most recent read succeeded.
    fn probe_healthy(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Actuator sink (driven adapter: domain → Peltier)
// ───────────────────────────────────────────────────────────────

/// Binary cooling actuator.  Assumed to take effect before the next read.
pub trait ActuatorSink {
    fn set_state(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Light sink (driven adapter: domain → NeoPixel strip)
// ───────────────────────────────────────────────────────────────

/// The animator computes colours; the sink only displays them.
pub trait LightSink {
    fn set_uniform_color(&mut self, r: u8, g: u8, b: u8);
    fn commit(&mut self);

    fn light_healthy(&self) -> bool {
        true
    }
}

// ───────────────────────────────────────────────────────────────
// Audio (driven adapter: domain → player)
// ───────────────────────────────────────────────────────────────

pub trait AudioSink {
    /// Fire-and-forget.
    fn play_event_sound(&mut self);

    fn audio_healthy(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Manual trigger (driving adapter: button → domain)
// ───────────────────────────────────────────────────────────────

pub trait ManualTrigger {
    /// Sample the input layer once per tick.
    fn update_inputs(&mut self, now_ms: u64);

    /// Consume a pending press.
    fn was_pressed(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Status display (driven adapter: domain → screen)
// ───────────────────────────────────────────────────────────────

pub trait StatusDisplay {
    fn render(&mut self, status: &StatusSnapshot);
}

/// Per-tick collaborators the control loop talks to.  Blanket-implemented
/// so one hardware adapter (or one mock) can satisfy all of them without
/// a double mutable borrow.
pub trait ControlIo: TemperatureSource + AudioSink + ManualTrigger + StatusDisplay {}

impl<T: TemperatureSource + AudioSink + ManualTrigger + StatusDisplay> ControlIo for T {}

// ───────────────────────────────────────────────────────────────
// Weather / connectivity (driven adapter: domain ↔ network)
// ───────────────────────────────────────────────────────────────

/// Network access for the weather link.
///
/// `connect` is one bounded attempt.  Station fetches run off the control
/// loop: `request_refresh` queues a fetch of every station and the loop
/// collects finished results with `poll_reading` on later ticks.
pub trait WeatherPort {
    fn is_connected(&self) -> bool;

    fn connect(&mut self) -> Result<(), CommsError>;

    /// Queue a refresh of every station.  `false` if one is already pending.
    fn request_refresh(&mut self) -> bool;

    /// Next finished station fetch, if any.  Never blocks.
    fn poll_reading(&mut self) -> Option<StationReading>;
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// First boot stores and returns [`SystemConfig::default()`].
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.  Keys are namespaced to prevent
/// collisions between subsystems.  Writes MUST be atomic.  Methods take
/// `&self`; backends synchronise internally.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Caller's buffer is smaller than the stored value.
    BufferTooSmall,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Full => Self::StorageFull,
            StorageError::NotFound | StorageError::BufferTooSmall => Self::Corrupted,
            StorageError::IoError => Self::IoError,
        }
    }
}
