//! NVS (Non-Volatile Storage) settings store.
//!
//! [`NvsStorage`] is the raw [`StoragePort`]; [`SettingsStore`] layers the
//! [`ConfigPort`] on top of any `StoragePort`.
//!
//! ## Layout
//!
//! Namespace `settings`, one scalar per key, each encoded with `postcard`:
//!
//! | key           | field                     | type |
//! |---------------|---------------------------|------|
//! | `setpoint`    | manual_setpoint_c         | f32  |
//! | `reactivateT` | reactivate_temp_c         | f32  |
//! | `freezeDur`   | hold_duration_ms          | u32  |
//! | `reactTimer`  | max_idle_ms               | u32  |
//! | `neoBright`   | led_brightness            | u8   |
//! | `fadeDur`     | fade_duration_ms          | u32  |
//! | `tempInt`     | temp_read_interval_ms     | u32  |
//! | `audioVol`    | audio_volume              | u8   |
//! | `dropTrack`   | drop_sound_track          | u8   |
//! | `weatherInt`  | weather_update_interval_ms| u32  |
//! | `cubeLight`   | ambient_enabled           | bool |
//! | `cubeBright`  | ambient_brightness        | u8   |
//! | `debounce`    | drop_debounce_ms          | u32  |
//! | `initialized` | first-boot marker         | bool |
//!
//! First boot (no `initialized`) persists the compiled-in defaults.  Later
//! boots load key by key; a missing or undecodable key falls back to its
//! default so one bad entry never loses the rest.  The assembled config is
//! validated: a broken setpoint/reactivate pair reverts to the default pair,
//! anything else still invalid reverts to the full defaults.
//!
//! - Config validation: every field is range-checked before persistence.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.

use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::{SystemConfig, validate_config};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub const SETTINGS_NAMESPACE: &str = "settings";

const KEY_INITIALIZED: &str = "initialized";
const KEY_SETPOINT: &str = "setpoint";
const KEY_REACTIVATE: &str = "reactivateT";
const KEY_HOLD: &str = "freezeDur";
const KEY_MAX_IDLE: &str = "reactTimer";
const KEY_LED_BRIGHTNESS: &str = "neoBright";
const KEY_FADE: &str = "fadeDur";
const KEY_TEMP_INTERVAL: &str = "tempInt";
const KEY_VOLUME: &str = "audioVol";
const KEY_TRACK: &str = "dropTrack";
const KEY_WEATHER_INTERVAL: &str = "weatherInt";
const KEY_AMBIENT: &str = "cubeLight";
const KEY_AMBIENT_BRIGHTNESS: &str = "cubeBright";
const KEY_DEBOUNCE: &str = "debounce";

/// Largest encoded scalar (u32 varint is 5 bytes).
const SCALAR_BUF: usize = 8;

/// Namespaced blob storage in the default NVS partition.
pub struct NvsStorage {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsStorage {
    /// Initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably. A full or version-mismatched partition is erased and
    /// re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsStorage: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsStorage: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    // ── Raw backend ───────────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    #[cfg(not(target_os = "espidf"))]
    fn raw_read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.borrow().get(&Self::composite_key(namespace, key)) {
            Some(data) if data.len() > buf.len() => Err(StorageError::BufferTooSmall),
            Some(data) => {
                buf[..data.len()].copy_from_slice(data);
                Ok(data.len())
            }
            None => Err(StorageError::NotFound),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn raw_write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store
            .borrow_mut()
            .insert(Self::composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn raw_delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.borrow_mut().remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn raw_exists(&self, namespace: &str, key: &str) -> bool {
        self.store.borrow().contains_key(&Self::composite_key(namespace, key))
    }

    /// NUL-terminated copy of a namespace or key (NVS limit: 15 chars).
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        // SAFETY: handle was opened above and is closed exactly once.
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn raw_read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let key = Self::c_name(key);
        let result = Self::with_nvs_handle(namespace, false, |handle| {
            let mut size = buf.len();
            // SAFETY: `buf` is valid for `size` bytes.
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });
        match result {
            Ok(size) => Ok(size),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(StorageError::BufferTooSmall),
            Err(_) => Err(StorageError::IoError),
        }
    }

    #[cfg(target_os = "espidf")]
    fn raw_write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let key = Self::c_name(key);
        let result = Self::with_nvs_handle(namespace, true, |handle| {
            // SAFETY: `data` is valid for `data.len()` bytes.
            let ret = unsafe {
                nvs_set_blob(handle, key.as_ptr().cast(), data.as_ptr().cast(), data.len())
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        match result {
            Ok(()) => Ok(()),
            Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE => Err(StorageError::Full),
            Err(_) => Err(StorageError::IoError),
        }
    }

    #[cfg(target_os = "espidf")]
    fn raw_delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let key = Self::c_name(key);
        let result = Self::with_nvs_handle(namespace, true, |handle| {
            let ret = unsafe { nvs_erase_key(handle, key.as_ptr().cast()) };
            if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|_| StorageError::IoError)
    }

    #[cfg(target_os = "espidf")]
    fn raw_exists(&self, namespace: &str, key: &str) -> bool {
        let key = Self::c_name(key);
        let result = Self::with_nvs_handle(namespace, false, |handle| {
            let ret = unsafe { nvs_find_key(handle, key.as_ptr().cast(), core::ptr::null_mut()) };
            Ok(ret == ESP_OK)
        });
        result.unwrap_or(false)
    }
}

impl StoragePort for NvsStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.raw_read(namespace, key, buf)
    }

    fn write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.raw_write(namespace, key, data)
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.raw_delete(namespace, key)
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.raw_exists(namespace, key)
    }
}

/// Persisted [`SystemConfig`], one key per setting.
pub struct SettingsStore<S = NvsStorage> {
    storage: S,
}

impl SettingsStore<NvsStorage> {
    /// Open the settings store on the device's NVS partition.
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self::with_storage(NvsStorage::new()?))
    }
}

impl<S: StoragePort> SettingsStore<S> {
    pub fn with_storage(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Overwrite every key with the compiled-in defaults.
    pub fn reset_to_defaults(&self) -> Result<SystemConfig, ConfigError> {
        let defaults = SystemConfig::default();
        self.write_all(&defaults)?;
        self.put(KEY_INITIALIZED, &true)?;
        info!("SettingsStore: reset to defaults");
        Ok(defaults)
    }

    fn write_all(&self, c: &SystemConfig) -> Result<(), ConfigError> {
        self.put(KEY_SETPOINT, &c.manual_setpoint_c)?;
        self.put(KEY_REACTIVATE, &c.reactivate_temp_c)?;
        self.put(KEY_HOLD, &c.hold_duration_ms)?;
        self.put(KEY_MAX_IDLE, &c.max_idle_ms)?;
        self.put(KEY_LED_BRIGHTNESS, &c.led_brightness)?;
        self.put(KEY_FADE, &c.fade_duration_ms)?;
        self.put(KEY_TEMP_INTERVAL, &c.temp_read_interval_ms)?;
        self.put(KEY_VOLUME, &c.audio_volume)?;
        self.put(KEY_TRACK, &c.drop_sound_track)?;
        self.put(KEY_WEATHER_INTERVAL, &c.weather_update_interval_ms)?;
        self.put(KEY_AMBIENT, &c.ambient_enabled)?;
        self.put(KEY_AMBIENT_BRIGHTNESS, &c.ambient_brightness)?;
        self.put(KEY_DEBOUNCE, &c.drop_debounce_ms)?;
        Ok(())
    }

    fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let mut buf = [0u8; SCALAR_BUF];
        let bytes = postcard::to_slice(value, &mut buf).map_err(|_| ConfigError::IoError)?;
        self.storage
            .write(SETTINGS_NAMESPACE, key, bytes)
            .map_err(ConfigError::from)
    }

    /// `None` for a missing or undecodable key.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut buf = [0u8; SCALAR_BUF];
        let n = self.storage.read(SETTINGS_NAMESPACE, key, &mut buf).ok()?;
        match postcard::from_bytes(&buf[..n]) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("SettingsStore: key '{}' corrupt, using default", key);
                None
            }
        }
    }

    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    fn read_all(&self) -> SystemConfig {
        let d = SystemConfig::default();
        SystemConfig {
            manual_setpoint_c: self.get_or(KEY_SETPOINT, d.manual_setpoint_c),
            reactivate_temp_c: self.get_or(KEY_REACTIVATE, d.reactivate_temp_c),
            hold_duration_ms: self.get_or(KEY_HOLD, d.hold_duration_ms),
            max_idle_ms: self.get_or(KEY_MAX_IDLE, d.max_idle_ms),
            led_brightness: self.get_or(KEY_LED_BRIGHTNESS, d.led_brightness),
            fade_duration_ms: self.get_or(KEY_FADE, d.fade_duration_ms),
            temp_read_interval_ms: self.get_or(KEY_TEMP_INTERVAL, d.temp_read_interval_ms),
            audio_volume: self.get_or(KEY_VOLUME, d.audio_volume),
            drop_sound_track: self.get_or(KEY_TRACK, d.drop_sound_track),
            weather_update_interval_ms: self
                .get_or(KEY_WEATHER_INTERVAL, d.weather_update_interval_ms),
            ambient_enabled: self.get_or(KEY_AMBIENT, d.ambient_enabled),
            ambient_brightness: self.get_or(KEY_AMBIENT_BRIGHTNESS, d.ambient_brightness),
            drop_debounce_ms: self.get_or(KEY_DEBOUNCE, d.drop_debounce_ms),
            ..d
        }
    }
}

/// Bring a decoded config back inside the validated ranges.
fn repair(cfg: SystemConfig) -> SystemConfig {
    let Err(e) = validate_config(&cfg) else {
        return cfg;
    };
    let d = SystemConfig::default();
    warn!("SettingsStore: stored settings invalid ({e}), restoring default setpoints");
    let paired = SystemConfig {
        manual_setpoint_c: d.manual_setpoint_c,
        reactivate_temp_c: d.reactivate_temp_c,
        ..cfg
    };
    match validate_config(&paired) {
        Ok(()) => paired,
        Err(e) => {
            warn!("SettingsStore: still invalid ({e}), using defaults");
            d
        }
    }
}

impl<S: StoragePort> ConfigPort for SettingsStore<S> {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        if !self.get_or(KEY_INITIALIZED, false) {
            info!("SettingsStore: first boot, persisting defaults");
            let d = SystemConfig::default();
            self.write_all(&d)?;
            self.put(KEY_INITIALIZED, &true)?;
            return Ok(d);
        }

        let cfg = repair(self.read_all());
        info!("SettingsStore: loaded settings");
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        self.write_all(config)?;
        info!("SettingsStore: settings saved");
        Ok(())
    }
}
