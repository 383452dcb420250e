//! One-shot hardware peripheral initialization.
//!
//! Configures the interrupt-driven inputs (drop sensor, button) using raw
//! ESP-IDF sys calls and installs their ISR handlers.  Output peripherals
//! (Peltier gate, RMT strip, audio UART) are owned by `esp-idf-hal`
//! drivers constructed in `main()`.  Called once before the loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::sensors::drop_detector::{EdgeWatch, TriggerEdge};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── GPIO inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the loop; single-threaded.
    unsafe { init_gpio_inputs()? };
    info!("hw_init: inputs configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    for pin in [crate::pins::DROP_SENSOR_GPIO, crate::pins::BUTTON_GPIO] {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }
    Ok(())
}

// ── GPIO ISR service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn drop_gpio_isr(_arg: *mut core::ffi::c_void) {
    crate::sensors::drop_detector::drop_sensor_isr();
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time is an RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    crate::drivers::button::button_isr_handler(now_ms);
}

/// Install the per-pin ISR service and register both handlers.  The drop
/// sensor interrupt stays disabled until [`GpioEdgeWatch::enable_watch`].
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: ESP_ERR_INVALID_STATE means the service is already
    // installed.  Handlers are static fns that only touch atomics.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        gpio_isr_handler_add(
            crate::pins::DROP_SENSOR_GPIO,
            Some(drop_gpio_isr),
            core::ptr::null_mut(),
        );

        gpio_set_intr_type(crate::pins::BUTTON_GPIO, gpio_int_type_t_GPIO_INTR_NEGEDGE);
        gpio_isr_handler_add(
            crate::pins::BUTTON_GPIO,
            Some(button_gpio_isr),
            core::ptr::null_mut(),
        );
        gpio_intr_enable(crate::pins::BUTTON_GPIO);
    }
    info!("hw_init: ISR service installed (drop sensor, button)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

// ── Drop sensor interrupt as an EdgeWatch ─────────────────────

/// The drop sensor's GPIO interrupt.  Disabling and re-enabling around an
/// edge change keeps a half-configured interrupt from firing.
pub struct GpioEdgeWatch {
    gpio: i32,
    enabled: bool,
}

impl GpioEdgeWatch {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            enabled: false,
        }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(target_os = "espidf")]
    fn platform_enable(&mut self, edge: TriggerEdge) {
        let intr = match edge {
            TriggerEdge::Rising => gpio_int_type_t_GPIO_INTR_POSEDGE,
            TriggerEdge::Falling => gpio_int_type_t_GPIO_INTR_NEGEDGE,
            TriggerEdge::Either => gpio_int_type_t_GPIO_INTR_ANYEDGE,
        };
        // SAFETY: main-loop only; pin configured as input in init.
        unsafe {
            gpio_set_intr_type(self.gpio, intr);
            gpio_intr_enable(self.gpio);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_enable(&mut self, edge: TriggerEdge) {
        log::debug!("GPIO{}(sim): interrupt on {:?}", self.gpio, edge);
    }

    #[cfg(target_os = "espidf")]
    fn platform_disable(&mut self) {
        // SAFETY: main-loop only.
        unsafe {
            gpio_intr_disable(self.gpio);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disable(&mut self) {}
}

impl EdgeWatch for GpioEdgeWatch {
    fn enable_watch(&mut self, edge: TriggerEdge) {
        self.platform_enable(edge);
        self.enabled = true;
    }

    fn disable_watch(&mut self) {
        self.platform_disable();
        self.enabled = false;
    }
}
