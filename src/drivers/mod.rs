//! Actuator drivers, light animation, hardware initialisation.

pub mod audio;
pub mod button;
pub mod hw_init;
pub mod led_fade;
pub mod neopixel;
pub mod peltier;
