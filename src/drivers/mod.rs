//! Peripheral drivers, hardware initialisation and task pinning.

pub mod dht11;
pub mod hw_init;
pub mod lcd;
pub mod relay;
pub mod task_pin;
