//! GPIO / peripheral pin assignments for the AgroNode controller board
//! (ESP32-WROOM-32, classic ESP32).
//!
//! Single source of truth: drivers reference this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// I2C (20x4 character LCD backpack)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;

// ---------------------------------------------------------------------------
// Ambient sensor (DHT11, single-wire, open drain with 10 kΩ pull-up)
// ---------------------------------------------------------------------------

pub const DHT_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// Relay board (active HIGH)
// ---------------------------------------------------------------------------

pub const RELAY_PUMP_GPIO: i32 = 25;
/// Zone valves.  Currently unused by the hydraulics: always driven off.
pub const RELAY_VALVE_GPIOS: [i32; 3] = [26, 27, 14];
/// Grow lamp / watchdog indicator.
pub const RELAY_LAMP_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// Capacitive soil probes (ADC1, input-only pins)
// ---------------------------------------------------------------------------

/// Zone probe GPIOs: 34, 35, 32.
pub const SOIL_ADC_GPIOS: [i32; 3] = [34, 35, 32];
/// Matching ADC1 channels (GPIO34 = CH6, GPIO35 = CH7, GPIO32 = CH4).
pub const SOIL_ADC1_CHANNELS: [u32; 3] = [6, 7, 4];

// ---------------------------------------------------------------------------
// Actuator feedback (optional, `None` = not wired)
// ---------------------------------------------------------------------------

pub const FEEDBACK_PUMP_GPIO: Option<i32> = None;
pub const FEEDBACK_LAMP_GPIO: Option<i32> = None;
