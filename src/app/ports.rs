//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ task bodies / StateStore (domain)
//! ```
//!
//! Driven adapters (probes, relays, HTTP, display, flash) implement these
//! traits.  Task bodies consume them via generics, so the domain core never
//! touches hardware directly and every path can be driven from host tests.

use core::fmt;

use crate::config::SystemConfig;
use crate::error::{NetworkError, SensorError};
use crate::state::{ForecastUpdate, StateSnapshot};

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw ADC access to the capacitive soil probes.
pub trait SoilProbe {
    /// One raw 12-bit conversion for `zone`.
    fn read_raw(&mut self, zone: usize) -> Result<u16, SensorError>;
}

/// Temperature / humidity source.
pub trait AmbientPort {
    /// `(temp_c, humidity_percent)`, or `None` when the sensor did not answer.
    fn read(&mut self) -> Option<(f32, f32)>;
}

/// Remote forecast source.
pub trait ForecastPort {
    /// Whether a provider key is available.  `false` skips fetching.
    fn configured(&self) -> bool;

    /// Fetch a complete update.  Fields the provider omits are taken from
    /// `previous`, so the result is always a full, consistent record.
    fn fetch(&mut self, previous: &ForecastUpdate) -> Result<ForecastUpdate, NetworkError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Physical relay outputs.
pub trait OutputPort {
    fn set_pump(&mut self, on: bool);
    fn set_valve(&mut self, zone: usize, on: bool);
    fn set_lamp(&mut self, on: bool);
}

/// Health check for one actuator.  `true` = behaving as commanded.
pub trait ActuatorHealth {
    fn check(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Outbound collaborators
// ───────────────────────────────────────────────────────────────

/// HTTP transport for telemetry.
pub trait TelemetryTransport {
    /// Station associated and has an IP.
    fn link_up(&self) -> bool;

    /// POST a JSON body; returns the HTTP status code.
    fn post(&mut self, url: &str, api_key: &str, body: &[u8]) -> Result<u16, NetworkError>;
}

/// Plain HTTP GET, used by the forecast client.
pub trait HttpGet {
    fn link_up(&self) -> bool;

    /// Returns the status code and the full body.
    fn get(&mut self, url: &str) -> Result<(u16, Vec<u8>), NetworkError>;
}

/// Character display.
pub trait DisplayPort {
    /// Show one state.  Page scheduling is up to the adapter.
    fn render(&mut self, snapshot: &StateSnapshot);
}

/// Persistent append-only diagnostic log.
pub trait DiagnosticSink {
    fn append(&mut self, record: &str) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// Backing file could not be opened or written.
    Io,
    /// Rotation to the backup file failed.
    Rotate,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::Rotate => write!(f, "rotation failed"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field is out of its allowed range.
    ValidationFailed(&'static str),
    /// Stored blob could not be decoded.
    Corrupted,
    /// Flash access failed.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Corrupted => write!(f, "stored config corrupted"),
            Self::IoError => write!(f, "storage I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::Corrupted => Self::Config("stored config corrupted"),
            ConfigError::IoError => Self::Config("storage I/O error"),
        }
    }
}
