//! Unified error types for the AgroNode firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the task
//! runtime can report failures uniformly.  All variants are `Copy`; they
//! travel through diagnostic records and health flags without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned unusable data.
    Sensor(SensorError),
    /// A relay or feedback line could not be driven or read.
    Actuator(ActuatorError),
    /// Telemetry or forecast traffic failed.
    Network(NetworkError),
    /// A control command was rejected.
    Command(CommandError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC conversion returned an error.
    AdcReadFailed,
    /// The ambient sensor did not answer or returned NaN.
    NoReading,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::NoReading => write!(f, "no reading"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Relay GPIO could not be set.
    GpioWriteFailed,
    /// Feedback GPIO could not be read.
    GpioReadFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// Station is not associated with an access point.
    LinkDown,
    /// The HTTP client could not be created or the request could not start.
    RequestFailed,
    /// Request body or response could not be transferred.
    IoFailed,
    /// Payload could not be serialised.
    Encode,
    /// Server answered with a non-success status.
    Status(u16),
    /// Response body could not be decoded.
    Decode,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkDown => write!(f, "link down"),
            Self::RequestFailed => write!(f, "request failed"),
            Self::IoFailed => write!(f, "I/O failed"),
            Self::Encode => write!(f, "encode failed"),
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::Decode => write!(f, "decode failed"),
        }
    }
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Rejection reasons for operator control commands.  A rejected command
/// leaves shared state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Body was not a JSON object.
    InvalidJson,
    /// A switch field held something other than its accepted values.
    InvalidSwitch(&'static str),
    /// `durationPump` negative or longer than a day.
    InvalidDuration,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "invalid JSON"),
            Self::InvalidSwitch(field) => write!(f, "field '{field}' has an invalid value"),
            Self::InvalidDuration => write!(f, "durationPump out of range"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
