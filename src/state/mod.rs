//! Cross-task shared state.
//!
//! ```text
//!   Soil ─┐                      ┌─▶ Switch (decision engine)
//!   Ambient ─┤                   ├─▶ Network (telemetry)
//!   Forecast ─┼─▶ StateStore ────┼─▶ Display
//!   Health ─┤     (one lock)     ├─▶ Control / status boundary
//!   Control ─┘                   └─▶ apply_outputs
//! ```
//!
//! [`SharedState`] is the only mutable record shared between tasks.  It is
//! owned by [`StateStore`]; everything else reads copies through
//! [`StateStore::snapshot`] and mutates through field-group writers.

mod store;

pub use store::StateStore;

use serde::{Deserialize, Serialize};

use crate::mode::OperatingMode;

/// Number of irrigation zones (one moisture probe and one valve each).
pub const ZONE_COUNT: usize = 3;

/// One set of forecast values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub temp_c: f32,
    pub humidity: f32,
    /// Light proxy (visibility or UV index, provider dependent).
    pub light: f32,
}

/// Everything the forecast collaborator commits in one write.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastUpdate {
    /// Conditions now.
    pub current: ForecastPoint,
    /// Conditions at the look-ahead offset (three hours).
    pub ahead: ForecastPoint,
    pub rain_soon: bool,
}

/// The irrigation cycle in progress, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IrrigationRun {
    pub active: bool,
    /// Zone index, `0..ZONE_COUNT`.
    pub zone: u8,
    pub start_ms: u64,
    pub duration_ms: u64,
}

impl IrrigationRun {
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_ms)
    }
}

/// The single cross-task record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedState {
    /// Zone moisture (%), always within `[0, 100]`.
    pub soil: [f32; ZONE_COUNT],

    pub air_temp_c: f32,
    pub air_humidity: f32,
    /// When the last good ambient reading was committed (0 = never).
    pub ambient_updated_ms: u64,

    pub forecast: ForecastPoint,
    pub forecast_ahead: ForecastPoint,
    pub rain_soon: bool,

    /// Commanded pump state (not necessarily the physical relay level).
    pub pump_on: bool,
    /// Absolute expiry for a manually forced pump command (0 = none).
    pub pump_expiry_ms: u64,
    pub pump_healthy: bool,

    pub lamp_on: bool,
    pub lamp_healthy: bool,
    /// Operator flagged manual control from the web UI.
    pub manual: bool,

    /// Absolute time of the next scheduled decision (0 = unset).
    pub next_irrigation_ms: u64,
    pub mode: OperatingMode,
    pub run: IrrigationRun,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            soil: [0.0; ZONE_COUNT],
            air_temp_c: 0.0,
            air_humidity: 0.0,
            ambient_updated_ms: 0,
            forecast: ForecastPoint::default(),
            forecast_ahead: ForecastPoint::default(),
            rain_soon: false,
            pump_on: false,
            pump_expiry_ms: 0,
            // Healthy until a check proves otherwise.
            pump_healthy: true,
            lamp_on: false,
            lamp_healthy: true,
            manual: false,
            next_irrigation_ms: 0,
            mode: OperatingMode::Normal,
            run: IrrigationRun::default(),
        }
    }
}

/// A consistent copy of [`SharedState`] taken under the store lock.
pub type StateSnapshot = SharedState;
