//! System configuration parameters
//!
//! All tunable parameters for the AgroNode controller.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Soil thresholds ---
    /// Baseline moisture (%) below which a zone wants water.
    pub soil_on_percent: f32,
    /// Moisture (%) at which a running zone is considered watered.
    pub soil_off_percent: f32,
    /// Lower clamp for the adaptive start threshold (%).
    pub threshold_min_percent: f32,
    /// Upper clamp for the adaptive start threshold (%).
    pub threshold_max_percent: f32,

    // --- Threshold adjustments ---
    /// Added when ambient air is hot and dry.
    pub hot_dry_bonus: f32,
    /// Added when the look-ahead forecast is hot and dry.
    pub forecast_hot_dry_bonus: f32,
    /// Subtracted when current forecast humidity is high.
    pub humid_forecast_penalty: f32,
    /// Ambient temperature (°C) above which air counts as hot.
    pub hot_air_c: f32,
    /// Look-ahead forecast temperature (°C) above which it counts as hot.
    pub hot_forecast_c: f32,
    /// Humidity (%) below which air counts as dry.
    pub dry_humidity_percent: f32,
    /// Forecast humidity (%) above which the threshold is relaxed.
    pub humid_forecast_percent: f32,
    /// Forecast humidity (%) at or above which no cycle starts.
    pub forecast_humidity_gate_percent: f32,

    // --- Irrigation timing ---
    /// Nominal run length (ms).
    pub irrigation_ms: u64,
    /// Run length under DEGRADED mode (ms).
    pub degraded_irrigation_ms: u64,
    /// Interval between scheduled decisions (ms).
    pub schedule_period_ms: u64,
    /// Deferral applied when entering DEGRADED mode (ms).
    pub degraded_defer_ms: u64,
    /// Decision loop period (ms).
    pub decision_period_ms: u32,
    /// Network task period (ms); its relative deadline is `deadline_network_ms`.
    pub network_period_ms: u32,

    // --- Soil sensor calibration (raw ADC counts) ---
    pub soil_adc_wet: u16,
    pub soil_adc_dry: u16,

    // --- Task periods / relative deadlines (ms) ---
    pub deadline_switch_ms: u32,
    pub deadline_soil_ms: u32,
    pub deadline_ambient_ms: u32,
    pub deadline_health_ms: u32,
    pub deadline_forecast_ms: u32,
    pub deadline_network_ms: u32,
    pub deadline_display_ms: u32,
    pub deadline_log_ms: u32,

    // --- Deadline scheduler ---
    /// Interval between re-prioritisation passes (ms).
    pub scheduler_tick_ms: u32,
    /// Priority given to the most urgent task.
    pub max_task_priority: u8,
    /// Priority floor; no task is ranked below this.
    pub min_task_priority: u8,

    // --- Network ---
    /// Minimum spacing between telemetry transmissions (ms).
    pub network_min_interval_ms: u32,
    /// Consecutive failures tracked before the counter saturates.
    pub network_max_retries: u8,

    // --- Diagnostics ---
    /// Size (bytes) at which the diagnostic log rotates to its backup.
    pub diag_log_max_bytes: u32,

    // --- Fault monitor ---
    /// Ambient readings older than this mark the sensor stale (ms).
    pub ambient_stale_after_ms: u32,
    /// Consecutive failed pump checks before the pump is declared faulty.
    pub pump_fault_confirm_checks: u8,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Soil thresholds
            soil_on_percent: 60.0,
            soil_off_percent: 70.0,
            threshold_min_percent: 40.0,
            threshold_max_percent: 95.0,

            // Adjustments
            hot_dry_bonus: 8.0,
            forecast_hot_dry_bonus: 5.0,
            humid_forecast_penalty: 6.0,
            hot_air_c: 30.0,
            hot_forecast_c: 32.0,
            dry_humidity_percent: 40.0,
            humid_forecast_percent: 80.0,
            forecast_humidity_gate_percent: 90.0,

            // Irrigation timing
            irrigation_ms: 8_280_000,             // 2.3 h
            degraded_irrigation_ms: 5 * 60 * 1000, // 5 min
            schedule_period_ms: 5 * 7 * 24 * 3600 * 1000, // 5 weeks
            degraded_defer_ms: 3600 * 1000,        // 1 h
            decision_period_ms: 1000,
            network_period_ms: 1000,

            // Capacitive soil probe
            soil_adc_wet: 800,
            soil_adc_dry: 2400,

            // Task model
            deadline_switch_ms: 500,
            deadline_soil_ms: 500,
            deadline_ambient_ms: 2000,
            deadline_health_ms: 5000,
            deadline_forecast_ms: 60_000,
            deadline_network_ms: 2000,
            deadline_display_ms: 1000,
            deadline_log_ms: 5000,

            // Scheduler
            scheduler_tick_ms: 500,
            max_task_priority: 6,
            min_task_priority: 1,

            // Network
            network_min_interval_ms: 1000,
            network_max_retries: 3,

            // Diagnostics
            diag_log_max_bytes: 64 * 1024,

            // Fault monitor
            ambient_stale_after_ms: 30_000,
            pump_fault_confirm_checks: 2,
        }
    }
}

impl SystemConfig {
    /// Range-check every field. Out-of-range values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.soil_on_percent) {
            return Err(ConfigError::ValidationFailed("soil_on_percent must be 0–100"));
        }
        if !(0.0..=100.0).contains(&self.soil_off_percent) {
            return Err(ConfigError::ValidationFailed("soil_off_percent must be 0–100"));
        }
        if self.soil_on_percent >= self.soil_off_percent {
            return Err(ConfigError::ValidationFailed(
                "soil_on_percent must be below soil_off_percent",
            ));
        }
        if self.threshold_min_percent > self.threshold_max_percent
            || self.threshold_min_percent < 0.0
            || self.threshold_max_percent > 100.0
        {
            return Err(ConfigError::ValidationFailed(
                "threshold clamp must satisfy 0 <= min <= max <= 100",
            ));
        }
        if self.irrigation_ms == 0 || self.degraded_irrigation_ms == 0 {
            return Err(ConfigError::ValidationFailed("irrigation durations must be > 0"));
        }
        if self.degraded_irrigation_ms > self.irrigation_ms {
            return Err(ConfigError::ValidationFailed(
                "degraded_irrigation_ms must not exceed irrigation_ms",
            ));
        }
        if self.schedule_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("schedule_period_ms must be > 0"));
        }
        if !(100..=60_000).contains(&self.decision_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "decision_period_ms must be 100–60000",
            ));
        }
        if self.network_period_ms == 0 || self.network_period_ms > self.deadline_network_ms {
            return Err(ConfigError::ValidationFailed(
                "network_period_ms must be 1..=deadline_network_ms",
            ));
        }
        if self.soil_adc_wet >= self.soil_adc_dry || self.soil_adc_dry > 4095 {
            return Err(ConfigError::ValidationFailed(
                "soil ADC calibration must satisfy wet < dry <= 4095",
            ));
        }
        let deadlines = [
            self.deadline_switch_ms,
            self.deadline_soil_ms,
            self.deadline_ambient_ms,
            self.deadline_health_ms,
            self.deadline_forecast_ms,
            self.deadline_network_ms,
            self.deadline_display_ms,
            self.deadline_log_ms,
        ];
        if deadlines.iter().any(|&d| d == 0 || d > 3_600_000) {
            return Err(ConfigError::ValidationFailed("task deadlines must be 1–3600000 ms"));
        }
        if !(50..=10_000).contains(&self.scheduler_tick_ms) {
            return Err(ConfigError::ValidationFailed("scheduler_tick_ms must be 50–10000"));
        }
        if self.min_task_priority == 0 || self.min_task_priority > self.max_task_priority {
            return Err(ConfigError::ValidationFailed(
                "task priorities must satisfy 1 <= min <= max",
            ));
        }
        if self.max_task_priority > 24 {
            return Err(ConfigError::ValidationFailed("max_task_priority must be <= 24"));
        }
        if self.network_max_retries == 0 {
            return Err(ConfigError::ValidationFailed("network_max_retries must be > 0"));
        }
        if !(1024..=1024 * 1024).contains(&self.diag_log_max_bytes) {
            return Err(ConfigError::ValidationFailed(
                "diag_log_max_bytes must be 1 KiB–1 MiB",
            ));
        }
        if self.pump_fault_confirm_checks == 0 {
            return Err(ConfigError::ValidationFailed(
                "pump_fault_confirm_checks must be > 0",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Build-time endpoints
// ---------------------------------------------------------------------------

/// Telemetry collector endpoint, baked in at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryEndpoint {
    pub base_url: &'static str,
    pub api_key: &'static str,
}

impl TelemetryEndpoint {
    /// `None` unless both `AGRONODE_TELEMETRY_URL` and `AGRONODE_TELEMETRY_KEY`
    /// were set (and non-empty) when the firmware was built.
    pub fn from_build_env() -> Option<Self> {
        Self::from_parts(
            option_env!("AGRONODE_TELEMETRY_URL"),
            option_env!("AGRONODE_TELEMETRY_KEY"),
        )
    }

    pub fn from_parts(url: Option<&'static str>, key: Option<&'static str>) -> Option<Self> {
        match (url, key) {
            (Some(u), Some(k)) if !u.is_empty() && !k.is_empty() => Some(Self {
                base_url: u,
                api_key: k,
            }),
            _ => None,
        }
    }
}

/// Forecast API key, or `None` when the firmware was built without one.
pub fn forecast_api_key() -> Option<&'static str> {
    option_env!("AGRONODE_FORECAST_KEY").filter(|k| !k.is_empty())
}
