//! Irrigation decision engine.
//!
//! One decision per Switch-task activation:
//!
//! ```text
//!   snapshot ──▶ run active? ──yes──▶ elapsed ≥ planned  or  soil ≥ off ? ──▶ Stop
//!                    │ no
//!                    ▼
//!                SAFE mode? ──yes──▶ push schedule one period (idle hold)
//!                    │ no
//!                    ▼
//!      due ∧ ¬rain ∧ forecast RH < gate ? ──no──▶ wait (no deferral)
//!                    │ yes
//!                    ▼
//!      pump healthy? ──no──▶ skip cycle, push schedule
//!                    │ yes
//!                    ▼
//!      first zone (0,1,2) below threshold ──▶ Start   (none ──▶ push schedule)
//! ```
//!
//! [`decide`] is pure over a snapshot; [`IrrigationEngine::step`] takes
//! the snapshot and writes the outcome back through the store.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::mode::OperatingMode;
use crate::state::{StateSnapshot, StateStore, ZONE_COUNT};

/// Adaptive start threshold (%) for the given conditions.
///
/// Baseline `soil_on_percent`, raised when air is hot and dry, raised again
/// when the look-ahead forecast is hot and dry, lowered when current forecast
/// humidity is high.  Always within the configured clamp.
pub fn desired_threshold(s: &StateSnapshot, cfg: &SystemConfig) -> f32 {
    let mut thr = cfg.soil_on_percent;
    if s.air_temp_c > cfg.hot_air_c && s.air_humidity < cfg.dry_humidity_percent {
        thr += cfg.hot_dry_bonus;
    }
    if s.forecast_ahead.temp_c > cfg.hot_forecast_c
        && s.forecast_ahead.humidity < cfg.dry_humidity_percent
    {
        thr += cfg.forecast_hot_dry_bonus;
    }
    if s.forecast.humidity > cfg.humid_forecast_percent {
        thr -= cfg.humid_forecast_penalty;
    }
    thr.clamp(cfg.threshold_min_percent, cfg.threshold_max_percent)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Planned duration elapsed.
    Elapsed,
    /// Active zone reached the off threshold.
    Watered,
}

/// Outcome of one decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Run in progress, keep going.
    Running,
    Stop { zone: u8, reason: StopReason },
    Start { zone: u8, duration_ms: u64 },
    /// Nothing below threshold; next decision pushed to `next_ms`.
    Defer { next_ms: u64 },
    /// SAFE mode while idle; next decision pushed to `next_ms`.
    SafeHold { next_ms: u64 },
    /// Pump failed its health check; cycle skipped, schedule pushed.
    PumpUnhealthy { next_ms: u64 },
    /// Due, but rain or humid forecast holds it.  Not deferred.
    WeatherHold,
    NotDue,
}

/// Decide from a snapshot alone.
pub fn decide(s: &StateSnapshot, now_ms: u64, cfg: &SystemConfig) -> Decision {
    if s.run.active {
        let zone = s.run.zone;
        let soil = s.soil.get(zone as usize).copied().unwrap_or(0.0);
        if s.run.elapsed_ms(now_ms) >= s.run.duration_ms {
            return Decision::Stop {
                zone,
                reason: StopReason::Elapsed,
            };
        }
        if soil >= cfg.soil_off_percent {
            return Decision::Stop {
                zone,
                reason: StopReason::Watered,
            };
        }
        return Decision::Running;
    }

    let push = now_ms.saturating_add(cfg.schedule_period_ms);

    if s.mode == OperatingMode::Safe {
        return Decision::SafeHold { next_ms: push };
    }

    let due = now_ms >= s.next_irrigation_ms;
    if !due {
        return Decision::NotDue;
    }
    if s.rain_soon || s.forecast.humidity >= cfg.forecast_humidity_gate_percent {
        return Decision::WeatherHold;
    }
    if !s.pump_healthy {
        return Decision::PumpUnhealthy { next_ms: push };
    }

    let thr = desired_threshold(s, cfg);
    match (0..ZONE_COUNT).find(|&z| s.soil[z] < thr) {
        Some(z) => Decision::Start {
            zone: z as u8,
            duration_ms: s.mode.run_duration_ms(cfg),
        },
        None => Decision::Defer { next_ms: push },
    }
}

/// Decision loop bound to a store.
pub struct IrrigationEngine {
    cfg: SystemConfig,
}

impl IrrigationEngine {
    pub fn new(cfg: SystemConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.cfg
    }

    /// Take one snapshot, decide, and write the outcome back.
    ///
    /// An unset schedule is initialised to one period from now, but this
    /// decision still runs against the snapshot taken before that, so the
    /// very first cycle is due.
    pub fn step(&self, store: &StateStore, now_ms: u64) -> Decision {
        let snap = store.snapshot();
        if snap.next_irrigation_ms == 0 {
            store.init_next_irrigation(now_ms.saturating_add(self.cfg.schedule_period_ms));
        }

        let decision = decide(&snap, now_ms, &self.cfg);
        match decision {
            Decision::Stop { zone, reason } => {
                store.stop_run();
                info!("Irrigation: zone {zone} stopped ({reason:?})");
            }
            Decision::Start { zone, duration_ms } => {
                if snap.mode == OperatingMode::Degraded {
                    info!("Irrigation: DEGRADED, using short run {duration_ms} ms");
                }
                store.start_run(zone, now_ms, duration_ms);
                info!("Irrigation: zone {zone} started for {duration_ms} ms");
            }
            Decision::Defer { next_ms } | Decision::SafeHold { next_ms } => {
                store.set_next_irrigation(next_ms);
            }
            Decision::PumpUnhealthy { next_ms } => {
                warn!("Irrigation: pump not healthy, skipping cycle");
                store.set_next_irrigation(next_ms);
            }
            Decision::Running | Decision::WeatherHold | Decision::NotDue => {}
        }
        decision
    }
}
