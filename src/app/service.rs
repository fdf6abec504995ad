//! Application service: the glue every task body goes through.
//!
//! [`AppService`] owns the [`StateStore`] and the relay outputs.  Each
//! `*_cycle` method is one activation of a periodic task; all hardware
//! arrives through port traits, so every cycle runs unchanged on the host.
//!
//! ```text
//!  SoilProbe ─┐                                ┌──▶ OutputPort (relays)
//!  AmbientPort ─┼──▶ ┌──────────────────────┐ ──┤
//!  ForecastPort ─┤   │      AppService      │   └──▶ DisplayPort
//!  ActuatorHealth ─┘ │ store · engine · FM  │
//!                    └──────────────────────┘
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::SystemConfig;
use crate::diagnostics::DiagnosticQueue;
use crate::error::CommandError;
use crate::irrigation::{Decision, IrrigationEngine};
use crate::mode::{ModePolicy, OperatingMode};
use crate::safety::{FaultMonitor, HealthInputs};
use crate::sensors::ambient;
use crate::sensors::moisture::SoilSampler;
use crate::state::{ForecastUpdate, StateSnapshot, StateStore, ZONE_COUNT};

use super::commands::parse_control;
use super::ports::{
    ActuatorHealth, AmbientPort, DisplayPort, ForecastPort, OutputPort, SoilProbe,
};
use super::status;

/// Forecast retry when no provider key is configured (ms).
pub const FORECAST_UNCONFIGURED_DELAY_MS: u32 = 3600 * 1000;

// ───────────────────────────────────────────────────────────────
// Output application
// ───────────────────────────────────────────────────────────────

/// Physical relay levels produced by [`apply_outputs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLevels {
    pub pump: bool,
    pub lamp: bool,
}

/// Drive the relays from a snapshot.
///
/// The pump relay follows the command only while the pump is healthy; an
/// unhealthy pump is forced off without touching the commanded value, so
/// output resumes by itself once health returns.  Valves are always off.
pub fn apply_outputs(s: &StateSnapshot, out: &mut impl OutputPort) -> OutputLevels {
    let pump = s.pump_on && s.pump_healthy;
    out.set_pump(pump);
    for zone in 0..ZONE_COUNT {
        out.set_valve(zone, false);
    }
    out.set_lamp(s.lamp_on);
    OutputLevels { pump, lamp: s.lamp_on }
}

// ───────────────────────────────────────────────────────────────
// Health checks
// ───────────────────────────────────────────────────────────────

/// Actuator checks plus the fault monitor that turns them into a mode.
pub struct HealthService<P, L> {
    monitor: FaultMonitor,
    pump: P,
    lamp: L,
}

impl<P: ActuatorHealth, L: ActuatorHealth> HealthService<P, L> {
    pub fn new(config: &SystemConfig, pump: P, lamp: L) -> Self {
        Self {
            monitor: FaultMonitor::new(config),
            pump,
            lamp,
        }
    }

    pub fn monitor(&self) -> &FaultMonitor {
        &self.monitor
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<O> {
    config: SystemConfig,
    store: StateStore,
    outputs: Mutex<CriticalSectionRawMutex, RefCell<O>>,
}

impl<O: OutputPort> AppService<O> {
    pub fn new(config: SystemConfig, outputs: O) -> Self {
        let store = StateStore::new(ModePolicy::from_config(&config));
        Self {
            config,
            store,
            outputs: Mutex::new(RefCell::new(outputs)),
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Re-drive the relays from a fresh snapshot.
    pub fn apply_outputs(&self) -> OutputLevels {
        let snap = self.store.snapshot();
        self.outputs
            .lock(|o| apply_outputs(&snap, &mut *o.borrow_mut()))
    }

    /// Inspect the output adapter (tests, diagnostics).
    pub fn with_outputs<R>(&self, f: impl FnOnce(&O) -> R) -> R {
        self.outputs.lock(|o| f(&o.borrow()))
    }

    // ── Control boundary ──────────────────────────────────────

    /// `POST /api/control`.  A rejected body changes nothing.
    pub fn handle_control(&self, body: &[u8], now_ms: u64) -> Result<(), CommandError> {
        let cmd = parse_control(body).inspect_err(|e| warn!("Control: rejected ({e})"))?;
        cmd.apply(&self.store, now_ms);
        info!("Control: applied {cmd:?}");
        self.apply_outputs();
        Ok(())
    }

    /// `GET /api/status`.
    pub fn status_json(&self, now_ms: u64) -> Option<String> {
        let armed = self.store.snapshot().pump_expiry_ms != 0;
        let body = status::status_json(&self.store, now_ms)
            .inspect_err(|e| warn!("Status: {e}"))
            .ok();
        if armed && self.store.snapshot().pump_expiry_ms == 0 {
            self.apply_outputs();
        }
        body
    }

    // ── Task bodies ───────────────────────────────────────────

    /// Switch task: one irrigation decision.
    pub fn switch_cycle(&self, engine: &IrrigationEngine, now_ms: u64) -> Decision {
        let d = engine.step(&self.store, now_ms);
        if matches!(d, Decision::Start { .. } | Decision::Stop { .. }) {
            self.apply_outputs();
        }
        d
    }

    /// Soil task: sample every zone and commit them together.
    pub fn soil_cycle<P: SoilProbe>(
        &self,
        sampler: &mut SoilSampler<P>,
        delay: &mut impl DelayNs,
    ) -> [f32; ZONE_COUNT] {
        let pct = sampler.read_all(delay);
        self.store.set_moisture(pct);
        pct
    }

    /// Ambient task.  Returns the delay before the next activation.
    pub fn ambient_cycle(&self, port: &mut impl AmbientPort, now_ms: u64) -> u32 {
        ambient::poll(port, &self.store, now_ms).next_delay_ms(self.config.deadline_ambient_ms)
    }

    /// Forecast task.  Returns the delay before the next activation.
    pub fn forecast_cycle(&self, port: &mut impl ForecastPort) -> u32 {
        if !port.configured() {
            info!("Forecast: no API key configured, skipping");
            return FORECAST_UNCONFIGURED_DELAY_MS;
        }
        let snap = self.store.snapshot();
        let previous = ForecastUpdate {
            current: snap.forecast,
            ahead: snap.forecast_ahead,
            rain_soon: snap.rain_soon,
        };
        match port.fetch(&previous) {
            Ok(up) => {
                self.store.set_forecast(&up);
                info!(
                    "Forecast: T={:.1} H={:.0} L={:.2} -> +3h T={:.1} H={:.0} L={:.2} rain={}",
                    up.current.temp_c,
                    up.current.humidity,
                    up.current.light,
                    up.ahead.temp_c,
                    up.ahead.humidity,
                    up.ahead.light,
                    u8::from(up.rain_soon)
                );
            }
            Err(e) => warn!("Forecast: fetch failed: {e}"),
        }
        self.config.deadline_forecast_ms
    }

    /// Display task.
    pub fn display_cycle(&self, port: &mut impl DisplayPort) {
        port.render(&self.store.snapshot());
    }

    /// Health task: check actuators, pick the mode, re-drive outputs.
    pub fn health_cycle<P: ActuatorHealth, L: ActuatorHealth>(
        &self,
        health: &mut HealthService<P, L>,
        diag: &DiagnosticQueue,
        now_ms: u64,
    ) -> OperatingMode {
        let before = self.store.snapshot();
        let pump_ok = health.pump.check();
        let lamp_ok = health.lamp.check();

        let target = health.monitor.evaluate(&HealthInputs {
            pump_ok,
            lamp_ok,
            pump_forced_off: before.pump_on && !before.pump_healthy,
            now_ms,
            ambient_updated_ms: before.ambient_updated_ms,
        });
        self.store.set_health(health.monitor.pump_usable(), lamp_ok);
        if let Some(t) = self.store.set_mode(target, now_ms) {
            diag.record(t.describe());
        }
        self.apply_outputs();
        target
    }
}
