//! Lock-guarded owner of [`SharedState`].
//!
//! Every accessor takes the lock for a single short closure and never does
//! I/O inside it.  Callers that log (mode transitions, expiry) do so after
//! the lock is released, using the value the accessor returned.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use super::{ForecastUpdate, IrrigationRun, SharedState, StateSnapshot, ZONE_COUNT};
use crate::mode::{self, ModePolicy, ModeTransition, OperatingMode};

pub struct StateStore {
    inner: Mutex<CriticalSectionRawMutex, RefCell<SharedState>>,
    policy: ModePolicy,
}

impl StateStore {
    pub fn new(policy: ModePolicy) -> Self {
        Self::with_state(policy, SharedState::default())
    }

    /// Start from an explicit state (tests, restored sessions).
    pub fn with_state(policy: ModePolicy, state: SharedState) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(state)),
            policy,
        }
    }

    pub fn policy(&self) -> &ModePolicy {
        &self.policy
    }

    fn with<R>(&self, f: impl FnOnce(&mut SharedState) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// A fully consistent copy of the shared state.
    pub fn snapshot(&self) -> StateSnapshot {
        self.inner.lock(|cell| *cell.borrow())
    }

    // ── Pump command / override expiry ────────────────────────────

    /// Command the pump.  `expiry_ms == 0` means no automatic revert.
    pub fn set_pump(&self, on: bool, expiry_ms: u64) {
        self.with(|s| {
            s.pump_on = on;
            s.pump_expiry_ms = expiry_ms;
        });
    }

    /// Retract an expired manual pump command.  Returns `true` when the
    /// command was cleared by this call.
    pub fn expire_if_due(&self, now_ms: u64) -> bool {
        self.with(|s| {
            if s.pump_expiry_ms != 0 && now_ms >= s.pump_expiry_ms {
                s.pump_on = false;
                s.pump_expiry_ms = 0;
                true
            } else {
                false
            }
        })
    }

    /// Operator request from the control boundary, applied in one write.
    /// `pump` carries `(on, expiry_ms)`.
    pub fn set_operator(&self, pump: Option<(bool, u64)>, manual: Option<bool>, lamp: Option<bool>) {
        self.with(|s| {
            if let Some((on, expiry_ms)) = pump {
                s.pump_on = on;
                s.pump_expiry_ms = expiry_ms;
            }
            if let Some(m) = manual {
                s.manual = m;
            }
            if let Some(l) = lamp {
                s.lamp_on = l;
            }
        });
    }

    pub fn set_lamp(&self, on: bool) {
        self.with(|s| s.lamp_on = on);
    }

    // ── Schedule / mode ───────────────────────────────────────────

    pub fn set_next_irrigation(&self, at_ms: u64) {
        self.with(|s| s.next_irrigation_ms = at_ms);
    }

    /// Set the next decision time only if it is still unset.
    /// Returns `true` if this call initialised it.
    pub fn init_next_irrigation(&self, at_ms: u64) -> bool {
        self.with(|s| {
            if s.next_irrigation_ms == 0 {
                s.next_irrigation_ms = at_ms;
                true
            } else {
                false
            }
        })
    }

    /// Move to `target`, applying the transition effect in the same write.
    /// Returns `None` when already in `target` (no effect is reapplied).
    pub fn set_mode(&self, target: OperatingMode, now_ms: u64) -> Option<ModeTransition> {
        self.with(|s| {
            let t = mode::transition(s.mode, target, now_ms, &self.policy)?;
            s.mode = t.to;
            if let Some(at) = t.next_irrigation_ms {
                s.next_irrigation_ms = at;
            }
            Some(t)
        })
    }

    // ── Sensor / forecast / health writers ────────────────────────

    /// Commit all zone readings together; each is clamped to `[0, 100]`.
    /// NaN readings keep the previous value for that zone.
    pub fn set_moisture(&self, pct: [f32; ZONE_COUNT]) {
        self.with(|s| {
            for (slot, v) in s.soil.iter_mut().zip(pct) {
                if !v.is_nan() {
                    *slot = v.clamp(0.0, 100.0);
                }
            }
        });
    }

    pub fn set_ambient(&self, temp_c: f32, humidity: f32, now_ms: u64) {
        self.with(|s| {
            s.air_temp_c = temp_c;
            s.air_humidity = humidity;
            s.ambient_updated_ms = now_ms;
        });
    }

    pub fn set_forecast(&self, update: &ForecastUpdate) {
        self.with(|s| {
            s.forecast = update.current;
            s.forecast_ahead = update.ahead;
            s.rain_soon = update.rain_soon;
        });
    }

    pub fn set_health(&self, pump_ok: bool, lamp_ok: bool) {
        self.with(|s| {
            s.pump_healthy = pump_ok;
            s.lamp_healthy = lamp_ok;
        });
    }

    // ── Irrigation run ────────────────────────────────────────────

    /// Open a run on `zone` and command the pump on.
    pub fn start_run(&self, zone: u8, now_ms: u64, duration_ms: u64) {
        self.with(|s| {
            s.run = IrrigationRun {
                active: true,
                zone,
                start_ms: now_ms,
                duration_ms,
            };
            s.pump_on = true;
            s.pump_expiry_ms = 0;
        });
    }

    /// Close the active run and command the pump off.
    pub fn stop_run(&self) {
        self.with(|s| {
            s.run = IrrigationRun::default();
            s.pump_on = false;
            s.pump_expiry_ms = 0;
        });
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(ModePolicy::default())
    }
}
