//! Fault monitor: picks the operating mode from health evidence.
//!
//! The monitor runs once per Health-task activation.  It keeps a fault
//! bitmask; each bit is set or cleared from the latest checks and the
//! resulting mask maps onto a target mode:
//!
//! | Active faults                         | Target mode |
//! |---------------------------------------|-------------|
//! | `PumpFeedback`                        | SAFE        |
//! | `LampFeedback` and/or `AmbientStale`  | DEGRADED    |
//! | none                                  | NORMAL      |
//!
//! A pump fault needs `pump_fault_confirm_checks` consecutive failed
//! checks; one bad read alone does not force SAFE.  A good read taken
//! while the relay is held off against its command proves nothing about
//! the pump: it neither resets the count nor clears a confirmed fault.

use core::fmt;

use log::{error, info};

use crate::config::SystemConfig;
use crate::mode::OperatingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Fault {
    /// Pump feedback disagrees with the commanded relay level.
    PumpFeedback = 0b0000_0001,
    /// Lamp feedback disagrees with the commanded relay level.
    LampFeedback = 0b0000_0010,
    /// No good ambient reading within the staleness window.
    AmbientStale = 0b0000_0100,
}

impl Fault {
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PumpFeedback => write!(f, "pump feedback mismatch"),
            Self::LampFeedback => write!(f, "lamp feedback mismatch"),
            Self::AmbientStale => write!(f, "ambient sensor stale"),
        }
    }
}

/// Inputs for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthInputs {
    pub pump_ok: bool,
    pub lamp_ok: bool,
    /// Pump commanded on but held off by an earlier failed check.
    pub pump_forced_off: bool,
    pub now_ms: u64,
    /// Time of the last good ambient reading (0 = never).
    pub ambient_updated_ms: u64,
}

pub struct FaultMonitor {
    faults: u8,
    pump_bad_checks: u8,
    pump_usable: bool,
    pump_confirm: u8,
    ambient_stale_after_ms: u64,
}

impl FaultMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            faults: 0,
            pump_bad_checks: 0,
            pump_usable: true,
            pump_confirm: config.pump_fault_confirm_checks.max(1),
            ambient_stale_after_ms: u64::from(config.ambient_stale_after_ms),
        }
    }

    /// Update the fault mask from `inputs` and return the target mode.
    pub fn evaluate(&mut self, inputs: &HealthInputs) -> OperatingMode {
        // ── Pump (debounced) ──────────────────────────────────────
        if !inputs.pump_ok {
            self.pump_bad_checks = self.pump_bad_checks.saturating_add(1);
        } else if !inputs.pump_forced_off {
            self.pump_bad_checks = 0;
        }
        self.eval_fault(Fault::PumpFeedback, self.pump_bad_checks >= self.pump_confirm);
        // Inconclusive good read: retry the relay unless the fault is confirmed.
        self.pump_usable = inputs.pump_ok && !self.has_fault(Fault::PumpFeedback);

        // ── Lamp ──────────────────────────────────────────────────
        self.eval_fault(Fault::LampFeedback, !inputs.lamp_ok);

        // ── Ambient freshness ─────────────────────────────────────
        // Boot counts as the first stamp, so the window starts at power-up.
        let age = inputs.now_ms.saturating_sub(inputs.ambient_updated_ms);
        self.eval_fault(Fault::AmbientStale, age > self.ambient_stale_after_ms);

        self.target_mode()
    }

    pub fn target_mode(&self) -> OperatingMode {
        if self.has_fault(Fault::PumpFeedback) {
            OperatingMode::Safe
        } else if self.faults != 0 {
            OperatingMode::Degraded
        } else {
            OperatingMode::Normal
        }
    }

    /// Whether the pump may be driven, as of the last evaluation.
    pub fn pump_usable(&self) -> bool {
        self.pump_usable
    }

    pub fn faults(&self) -> u8 {
        self.faults
    }

    pub fn has_fault(&self, fault: Fault) -> bool {
        self.faults & fault.mask() != 0
    }

    fn eval_fault(&mut self, fault: Fault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
