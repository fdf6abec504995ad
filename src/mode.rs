//! Operating mode state machine.
//!
//! ```text
//!            fault (lamp / ambient)          fault (pump)
//!   NORMAL ─────────────────────▶ DEGRADED ─────────────▶ SAFE
//!     ▲                              │                      │
//!     └────────── faults cleared ────┴──────────────────────┘
//! ```
//!
//! The machine owns only the transition *effects*; the evidence that picks
//! the target mode lives in [`crate::safety::FaultMonitor`].  Effects run
//! once per change.  Setting the mode it is already in does nothing.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperatingMode {
    #[default]
    Normal,
    Degraded,
    Safe,
}

impl OperatingMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Degraded => "DEGRADED",
            Self::Safe => "SAFE",
        }
    }

    /// Run length for a freshly started irrigation cycle in this mode.
    pub fn run_duration_ms(self, cfg: &SystemConfig) -> u64 {
        match self {
            Self::Degraded => cfg.degraded_irrigation_ms,
            Self::Normal | Self::Safe => cfg.irrigation_ms,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing knobs the transition effects need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModePolicy {
    pub schedule_period_ms: u64,
    pub degraded_defer_ms: u64,
}

impl ModePolicy {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            schedule_period_ms: cfg.schedule_period_ms,
            degraded_defer_ms: cfg.degraded_defer_ms,
        }
    }
}

impl Default for ModePolicy {
    fn default() -> Self {
        Self::from_config(&SystemConfig::default())
    }
}

/// A mode change that actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: OperatingMode,
    pub to: OperatingMode,
    /// The next-irrigation time written by the effect, if any.
    pub next_irrigation_ms: Option<u64>,
}

impl ModeTransition {
    /// The diagnostic line for this transition.
    pub fn describe(&self) -> &'static str {
        match self.to {
            OperatingMode::Safe => "[SYS] entered SAFE mode, deferred irrigation",
            OperatingMode::Degraded => "[SYS] entered DEGRADED mode, delaying irrigation 1h",
            OperatingMode::Normal => "[SYS] back to NORMAL mode",
        }
    }
}

/// Compute the transition from `current` to `target` at `now_ms`.
///
/// Returns `None` when the mode is unchanged.  The caller applies
/// `next_irrigation_ms` together with the new mode in one write.
pub fn transition(
    current: OperatingMode,
    target: OperatingMode,
    now_ms: u64,
    policy: &ModePolicy,
) -> Option<ModeTransition> {
    if current == target {
        return None;
    }
    let next_irrigation_ms = match target {
        OperatingMode::Safe => Some(now_ms.saturating_add(policy.schedule_period_ms)),
        OperatingMode::Degraded => Some(now_ms.saturating_add(policy.degraded_defer_ms)),
        OperatingMode::Normal => None,
    };
    Some(ModeTransition {
        from: current,
        to: target,
        next_irrigation_ms,
    })
}
