//! Operator control commands from the web UI.
//!
//! `POST /api/control` carries a JSON object:
//!
//! ```json
//! { "pump": 0|1, "durationPump": <secs>, "manual": 0|1, "light": 0|1,
//!   "mode": "manual"|"auto" }
//! ```
//!
//! Every field is optional; unknown fields are ignored.  Validation happens
//! completely before anything is written, so a rejected request leaves the
//! store untouched.

use serde::Deserialize;

use crate::error::CommandError;
use crate::state::StateStore;

/// Longest accepted manual pump run (s).
pub const MAX_PUMP_DURATION_S: u32 = 24 * 3600;

/// A validated control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlCommand {
    pub pump: Option<bool>,
    /// Manual pump run length; 0 = until changed.
    pub duration_pump_s: u32,
    pub manual: Option<bool>,
    pub lamp: Option<bool>,
}

#[derive(Deserialize)]
struct ControlRequest<'a> {
    pump: Option<i64>,
    #[serde(rename = "durationPump")]
    duration_pump: Option<i64>,
    manual: Option<i64>,
    light: Option<i64>,
    #[serde(borrow)]
    mode: Option<&'a str>,
}

fn switch(field: &'static str, v: Option<i64>) -> Result<Option<bool>, CommandError> {
    match v {
        None => Ok(None),
        Some(0) => Ok(Some(false)),
        Some(1) => Ok(Some(true)),
        Some(_) => Err(CommandError::InvalidSwitch(field)),
    }
}

/// Decode and validate a control body.
pub fn parse_control(body: &[u8]) -> Result<ControlCommand, CommandError> {
    if body.trim_ascii_start().first() != Some(&b'{') {
        return Err(CommandError::InvalidJson);
    }
    let req: ControlRequest<'_> =
        serde_json::from_slice(body).map_err(|_| CommandError::InvalidJson)?;

    let pump = switch("pump", req.pump)?;
    let lamp = switch("light", req.light)?;
    let mut manual = switch("manual", req.manual)?;
    if let Some(m) = req.mode {
        manual = match m {
            "manual" => Some(true),
            "auto" => Some(false),
            _ => return Err(CommandError::InvalidSwitch("mode")),
        };
    }

    let duration_pump_s = match req.duration_pump {
        None => 0,
        Some(d) if (0..=i64::from(MAX_PUMP_DURATION_S)).contains(&d) => d as u32,
        Some(_) => return Err(CommandError::InvalidDuration),
    };

    Ok(ControlCommand {
        pump,
        duration_pump_s,
        manual,
        lamp,
    })
}

impl ControlCommand {
    /// Absolute expiry for the pump command (0 = none).
    pub fn pump_expiry_ms(&self, now_ms: u64) -> u64 {
        if self.duration_pump_s > 0 {
            now_ms.saturating_add(u64::from(self.duration_pump_s) * 1000)
        } else {
            0
        }
    }

    /// Write the command into the store in one critical section.
    pub fn apply(&self, store: &StateStore, now_ms: u64) {
        let pump = self.pump.map(|on| (on, self.pump_expiry_ms(now_ms)));
        store.set_operator(pump, self.manual, self.lamp);
    }
}
