//! Ambient temperature / humidity polling.
//!
//! A missing or NaN reading is stale data: nothing is committed, the last
//! good values stay in the store, and the task retries sooner.

use crate::app::ports::AmbientPort;
use crate::state::StateStore;

/// Retry delay after a failed read (ms).
pub const AMBIENT_RETRY_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmbientPoll {
    Committed { temp_c: f32, humidity: f32 },
    Stale,
}

impl AmbientPoll {
    /// Delay before the next activation.
    pub fn next_delay_ms(&self, period_ms: u32) -> u32 {
        match self {
            Self::Committed { .. } => period_ms,
            Self::Stale => AMBIENT_RETRY_MS,
        }
    }
}

pub fn poll(port: &mut impl AmbientPort, store: &StateStore, now_ms: u64) -> AmbientPoll {
    match port.read() {
        Some((t, h)) if !t.is_nan() && !h.is_nan() => {
            store.set_ambient(t, h, now_ms);
            AmbientPoll::Committed {
                temp_c: t,
                humidity: h,
            }
        }
        _ => {
            log::debug!("Ambient: no reading, keeping last values");
            AmbientPoll::Stale
        }
    }
}
