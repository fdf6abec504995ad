//! Per-activation deadline check.
//!
//! Soft real-time only: a miss is recorded and counted, never enforced.

use core::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationReport {
    pub name: &'static str,
    pub end_ms: u64,
    pub duration_ms: u64,
    pub deadline_ms: u32,
}

impl ActivationReport {
    pub fn new(name: &'static str, start_ms: u64, end_ms: u64, deadline_ms: u32) -> Self {
        Self {
            name,
            end_ms,
            duration_ms: end_ms.saturating_sub(start_ms),
            deadline_ms,
        }
    }

    /// A run exactly at its deadline is a hit.
    pub fn missed(&self) -> bool {
        self.duration_ms > u64::from(self.deadline_ms)
    }

    /// `"[<end>ms] <name> end duration=<d>ms deadline=<dl>ms HIT|MISS"`
    pub fn line(&self) -> heapless::String<128> {
        let mut s = heapless::String::new();
        let _ = write!(
            s,
            "[{}ms] {} end duration={}ms deadline={}ms {}",
            self.end_ms,
            self.name,
            self.duration_ms,
            self.deadline_ms,
            if self.missed() { "MISS" } else { "HIT" }
        );
        s
    }
}
