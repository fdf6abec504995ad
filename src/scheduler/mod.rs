//! Deadline-driven priority hints.
//!
//! Approximates Earliest-Deadline-First on top of a preemptive
//! fixed-priority kernel: every tick the registered tasks are ranked by
//! absolute deadline (`last_activation + period`) and the host scheduler
//! is nudged with fresh priorities.
//!
//! ```text
//!   rank 0  (earliest deadline) ──▶ ceiling
//!   rank 1                      ──▶ ceiling − 1
//!   ...                              ...
//!   rank n                      ──▶ max(ceiling − n, floor)
//! ```
//!
//! Ranking is recomputed from scratch each tick; nothing carries over.
//! Overruns between ticks are caught by [`deadline`] instead.

pub mod deadline;
pub mod registry;

use core::fmt::Write as _;

pub use registry::{MAX_TASKS, RegistryFull, TaskDescriptor, TaskHandle, TaskId, TaskRegistry};

// ───────────────────────────────────────────────────────────────
// Priority hint capability
// ───────────────────────────────────────────────────────────────

/// Applies a priority to a schedulable unit.
///
/// Implemented over FreeRTOS on the device and by recorders in tests.
pub trait PriorityHint {
    fn set_priority(&mut self, handle: TaskHandle, priority: u8);

    /// Highest priority this substrate accepts for application tasks.
    fn max_priority(&self) -> u8 {
        u8::MAX
    }
}

// ───────────────────────────────────────────────────────────────
// Ranking
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedTask {
    pub id: TaskId,
    pub name: &'static str,
    pub handle: Option<TaskHandle>,
    /// Absolute deadline minus now (negative when overdue).
    pub remaining_ms: i32,
    pub priority: u8,
}

/// Rank every registered task by absolute deadline at `now_ms`.
///
/// Ties keep registration order.  Rank `r` gets `ceiling − r`, never below
/// `floor`.  Unbound tasks still occupy their rank.
pub fn rank(
    registry: &TaskRegistry,
    now_ms: u32,
    ceiling: u8,
    floor: u8,
) -> heapless::Vec<RankedTask, MAX_TASKS> {
    let mut order: heapless::Vec<RankedTask, MAX_TASKS> = registry
        .iter()
        .map(|(id, t)| RankedTask {
            id,
            name: t.name,
            handle: t.handle(),
            remaining_ms: t.remaining_ms(now_ms),
            priority: 0,
        })
        .collect();

    // Signed distance rather than raw stamp so ordering survives a wrap.
    order.sort_by_key(|t| t.remaining_ms);

    for (r, t) in order.iter_mut().enumerate() {
        let r = u8::try_from(r).unwrap_or(u8::MAX);
        t.priority = ceiling.saturating_sub(r).max(floor);
    }
    order
}

// ───────────────────────────────────────────────────────────────
// Scheduler
// ───────────────────────────────────────────────────────────────

/// Result of one scheduler tick.
#[derive(Debug, Clone)]
pub struct ScheduleReport {
    pub now_ms: u32,
    pub ranked: heapless::Vec<RankedTask, MAX_TASKS>,
    /// `"[EDF] schedule: Name(rl=N) ..."`, bound tasks only.
    pub line: heapless::String<256>,
}

pub struct EdfScheduler {
    ceiling: u8,
    floor: u8,
}

impl EdfScheduler {
    pub fn new(ceiling: u8, floor: u8) -> Self {
        let floor = floor.max(1);
        Self {
            ceiling: ceiling.max(floor),
            floor,
        }
    }

    pub fn ceiling(&self) -> u8 {
        self.ceiling
    }

    pub fn floor(&self) -> u8 {
        self.floor
    }

    /// Rank, push hints for every bound task, and build the diagnostic line.
    pub fn tick(
        &self,
        registry: &TaskRegistry,
        now_ms: u32,
        hint: &mut impl PriorityHint,
    ) -> ScheduleReport {
        let ceiling = self.ceiling.min(hint.max_priority()).max(self.floor);
        let ranked = rank(registry, now_ms, ceiling, self.floor);

        for t in &ranked {
            if let Some(h) = t.handle {
                hint.set_priority(h, t.priority);
            }
        }

        ScheduleReport {
            now_ms,
            line: schedule_line(&ranked),
            ranked,
        }
    }
}

fn schedule_line(ranked: &[RankedTask]) -> heapless::String<256> {
    const PREFIX: &str = "[EDF] schedule: ";
    let mut line = heapless::String::<256>::new();
    let _ = line.push_str(PREFIX);

    let mut wrote_any = false;
    for t in ranked.iter().filter(|t| t.handle.is_some()) {
        let mut entry = heapless::String::<48>::new();
        if write!(entry, "{}(rl={}) ", t.name, t.remaining_ms).is_err() {
            continue;
        }
        if line.push_str(&entry).is_err() {
            break;
        }
        wrote_any = true;
    }
    if !wrote_any {
        let _ = line.push_str("(empty)");
    }
    line
}
