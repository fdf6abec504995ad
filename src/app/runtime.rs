//! Task runtime: the fixed task table, the per-activation wrapper and the
//! periodic loops the device threads run.
//!
//! Every activation goes through [`activate`]: stamp the registry, run the
//! body, check the deadline, queue the HIT/MISS line.  The body returns the
//! delay before its next activation, which lets a task retry early (the
//! ambient sensor) or back off (forecast without a key).

use log::debug;

use crate::config::SystemConfig;
use crate::diagnostics::DiagnosticQueue;
use crate::scheduler::deadline::ActivationReport;
use crate::scheduler::registry::{RegistryFull, TaskId, TaskRegistry};
use crate::scheduler::{EdfScheduler, PriorityHint, ScheduleReport};

use super::ports::Clock;

pub const SWITCH_TASK: &str = "SwitchTask";
pub const SOIL_TASK: &str = "SoilTask";
pub const AMBIENT_TASK: &str = "AmbientTask";
pub const HEALTH_TASK: &str = "HealthTask";
pub const NETWORK_TASK: &str = "NetworkTask";
pub const DISPLAY_TASK: &str = "DisplayTask";
pub const FORECAST_TASK: &str = "ForecastTask";
pub const LOG_TASK: &str = "LogTask";

/// Registry ids of the fixed task set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskIds {
    pub switch: TaskId,
    pub soil: TaskId,
    pub ambient: TaskId,
    pub health: TaskId,
    pub network: TaskId,
    pub display: TaskId,
    pub forecast: TaskId,
    pub log: TaskId,
}

/// Populate `registry` with the fixed task set.  Called once at startup.
pub fn register_tasks(
    registry: &mut TaskRegistry,
    cfg: &SystemConfig,
    now_ms: u32,
) -> Result<TaskIds, RegistryFull> {
    Ok(TaskIds {
        switch: registry.register(SWITCH_TASK, cfg.deadline_switch_ms, now_ms)?,
        soil: registry.register(SOIL_TASK, cfg.deadline_soil_ms, now_ms)?,
        ambient: registry.register(AMBIENT_TASK, cfg.deadline_ambient_ms, now_ms)?,
        health: registry.register(HEALTH_TASK, cfg.deadline_health_ms, now_ms)?,
        network: registry.register(NETWORK_TASK, cfg.deadline_network_ms, now_ms)?,
        display: registry.register(DISPLAY_TASK, cfg.deadline_display_ms, now_ms)?,
        forecast: registry.register(FORECAST_TASK, cfg.deadline_forecast_ms, now_ms)?,
        log: registry.register(LOG_TASK, cfg.deadline_log_ms, now_ms)?,
    })
}

/// Run one activation of task `id`.  Returns the body's requested delay.
pub fn activate(
    registry: &TaskRegistry,
    id: TaskId,
    clock: &impl Clock,
    diag: &DiagnosticQueue,
    body: impl FnOnce(u64) -> u32,
) -> u32 {
    let start = clock.now_ms();
    let Some(desc) = registry.get(id) else {
        return body(start);
    };

    // Registry stamps are 32-bit and wrap.
    registry.report_start(id, start as u32);
    debug!("[EDF] {} start at {}ms", desc.name, start);

    let delay = body(start);

    let report = ActivationReport::new(desc.name, start, clock.now_ms(), desc.period_ms);
    if report.missed() {
        registry.record_miss(id);
    }
    diag.record(&report.line());
    delay
}

/// Periodic task loop.  Never returns.
pub fn run_periodic(
    registry: &TaskRegistry,
    id: TaskId,
    clock: &impl Clock,
    diag: &DiagnosticQueue,
    mut body: impl FnMut(u64) -> u32,
) -> ! {
    loop {
        let delay = activate(registry, id, clock, diag, &mut body);
        std::thread::sleep(std::time::Duration::from_millis(u64::from(delay)));
    }
}

/// One re-prioritisation pass; the schedule line goes to diagnostics.
pub fn scheduler_pass(
    scheduler: &EdfScheduler,
    registry: &TaskRegistry,
    clock: &impl Clock,
    hint: &mut impl PriorityHint,
    diag: &DiagnosticQueue,
) -> ScheduleReport {
    let report = scheduler.tick(registry, clock.now_ms() as u32, hint);
    diag.record(&report.line);
    report
}

/// Scheduler loop.  Never returns.
pub fn run_scheduler(
    scheduler: &EdfScheduler,
    registry: &TaskRegistry,
    clock: &impl Clock,
    hint: &mut impl PriorityHint,
    diag: &DiagnosticQueue,
    tick_ms: u32,
) -> ! {
    loop {
        scheduler_pass(scheduler, registry, clock, hint, diag);
        std::thread::sleep(std::time::Duration::from_millis(u64::from(tick_ms)));
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::app::ports::{DiagnosticSink, SinkError};

    struct StepClock(Cell<u64>);

    impl Clock for StepClock {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    #[derive(Default)]
    struct Lines(Vec<String>);

    impl DiagnosticSink for Lines {
        fn append(&mut self, record: &str) -> Result<(), SinkError> {
            self.0.push(record.to_owned());
            Ok(())
        }
    }

    #[test]
    fn table_has_eight_tasks() {
        let mut reg = TaskRegistry::new();
        let ids = register_tasks(&mut reg, &SystemConfig::default(), 0).unwrap();
        assert_eq!(reg.len(), 8);
        assert_eq!(reg.find(LOG_TASK), Some(ids.log));
        assert_eq!(reg.get(ids.forecast).unwrap().period_ms, 60_000);
    }

    #[test]
    fn activation_stamps_and_reports() {
        let mut reg = TaskRegistry::new();
        let id = reg.register(SWITCH_TASK, 500, 0).unwrap();
        let clock = StepClock(Cell::new(1000));
        let diag = DiagnosticQueue::new();

        let delay = activate(&reg, id, &clock, &diag, |now| {
            assert_eq!(now, 1000);
            clock.0.set(1600);
            250
        });

        assert_eq!(delay, 250);
        assert_eq!(reg.get(id).unwrap().last_activation_ms(), 1000);
        assert_eq!(reg.get(id).unwrap().misses(), 1);

        let mut lines = Lines::default();
        diag.drain(&mut lines);
        assert_eq!(
            lines.0,
            ["[1600ms] SwitchTask end duration=600ms deadline=500ms MISS"]
        );
    }

    #[test]
    fn scheduler_pass_records_line() {
        struct Nop;
        impl PriorityHint for Nop {
            fn set_priority(&mut self, _: crate::scheduler::registry::TaskHandle, _: u8) {}
        }
        let reg = TaskRegistry::new();
        let diag = DiagnosticQueue::new();
        let clock = StepClock(Cell::new(0));
        let r = scheduler_pass(&EdfScheduler::new(6, 1), &reg, &clock, &mut Nop, &diag);
        assert!(r.ranked.is_empty());
        assert_eq!(diag.len(), 1);
    }
}
