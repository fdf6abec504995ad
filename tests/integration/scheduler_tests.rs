//! Deadline ranking over the real task table, plus the activation wrapper.

use agronode::app::runtime::{self, activate, register_tasks};
use agronode::config::SystemConfig;
use agronode::diagnostics::DiagnosticQueue;
use agronode::scheduler::{EdfScheduler, PriorityHint, TaskHandle, TaskRegistry};

use crate::mock_hw::{ManualClock, MemorySink};

#[derive(Default)]
struct Recorder {
    calls: Vec<(TaskHandle, u8)>,
}

impl PriorityHint for Recorder {
    fn set_priority(&mut self, handle: TaskHandle, priority: u8) {
        self.calls.push((handle, priority));
    }

    fn max_priority(&self) -> u8 {
        24
    }
}

fn bound_registry(now_ms: u32) -> (TaskRegistry, runtime::TaskIds) {
    let mut reg = TaskRegistry::new();
    let ids = register_tasks(&mut reg, &SystemConfig::default(), now_ms).unwrap();
    let all: Vec<_> = reg.iter().map(|(id, _)| id).collect();
    for (i, id) in all.into_iter().enumerate() {
        reg.bind(id, TaskHandle(100 + i));
    }
    (reg, ids)
}

#[test]
fn full_table_priorities_follow_deadlines() {
    let (reg, _) = bound_registry(0);
    let cfg = SystemConfig::default();
    let sched = EdfScheduler::new(cfg.max_task_priority, cfg.min_task_priority);
    let mut hint = Recorder::default();

    let report = sched.tick(&reg, 0, &mut hint);
    assert_eq!(report.ranked.len(), 8);
    assert_eq!(hint.calls.len(), 8);

    // Switch and Soil share the 500 ms deadline; registration order wins.
    assert_eq!(report.ranked[0].name, runtime::SWITCH_TASK);
    assert_eq!(report.ranked[0].priority, 6);
    assert_eq!(report.ranked[1].name, runtime::SOIL_TASK);
    assert_eq!(report.ranked[1].priority, 5);
    assert_eq!(report.ranked[7].name, runtime::FORECAST_TASK);
    assert_eq!(report.ranked[7].priority, 1);

    for pair in report.ranked.windows(2) {
        assert!(pair[0].remaining_ms <= pair[1].remaining_ms);
        assert!(pair[0].priority >= pair[1].priority);
    }
    assert!(report.line.starts_with("[EDF] schedule: SwitchTask(rl=500)"));
}

#[test]
fn reactivation_moves_task_back() {
    let (reg, ids) = bound_registry(0);
    let sched = EdfScheduler::new(6, 1);

    reg.report_start(ids.switch, 400);
    let report = sched.tick(&reg, 450, &mut Recorder::default());
    assert_eq!(report.ranked[0].name, runtime::SOIL_TASK);
}

#[test]
fn overdue_tasks_rank_first() {
    let (reg, ids) = bound_registry(0);
    let sched = EdfScheduler::new(6, 1);
    for id in [ids.switch, ids.soil, ids.display] {
        reg.report_start(id, 5_000);
    }
    // Ambient and Network (2000 ms) went overdue at t=2000.
    let report = sched.tick(&reg, 5_400, &mut Recorder::default());
    assert_eq!(report.ranked[0].name, runtime::AMBIENT_TASK);
    assert_eq!(report.ranked[1].name, runtime::NETWORK_TASK);
    assert_eq!(report.ranked[0].remaining_ms, -3_400);
    assert_eq!(report.ranked[7].name, runtime::FORECAST_TASK);
}

#[test]
fn activation_records_hit_and_miss() {
    let (reg, ids) = bound_registry(0);
    let clock = ManualClock::at(1_000);
    let diag = DiagnosticQueue::new();

    let delay = activate(&reg, ids.display, &clock, &diag, |_| {
        clock.advance(200);
        1_000
    });
    assert_eq!(delay, 1_000);
    assert_eq!(reg.get(ids.display).unwrap().last_activation_ms(), 1_000);

    activate(&reg, ids.switch, &clock, &diag, |_| {
        clock.advance(501);
        0
    });
    assert_eq!(reg.get(ids.switch).unwrap().misses(), 1);

    let mut sink = MemorySink::default();
    assert_eq!(diag.drain(&mut sink), 2);
    assert_eq!(
        sink.lines[0],
        "[1200ms] DisplayTask end duration=200ms deadline=1000ms HIT"
    );
    assert!(sink.lines[1].ends_with("MISS"));
}

#[test]
fn scheduler_pass_queues_schedule_line() {
    let (reg, _) = bound_registry(0);
    let diag = DiagnosticQueue::new();
    let clock = ManualClock::at(100);
    runtime::scheduler_pass(
        &EdfScheduler::new(6, 1),
        &reg,
        &clock,
        &mut Recorder::default(),
        &diag,
    );
    let mut sink = MemorySink::default();
    diag.drain(&mut sink);
    assert!(sink.lines[0].starts_with("[EDF] schedule: "));
}
