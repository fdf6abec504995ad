//! End-to-end decision scenarios through `AppService` with mock relays.

use agronode::app::service::AppService;
use agronode::config::SystemConfig;
use agronode::irrigation::{Decision, IrrigationEngine, StopReason};
use agronode::mode::OperatingMode;
use agronode::state::{ForecastPoint, ForecastUpdate};

use crate::mock_hw::MockOutputs;

const T0: u64 = 10_000;

fn service() -> (AppService<MockOutputs>, IrrigationEngine) {
    let cfg = SystemConfig::default();
    let app = AppService::new(cfg.clone(), MockOutputs::default());
    app.store().set_ambient(25.0, 50.0, T0);
    app.store().set_forecast(&ForecastUpdate {
        current: ForecastPoint {
            temp_c: 24.0,
            humidity: 50.0,
            light: 10.0,
        },
        ahead: ForecastPoint {
            temp_c: 26.0,
            humidity: 55.0,
            light: 10.0,
        },
        rain_soon: false,
    });
    (app, IrrigationEngine::new(cfg))
}

#[test]
fn scenario_a_driest_eligible_zone_starts_nominal_run() {
    let (app, engine) = service();
    app.store().set_moisture([50.0, 80.0, 90.0]);

    let d = app.switch_cycle(&engine, T0);
    assert_eq!(
        d,
        Decision::Start {
            zone: 0,
            duration_ms: SystemConfig::default().irrigation_ms
        }
    );
    let s = app.store().snapshot();
    assert!(s.pump_on);
    assert!(s.run.active);
    assert_eq!(s.run.zone, 0);
    assert!(app.with_outputs(MockOutputs::pump));
    assert!(!app.with_outputs(MockOutputs::any_valve_on));
}

#[test]
fn scenario_b_degraded_uses_short_run() {
    let (app, engine) = service();
    app.store().set_moisture([50.0, 80.0, 90.0]);
    app.store().set_mode(OperatingMode::Degraded, T0);
    // Entering DEGRADED defers; make the decision due again.
    app.store().set_next_irrigation(T0);

    let d = app.switch_cycle(&engine, T0);
    assert_eq!(
        d,
        Decision::Start {
            zone: 0,
            duration_ms: 5 * 60 * 1000
        }
    );
}

#[test]
fn scenario_c_nothing_dry_pushes_schedule() {
    let (app, engine) = service();
    app.store().set_moisture([65.0, 65.0, 65.0]);
    app.store().set_next_irrigation(T0);

    let d = app.switch_cycle(&engine, T0);
    let period = SystemConfig::default().schedule_period_ms;
    assert_eq!(d, Decision::Defer { next_ms: T0 + period });
    let s = app.store().snapshot();
    assert_eq!(s.next_irrigation_ms, T0 + period);
    assert!(!s.pump_on);
}

#[test]
fn scenario_d_rain_holds_without_deferring() {
    let (app, engine) = service();
    app.store().set_moisture([10.0, 10.0, 10.0]);
    app.store().set_next_irrigation(T0);
    let mut fc = ForecastUpdate {
        rain_soon: true,
        ..Default::default()
    };
    fc.current.humidity = 50.0;
    app.store().set_forecast(&fc);

    assert_eq!(app.switch_cycle(&engine, T0), Decision::WeatherHold);
    assert_eq!(app.store().snapshot().next_irrigation_ms, T0);
    assert!(!app.store().snapshot().pump_on);

    fc.rain_soon = false;
    app.store().set_forecast(&fc);
    assert!(matches!(
        app.switch_cycle(&engine, T0 + 1000),
        Decision::Start { zone: 0, .. }
    ));
}

#[test]
fn scenario_e_safe_keeps_pushing_schedule() {
    let (app, engine) = service();
    let period = SystemConfig::default().schedule_period_ms;
    app.store().set_moisture([10.0, 10.0, 10.0]);

    app.store().set_mode(OperatingMode::Safe, T0);
    assert_eq!(app.store().snapshot().next_irrigation_ms, T0 + period);

    for step in 1..=3u64 {
        let now = T0 + step * 1000;
        assert_eq!(
            app.switch_cycle(&engine, now),
            Decision::SafeHold { next_ms: now + period }
        );
        assert_eq!(app.store().snapshot().next_irrigation_ms, now + period);
    }
    assert!(!app.store().snapshot().pump_on);
}

#[test]
fn humid_forecast_gate_holds_cycle() {
    let (app, engine) = service();
    app.store().set_moisture([10.0, 10.0, 10.0]);
    app.store().set_next_irrigation(T0);
    let mut fc = ForecastUpdate::default();
    fc.current.humidity = 90.0;
    app.store().set_forecast(&fc);

    assert_eq!(app.switch_cycle(&engine, T0), Decision::WeatherHold);
}

#[test]
fn running_zone_stops_when_watered() {
    let (app, engine) = service();
    app.store().set_moisture([50.0, 80.0, 90.0]);
    app.switch_cycle(&engine, T0);

    assert_eq!(app.switch_cycle(&engine, T0 + 1000), Decision::Running);
    app.store().set_moisture([72.0, 80.0, 90.0]);
    assert_eq!(
        app.switch_cycle(&engine, T0 + 2000),
        Decision::Stop {
            zone: 0,
            reason: StopReason::Watered
        }
    );
    assert!(!app.store().snapshot().pump_on);
    assert!(!app.with_outputs(MockOutputs::pump));
}

#[test]
fn running_zone_stops_after_planned_duration() {
    let (app, engine) = service();
    app.store().set_moisture([50.0, 80.0, 90.0]);
    app.switch_cycle(&engine, T0);
    let dur = SystemConfig::default().irrigation_ms;

    assert_eq!(
        app.switch_cycle(&engine, T0 + dur),
        Decision::Stop {
            zone: 0,
            reason: StopReason::Elapsed
        }
    );
}

#[test]
fn first_cycle_is_due_and_schedule_initialised() {
    let (app, engine) = service();
    app.store().set_moisture([65.0, 65.0, 65.0]);
    assert_eq!(app.store().snapshot().next_irrigation_ms, 0);

    let period = SystemConfig::default().schedule_period_ms;
    assert_eq!(
        app.switch_cycle(&engine, T0),
        Decision::Defer { next_ms: T0 + period }
    );
}
