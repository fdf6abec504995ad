//! Task bodies of `AppService`: sensing, forecast, health and display.

use agronode::adapters::hardware::{FeedbackHealth, RelayBank};
use agronode::app::service::{AppService, FORECAST_UNCONFIGURED_DELAY_MS, HealthService};
use agronode::config::SystemConfig;
use agronode::diagnostics::DiagnosticQueue;
use agronode::error::NetworkError;
use agronode::mode::OperatingMode;
use agronode::sensors::ambient::AMBIENT_RETRY_MS;
use agronode::sensors::moisture::SoilSampler;
use agronode::state::{ForecastPoint, ForecastUpdate};

use crate::mock_hw::{
    MemorySink, MockAmbient, MockDisplay, MockForecast, MockOutputs, MockProbe, NoDelay, NullPin,
    ScriptedHealth, StuckInput,
};

fn app() -> AppService<MockOutputs> {
    AppService::new(SystemConfig::default(), MockOutputs::default())
}

// ── Soil ──────────────────────────────────────────────────────

#[test]
fn soil_cycle_commits_mapped_readings() {
    let app = app();
    let cfg = SystemConfig::default();
    let mut sampler = SoilSampler::new(
        MockProbe::new([Some(800), Some(1600), Some(2400)]),
        cfg.soil_adc_wet,
        cfg.soil_adc_dry,
    );
    let pct = app.soil_cycle(&mut sampler, &mut NoDelay);
    assert_eq!(pct, [100.0, 50.0, 0.0]);
    assert_eq!(app.store().snapshot().soil, [100.0, 50.0, 0.0]);
}

#[test]
fn failed_zone_keeps_previous_value() {
    let app = app();
    app.store().set_moisture([40.0, 41.0, 42.0]);
    let mut sampler = SoilSampler::new(MockProbe::new([Some(800), None, Some(2400)]), 800, 2400);
    app.soil_cycle(&mut sampler, &mut NoDelay);
    assert_eq!(app.store().snapshot().soil, [100.0, 41.0, 0.0]);
}

// ── Ambient ───────────────────────────────────────────────────

#[test]
fn ambient_commit_and_stale_retry() {
    let app = app();
    let cfg = SystemConfig::default();

    let delay = app.ambient_cycle(&mut MockAmbient(Some((31.0, 35.0))), 5_000);
    assert_eq!(delay, cfg.deadline_ambient_ms);
    let s = app.store().snapshot();
    assert_eq!((s.air_temp_c, s.air_humidity, s.ambient_updated_ms), (31.0, 35.0, 5_000));

    let delay = app.ambient_cycle(&mut MockAmbient(None), 7_000);
    assert_eq!(delay, AMBIENT_RETRY_MS);
    assert_eq!(app.store().snapshot().ambient_updated_ms, 5_000);

    app.ambient_cycle(&mut MockAmbient(Some((f32::NAN, 40.0))), 9_000);
    assert_eq!(app.store().snapshot().air_temp_c, 31.0);
}

// ── Forecast ──────────────────────────────────────────────────

fn update() -> ForecastUpdate {
    ForecastUpdate {
        current: ForecastPoint {
            temp_c: 30.0,
            humidity: 70.0,
            light: 5.0,
        },
        ahead: ForecastPoint {
            temp_c: 33.0,
            humidity: 30.0,
            light: 9.0,
        },
        rain_soon: true,
    }
}

#[test]
fn forecast_unconfigured_backs_off_an_hour() {
    let app = app();
    let mut port = MockForecast {
        configured: false,
        result: Ok(update()),
        fetches: 0,
    };
    assert_eq!(app.forecast_cycle(&mut port), FORECAST_UNCONFIGURED_DELAY_MS);
    assert_eq!(port.fetches, 0);
    assert_eq!(app.store().snapshot().forecast, ForecastPoint::default());
}

#[test]
fn forecast_commits_all_fields_together() {
    let app = app();
    let mut port = MockForecast {
        configured: true,
        result: Ok(update()),
        fetches: 0,
    };
    assert_eq!(
        app.forecast_cycle(&mut port),
        SystemConfig::default().deadline_forecast_ms
    );
    let s = app.store().snapshot();
    assert_eq!(s.forecast, update().current);
    assert_eq!(s.forecast_ahead, update().ahead);
    assert!(s.rain_soon);
}

#[test]
fn forecast_failure_keeps_previous() {
    let app = app();
    app.store().set_forecast(&update());
    let mut port = MockForecast {
        configured: true,
        result: Err(NetworkError::Status(401)),
        fetches: 0,
    };
    app.forecast_cycle(&mut port);
    assert_eq!(port.fetches, 1);
    assert_eq!(app.store().snapshot().forecast, update().current);
}

// ── Health ────────────────────────────────────────────────────

#[test]
fn confirmed_pump_fault_enters_safe_and_forces_relay_off() {
    let app = app();
    let diag = DiagnosticQueue::new();
    let cfg = SystemConfig::default();
    let mut health = HealthService::new(
        &cfg,
        ScriptedHealth::new(&[false, false]),
        ScriptedHealth::healthy(),
    );
    app.store().set_pump(true, 0);
    app.store().set_ambient(25.0, 50.0, 1_000);

    assert_eq!(app.health_cycle(&mut health, &diag, 1_000), OperatingMode::Normal);
    // Commanded on, but the relay follows health.
    assert!(app.store().snapshot().pump_on);
    assert!(!app.with_outputs(MockOutputs::pump));

    assert_eq!(app.health_cycle(&mut health, &diag, 2_000), OperatingMode::Safe);
    let s = app.store().snapshot();
    assert_eq!(s.mode, OperatingMode::Safe);
    assert_eq!(s.next_irrigation_ms, 2_000 + cfg.schedule_period_ms);

    let mut sink = MemorySink::default();
    diag.drain(&mut sink);
    assert!(sink.lines.iter().any(|l| l.contains("SAFE")));
}

#[test]
fn pump_recovers_without_new_command() {
    let app = app();
    let diag = DiagnosticQueue::new();
    let mut health = HealthService::new(
        &SystemConfig::default(),
        ScriptedHealth::new(&[false, true]),
        ScriptedHealth::healthy(),
    );
    app.store().set_pump(true, 0);
    app.store().set_ambient(25.0, 50.0, 1_000);

    app.health_cycle(&mut health, &diag, 1_000);
    assert!(!app.with_outputs(MockOutputs::pump));
    app.health_cycle(&mut health, &diag, 2_000);
    assert!(app.with_outputs(MockOutputs::pump));
}

#[test]
fn stuck_pump_feedback_enters_safe_and_holds_relay_off() {
    let cfg = SystemConfig::default();
    let bank = RelayBank::new(NullPin, [NullPin, NullPin, NullPin], NullPin);
    let pump_level = bank.pump_level();
    let lamp_level = bank.lamp_level();
    let app = AppService::new(cfg.clone(), bank);
    let diag = DiagnosticQueue::new();
    let mut health = HealthService::new(
        &cfg,
        FeedbackHealth::new("pump", Some(StuckInput(false)), pump_level),
        FeedbackHealth::new("lamp", None::<StuckInput>, lamp_level),
    );

    app.store().start_run(0, 0, cfg.irrigation_ms);
    app.apply_outputs();
    assert!(app.with_outputs(RelayBank::pump_on));

    let mut modes = Vec::new();
    let mut relay = Vec::new();
    for k in 1..=6u64 {
        let now = k * 5_000;
        app.store().set_ambient(25.0, 50.0, now);
        modes.push(app.health_cycle(&mut health, &diag, now));
        relay.push(app.with_outputs(RelayBank::pump_on));
    }

    use OperatingMode::{Normal, Safe};
    assert_eq!(modes, [Normal, Normal, Safe, Safe, Safe, Safe]);
    // One retry before confirmation, then held off.
    assert_eq!(relay, [false, true, false, false, false, false]);
    assert_eq!(app.store().snapshot().mode, Safe);
}

#[test]
fn pump_fault_clears_once_command_drops() {
    let cfg = SystemConfig::default();
    let bank = RelayBank::new(NullPin, [NullPin, NullPin, NullPin], NullPin);
    let pump_level = bank.pump_level();
    let lamp_level = bank.lamp_level();
    let app = AppService::new(cfg.clone(), bank);
    let diag = DiagnosticQueue::new();
    let mut health = HealthService::new(
        &cfg,
        FeedbackHealth::new("pump", Some(StuckInput(false)), pump_level),
        FeedbackHealth::new("lamp", None::<StuckInput>, lamp_level),
    );

    app.store().start_run(0, 0, cfg.irrigation_ms);
    app.apply_outputs();
    for now in [5_000, 10_000, 15_000] {
        app.store().set_ambient(25.0, 50.0, now);
        app.health_cycle(&mut health, &diag, now);
    }
    assert_eq!(app.store().snapshot().mode, OperatingMode::Safe);

    // Run ends: relay off and feedback low agree again.
    app.store().stop_run();
    app.store().set_ambient(25.0, 50.0, 20_000);
    assert_eq!(app.health_cycle(&mut health, &diag, 20_000), OperatingMode::Normal);
    assert!(app.store().snapshot().pump_healthy);
}

#[test]
fn lamp_fault_degrades_and_clears() {
    let app = app();
    let diag = DiagnosticQueue::new();
    let cfg = SystemConfig::default();
    let mut health = HealthService::new(
        &cfg,
        ScriptedHealth::healthy(),
        ScriptedHealth::new(&[false, true]),
    );
    app.store().set_ambient(25.0, 50.0, 1_000);

    assert_eq!(app.health_cycle(&mut health, &diag, 1_000), OperatingMode::Degraded);
    assert_eq!(
        app.store().snapshot().next_irrigation_ms,
        1_000 + cfg.degraded_defer_ms
    );
    assert_eq!(app.health_cycle(&mut health, &diag, 2_000), OperatingMode::Normal);
    assert!(app.store().snapshot().lamp_healthy);
}

#[test]
fn stale_ambient_degrades() {
    let app = app();
    let diag = DiagnosticQueue::new();
    let cfg = SystemConfig::default();
    let mut health = HealthService::new(&cfg, ScriptedHealth::healthy(), ScriptedHealth::healthy());
    app.store().set_ambient(25.0, 50.0, 1_000);

    let late = 1_000 + u64::from(cfg.ambient_stale_after_ms) + 1;
    assert_eq!(app.health_cycle(&mut health, &diag, late), OperatingMode::Degraded);
}

// ── Display ───────────────────────────────────────────────────

#[test]
fn display_gets_current_snapshot() {
    let app = app();
    app.store().set_moisture([1.0, 2.0, 3.0]);
    let mut display = MockDisplay::default();
    app.display_cycle(&mut display);
    assert_eq!(display.frames.len(), 1);
    assert_eq!(display.frames[0].soil, [1.0, 2.0, 3.0]);
}
