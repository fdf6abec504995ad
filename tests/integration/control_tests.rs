//! Control and status boundary through `AppService`.

use agronode::app::service::AppService;
use agronode::config::SystemConfig;
use agronode::error::CommandError;

use crate::mock_hw::MockOutputs;

fn app() -> AppService<MockOutputs> {
    AppService::new(SystemConfig::default(), MockOutputs::default())
}

#[test]
fn manual_pump_runs_until_expiry() {
    let app = app();
    app.handle_control(br#"{"pump":1,"durationPump":10,"mode":"manual"}"#, 1_000)
        .unwrap();
    let s = app.store().snapshot();
    assert!(s.pump_on);
    assert!(s.manual);
    assert_eq!(s.pump_expiry_ms, 11_000);
    assert!(app.with_outputs(MockOutputs::pump));

    let body = app.status_json(10_999).unwrap();
    assert!(body.contains("\"pumpOn\":1"));

    let body = app.status_json(11_000).unwrap();
    assert!(body.contains("\"pumpOn\":0"));
    assert!(!app.store().snapshot().pump_on);
    // Relay follows the expired command.
    assert!(!app.with_outputs(MockOutputs::pump));
}

#[test]
fn lamp_command_drives_relay() {
    let app = app();
    app.handle_control(br#"{"light":1}"#, 0).unwrap();
    assert!(app.store().snapshot().lamp_on);
    assert!(app.with_outputs(MockOutputs::lamp));

    app.handle_control(br#"{"light":0}"#, 0).unwrap();
    assert!(!app.with_outputs(MockOutputs::lamp));
}

#[test]
fn rejected_request_changes_nothing() {
    let app = app();
    app.handle_control(br#"{"light":1}"#, 0).unwrap();
    let before = app.store().snapshot();
    let calls = app.with_outputs(|o| o.calls.len());

    for body in [
        &b"not json"[..],
        br#"{"pump":2}"#,
        br#"{"pump":1,"durationPump":-5}"#,
        br#"{"mode":"turbo"}"#,
        br#"[1,2]"#,
        b"",
    ] {
        assert!(app.handle_control(body, 100).is_err());
    }
    assert_eq!(app.store().snapshot(), before);
    assert_eq!(app.with_outputs(|o| o.calls.len()), calls);
}

#[test]
fn error_kinds() {
    let app = app();
    assert_eq!(app.handle_control(b"{", 0), Err(CommandError::InvalidJson));
    assert_eq!(
        app.handle_control(br#"{"durationPump":999999999}"#, 0),
        Err(CommandError::InvalidDuration)
    );
}

#[test]
fn auto_mode_clears_manual() {
    let app = app();
    app.handle_control(br#"{"manual":1}"#, 0).unwrap();
    assert!(app.store().snapshot().manual);
    app.handle_control(br#"{"mode":"auto"}"#, 0).unwrap();
    assert!(!app.store().snapshot().manual);
}

#[test]
fn status_document_fields() {
    let app = app();
    app.store().set_moisture([12.0, 34.0, 56.0]);
    app.store().set_next_irrigation(42_000);
    let body = app.status_json(0).unwrap();
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["nextIrrigationMs"], 42);
    assert_eq!(v["mode"], 0);
    assert_eq!(v["manual"], 0);

    app.handle_control(br#"{"mode":"manual"}"#, 0).unwrap();
    let v: serde_json::Value = serde_json::from_str(&app.status_json(0).unwrap()).unwrap();
    assert_eq!(v["manual"], 1);
}
