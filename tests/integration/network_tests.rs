//! Telemetry admission and retry accounting against a mock transport.

use agronode::config::{SystemConfig, TelemetryEndpoint};
use agronode::error::NetworkError;
use agronode::network::{TelemetryController, TickOutcome, TELEMETRY_PATH};
use agronode::state::StateStore;

use crate::mock_hw::MockTransport;

fn endpoint() -> Option<TelemetryEndpoint> {
    TelemetryEndpoint::from_parts(Some("https://collector.example"), Some("k3y"))
}

#[test]
fn posts_snapshot_with_key_headers() {
    let store = StateStore::default();
    store.set_moisture([11.0, 22.0, 33.0]);
    let mut ctl = TelemetryController::new(&SystemConfig::default(), endpoint());
    let mut tx = MockTransport::default();

    assert_eq!(ctl.tick(5_000, &store, &mut tx), TickOutcome::Sent);
    let (url, key, body) = &tx.posts[0];
    assert_eq!(url, &format!("https://collector.example{TELEMETRY_PATH}"));
    assert_eq!(key, "k3y");
    let body = std::str::from_utf8(body).unwrap();
    assert!(body.contains("\"valves\":[]"));
    assert_eq!(ctl.last_send_ms(), Some(5_000));
}

#[test]
fn link_down_changes_nothing() {
    let store = StateStore::default();
    let mut ctl = TelemetryController::new(&SystemConfig::default(), endpoint());
    let mut tx = MockTransport {
        down: true,
        ..Default::default()
    };
    assert_eq!(ctl.tick(5_000, &store, &mut tx), TickOutcome::LinkDown);
    assert!(tx.posts.is_empty());
    assert_eq!(ctl.last_send_ms(), None);
}

#[test]
fn min_interval_throttles() {
    let store = StateStore::default();
    let cfg = SystemConfig::default();
    let gap = u64::from(cfg.network_min_interval_ms);
    let mut ctl = TelemetryController::new(&cfg, endpoint());
    let mut tx = MockTransport::default();

    assert!(ctl.tick(10_000, &store, &mut tx).transmitted());
    assert_eq!(ctl.tick(10_000 + gap - 1, &store, &mut tx), TickOutcome::Throttled);
    assert!(ctl.tick(10_000 + gap, &store, &mut tx).transmitted());
    assert_eq!(tx.posts.len(), 2);
}

#[test]
fn failures_count_and_saturate_then_reset_on_200() {
    let store = StateStore::default();
    let cfg = SystemConfig::default();
    let gap = u64::from(cfg.network_min_interval_ms);
    let mut ctl = TelemetryController::new(&cfg, endpoint());
    let mut tx = MockTransport::default();
    tx.responses.extend([
        Ok(500),
        Err(NetworkError::IoFailed),
        Ok(404),
        Ok(503),
        Ok(200),
    ]);

    let mut now = 0;
    for expected in [1u8, 2, 3, 3] {
        now += gap;
        match ctl.tick(now, &store, &mut tx) {
            TickOutcome::Failed { failures, .. } => assert_eq!(failures, expected),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(ctl.failures(), cfg.network_max_retries);

    now += gap;
    assert_eq!(ctl.tick(now, &store, &mut tx), TickOutcome::Sent);
    assert_eq!(ctl.failures(), 0);
}

#[test]
fn status_recorded_on_http_failure() {
    let store = StateStore::default();
    let mut ctl = TelemetryController::new(&SystemConfig::default(), endpoint());
    let mut tx = MockTransport::default();
    tx.responses.push_back(Ok(401));
    assert_eq!(
        ctl.tick(1_000, &store, &mut tx),
        TickOutcome::Failed {
            status: Some(401),
            failures: 1
        }
    );
}

#[test]
fn unconfigured_counts_as_success_without_posting() {
    let store = StateStore::default();
    let mut ctl = TelemetryController::new(&SystemConfig::default(), None);
    let mut tx = MockTransport::default();

    assert!(!ctl.is_configured());
    assert_eq!(ctl.tick(2_000, &store, &mut tx), TickOutcome::Unconfigured);
    assert!(tx.posts.is_empty());
    assert_eq!(ctl.last_send_ms(), Some(2_000));
}
