//! StateStore under concurrent writers and readers.

use std::sync::Arc;
use std::thread;

use agronode::mode::{ModePolicy, OperatingMode};
use agronode::state::{ForecastPoint, ForecastUpdate, StateStore};

#[test]
fn snapshots_never_see_torn_forecast() {
    let store = Arc::new(StateStore::default());

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..2_000u32 {
                let v = i as f32;
                store.set_forecast(&ForecastUpdate {
                    current: ForecastPoint {
                        temp_c: v,
                        humidity: v,
                        light: v,
                    },
                    ahead: ForecastPoint {
                        temp_c: v,
                        humidity: v,
                        light: v,
                    },
                    rain_soon: i % 2 == 1,
                });
            }
        })
    };

    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..2_000 {
                let s = store.snapshot();
                let v = s.forecast.temp_c;
                assert_eq!(s.forecast.humidity, v);
                assert_eq!(s.forecast_ahead.light, v);
                assert_eq!(s.rain_soon, (v as u32) % 2 == 1);
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
}

#[test]
fn run_start_and_pump_are_one_write() {
    let store = Arc::new(StateStore::default());
    let toggler = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..1_000u64 {
                store.start_run((i % 3) as u8, i, 100);
                store.stop_run();
            }
        })
    };
    for _ in 0..1_000 {
        let s = store.snapshot();
        assert_eq!(s.run.active, s.pump_on);
    }
    toggler.join().unwrap();
}

#[test]
fn concurrent_moisture_writes_stay_in_range() {
    let store = Arc::new(StateStore::default());
    let handles: Vec<_> = (0..4)
        .map(|k| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..500 {
                    let v = (i * k) as f32 - 200.0;
                    store.set_moisture([v, v * 2.0, v * 3.0]);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    for v in store.snapshot().soil {
        assert!((0.0..=100.0).contains(&v));
    }
}

#[test]
fn mode_effect_applies_once() {
    let policy = ModePolicy {
        schedule_period_ms: 1_000,
        degraded_defer_ms: 100,
    };
    let store = StateStore::new(policy);
    assert!(store.set_mode(OperatingMode::Degraded, 50).is_some());
    assert_eq!(store.snapshot().next_irrigation_ms, 150);

    store.set_next_irrigation(7);
    assert!(store.set_mode(OperatingMode::Degraded, 60).is_none());
    assert_eq!(store.snapshot().next_irrigation_ms, 7);

    let t = store.set_mode(OperatingMode::Normal, 70).unwrap();
    assert_eq!(t.next_irrigation_ms, None);
    assert_eq!(store.snapshot().next_irrigation_ms, 7);
}

#[test]
fn expiry_fires_exactly_once() {
    let store = StateStore::default();
    store.set_pump(true, 500);
    assert!(!store.expire_if_due(499));
    assert!(store.expire_if_due(500));
    assert!(!store.expire_if_due(600));
    assert!(!store.snapshot().pump_on);
}
