//! Status documents: the JSON served to the web UI and posted as
//! telemetry, plus the two LCD pages.
//!
//! Every document is built from a single snapshot, so the fields in one
//! document always belong together.

use core::fmt::Write as _;

use serde::Serialize;

use crate::error::NetworkError;
use crate::mode::OperatingMode;
use crate::state::{StateSnapshot, StateStore, ZONE_COUNT};

/// Wire shape of `/api/status` and of the telemetry body.
///
/// Field names are the ones the web UI reads.  `nextIrrigationMs` carries
/// **seconds** since boot despite its name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDoc {
    pub air_temp: f32,
    pub air_hum: f32,
    pub soil: [f32; ZONE_COUNT],
    pub pump_on: u8,
    pub lamp_on: u8,
    pub forecast_temp: f32,
    pub forecast_hum: f32,
    #[serde(rename = "forecast3Temp")]
    pub forecast3_temp: f32,
    #[serde(rename = "forecast3Hum")]
    pub forecast3_hum: f32,
    pub forecast_light: f32,
    pub rain_soon: u8,
    pub next_irrigation_ms: u64,
    /// 0 = NORMAL, 1 = DEGRADED, 2 = SAFE.
    pub mode: u8,
    /// Index into `soil` of the zone being watered, or -1.
    pub active_zone: i8,
    /// Operator has taken manual control from the web UI.
    pub manual: u8,
    /// Present only on telemetry posts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valves: Option<&'static [u8]>,
}

pub const fn mode_code(mode: OperatingMode) -> u8 {
    match mode {
        OperatingMode::Normal => 0,
        OperatingMode::Degraded => 1,
        OperatingMode::Safe => 2,
    }
}

impl StatusDoc {
    pub fn from_snapshot(s: &StateSnapshot) -> Self {
        Self {
            air_temp: s.air_temp_c,
            air_hum: s.air_humidity,
            soil: s.soil,
            pump_on: u8::from(s.pump_on),
            lamp_on: u8::from(s.lamp_on),
            forecast_temp: s.forecast.temp_c,
            forecast_hum: s.forecast.humidity,
            forecast3_temp: s.forecast_ahead.temp_c,
            forecast3_hum: s.forecast_ahead.humidity,
            forecast_light: s.forecast.light,
            rain_soon: u8::from(s.rain_soon),
            next_irrigation_ms: s.next_irrigation_ms / 1000,
            mode: mode_code(s.mode),
            active_zone: if s.run.active { s.run.zone as i8 } else { -1 },
            manual: u8::from(s.manual),
            valves: None,
        }
    }
}

/// `/api/status` body.  Retracts an expired manual pump command first.
pub fn status_json(store: &StateStore, now_ms: u64) -> Result<String, NetworkError> {
    if store.expire_if_due(now_ms) {
        log::info!("Control: manual pump command expired");
    }
    let doc = StatusDoc::from_snapshot(&store.snapshot());
    serde_json::to_string(&doc).map_err(|_| NetworkError::Encode)
}

/// Telemetry body: the status document plus an empty `valves` array.
pub fn telemetry_payload(s: &StateSnapshot) -> Result<Vec<u8>, NetworkError> {
    let mut doc = StatusDoc::from_snapshot(s);
    doc.valves = Some(&[]);
    serde_json::to_vec(&doc).map_err(|_| NetworkError::Encode)
}

// ── LCD pages ──────────────────────────────────────────────────

pub const LCD_COLS: usize = 20;
pub const LCD_ROWS: usize = 4;

pub type LcdLine = heapless::String<LCD_COLS>;
pub type LcdPage = [LcdLine; LCD_ROWS];

fn line(args: core::fmt::Arguments<'_>) -> LcdLine {
    let mut wide = heapless::String::<64>::new();
    let _ = wide.write_fmt(args);
    let mut out = LcdLine::new();
    for c in wide.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

fn on_off(v: bool) -> &'static str {
    if v { "ON" } else { "OFF" }
}

/// Page 1: air, look-ahead forecast, light, pump/lamp.
/// Page 2: soil per zone, active zone (by its `S<n>` label), next decision (s).
pub fn display_pages(s: &StateSnapshot) -> [LcdPage; 2] {
    let mut zone = heapless::String::<4>::new();
    if s.run.active {
        let _ = write!(zone, "S{}", u16::from(s.run.zone) + 1);
    } else {
        let _ = zone.push('-');
    }
    [
        [
            line(format_args!("T:{:.1}C H:{:.0}%", s.air_temp_c, s.air_humidity)),
            line(format_args!(
                "+3h T:{:.1}C H:{:.0}%",
                s.forecast_ahead.temp_c, s.forecast_ahead.humidity
            )),
            line(format_args!("L:{:.0} {}", s.forecast.light, s.mode)),
            line(format_args!("Pump:{} LED:{}", on_off(s.pump_on), on_off(s.lamp_on))),
        ],
        [
            line(format_args!("S1:{:.0}%   Zone:{}", s.soil[0], zone)),
            line(format_args!("S2:{:.0}%", s.soil[1])),
            line(format_args!("S3:{:.0}%", s.soil[2])),
            line(format_args!("Next:{}s", s.next_irrigation_ms / 1000)),
        ],
    ]
}
