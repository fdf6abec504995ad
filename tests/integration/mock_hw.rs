//! Mock adapters for integration tests.
//!
//! Record every call so tests can assert on the full command history
//! without touching real GPIO, ADC or network stacks.

use std::cell::Cell;
use std::collections::VecDeque;

use agronode::app::ports::{
    ActuatorHealth, AmbientPort, Clock, DiagnosticSink, DisplayPort, ForecastPort, OutputPort,
    SinkError, SoilProbe, TelemetryTransport,
};
use agronode::error::{NetworkError, SensorError};
use agronode::state::{ForecastUpdate, StateSnapshot};
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

// ── Outputs ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCall {
    Pump(bool),
    Valve(usize, bool),
    Lamp(bool),
}

#[derive(Debug, Default)]
pub struct MockOutputs {
    pub calls: Vec<OutputCall>,
}

#[allow(dead_code)]
impl MockOutputs {
    pub fn pump(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                OutputCall::Pump(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn lamp(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                OutputCall::Lamp(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn any_valve_on(&self) -> bool {
        self.calls
            .iter()
            .any(|c| matches!(c, OutputCall::Valve(_, true)))
    }
}

impl OutputPort for MockOutputs {
    fn set_pump(&mut self, on: bool) {
        self.calls.push(OutputCall::Pump(on));
    }

    fn set_valve(&mut self, zone: usize, on: bool) {
        self.calls.push(OutputCall::Valve(zone, on));
    }

    fn set_lamp(&mut self, on: bool) {
        self.calls.push(OutputCall::Lamp(on));
    }
}

// ── Actuator health ───────────────────────────────────────────

/// Replays scripted results, then repeats the last one.
pub struct ScriptedHealth {
    script: VecDeque<bool>,
    last: bool,
}

#[allow(dead_code)]
impl ScriptedHealth {
    pub fn healthy() -> Self {
        Self::new(&[])
    }

    pub fn new(script: &[bool]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            last: true,
        }
    }
}

impl ActuatorHealth for ScriptedHealth {
    fn check(&mut self) -> bool {
        if let Some(v) = self.script.pop_front() {
            self.last = v;
        }
        self.last
    }
}

// ── Pins ──────────────────────────────────────────────────────

/// Output pin that always accepts writes.
#[derive(Debug, Default)]
pub struct NullPin;

impl ErrorType for NullPin {
    type Error = Infallible;
}

impl OutputPin for NullPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Feedback line stuck at one level.
#[derive(Debug)]
pub struct StuckInput(pub bool);

impl ErrorType for StuckInput {
    type Error = Infallible;
}

impl InputPin for StuckInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0)
    }
}

// ── Sensors ───────────────────────────────────────────────────

/// Fixed raw reading per zone; `None` fails the read.
pub struct MockProbe {
    pub raw: [Option<u16>; 3],
}

impl MockProbe {
    pub fn new(raw: [Option<u16>; 3]) -> Self {
        Self { raw }
    }
}

impl SoilProbe for MockProbe {
    fn read_raw(&mut self, zone: usize) -> Result<u16, SensorError> {
        self.raw
            .get(zone)
            .copied()
            .flatten()
            .ok_or(SensorError::AdcReadFailed)
    }
}

pub struct MockAmbient(pub Option<(f32, f32)>);

impl AmbientPort for MockAmbient {
    fn read(&mut self) -> Option<(f32, f32)> {
        self.0
    }
}

pub struct MockForecast {
    pub configured: bool,
    pub result: Result<ForecastUpdate, NetworkError>,
    pub fetches: usize,
}

impl ForecastPort for MockForecast {
    fn configured(&self) -> bool {
        self.configured
    }

    fn fetch(&mut self, _previous: &ForecastUpdate) -> Result<ForecastUpdate, NetworkError> {
        self.fetches += 1;
        self.result
    }
}

// ── Network ───────────────────────────────────────────────────

/// Telemetry transport with a scripted link and response queue.
/// An empty queue answers 200.
#[derive(Default)]
pub struct MockTransport {
    pub down: bool,
    pub responses: VecDeque<Result<u16, NetworkError>>,
    pub posts: Vec<(String, String, Vec<u8>)>,
}

impl TelemetryTransport for MockTransport {
    fn link_up(&self) -> bool {
        !self.down
    }

    fn post(&mut self, url: &str, api_key: &str, body: &[u8]) -> Result<u16, NetworkError> {
        self.posts
            .push((url.to_string(), api_key.to_string(), body.to_vec()));
        self.responses.pop_front().unwrap_or(Ok(200))
    }
}

// ── Display / diagnostics ─────────────────────────────────────

#[derive(Default)]
pub struct MockDisplay {
    pub frames: Vec<StateSnapshot>,
}

impl DisplayPort for MockDisplay {
    fn render(&mut self, snapshot: &StateSnapshot) {
        self.frames.push(*snapshot);
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub lines: Vec<String>,
}

impl DiagnosticSink for MemorySink {
    fn append(&mut self, record: &str) -> Result<(), SinkError> {
        self.lines.push(record.to_string());
        Ok(())
    }
}

// ── Time ──────────────────────────────────────────────────────

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Manually advanced clock.
#[derive(Default)]
pub struct ManualClock(pub Cell<u64>);

#[allow(dead_code)]
impl ManualClock {
    pub fn at(ms: u64) -> Self {
        Self(Cell::new(ms))
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}
