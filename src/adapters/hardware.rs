//! Hardware adapter: bridges the relay board, feedback lines, soil probes
//! and ambient sensor to the domain port traits.
//!
//! Generic over `embedded-hal` pins so the same code drives the ESP32
//! GPIOs (via [`hw_init`](crate::drivers::hw_init)) and test doubles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::digital::{InputPin, OutputPin};
use log::{info, warn};

use crate::app::ports::{ActuatorHealth, AmbientPort, OutputPort, SoilProbe};
use crate::drivers::hw_init;
use crate::drivers::relay::Relay;
use crate::error::SensorError;
use crate::pins;
use crate::state::ZONE_COUNT;

// ── Relay outputs ─────────────────────────────────────────────

pub struct RelayBank<P> {
    pump: Relay<P>,
    valves: [Relay<P>; ZONE_COUNT],
    lamp: Relay<P>,
}

impl<P: OutputPin> RelayBank<P> {
    pub fn new(pump: P, valves: [P; ZONE_COUNT], lamp: P) -> Self {
        let [v1, v2, v3] = valves;
        Self {
            pump: Relay::new("pump", pump),
            valves: [
                Relay::new("valve1", v1),
                Relay::new("valve2", v2),
                Relay::new("valve3", v3),
            ],
            lamp: Relay::new("lamp", lamp),
        }
    }

    /// Driven pump level, for the pump feedback check.
    pub fn pump_level(&self) -> Arc<AtomicBool> {
        self.pump.level()
    }

    /// Driven lamp level, for the lamp feedback check.
    pub fn lamp_level(&self) -> Arc<AtomicBool> {
        self.lamp.level()
    }

    pub fn pump_on(&self) -> bool {
        self.pump.is_on()
    }

    pub fn lamp_on(&self) -> bool {
        self.lamp.is_on()
    }

    pub fn valve_on(&self, zone: usize) -> bool {
        self.valves.get(zone).is_some_and(Relay::is_on)
    }
}

fn drive<P: OutputPin>(relay: &mut Relay<P>, on: bool) {
    if relay.is_on() == on {
        // Re-drive anyway; the level may have been disturbed.
        let _ = relay.set(on);
        return;
    }
    if relay.set(on).is_ok() {
        info!("relay {}: {}", relay.name(), if on { "ON" } else { "OFF" });
    }
}

impl<P: OutputPin> OutputPort for RelayBank<P> {
    fn set_pump(&mut self, on: bool) {
        drive(&mut self.pump, on);
    }

    fn set_valve(&mut self, zone: usize, on: bool) {
        if let Some(v) = self.valves.get_mut(zone) {
            drive(v, on);
        }
    }

    fn set_lamp(&mut self, on: bool) {
        drive(&mut self.lamp, on);
    }
}

impl RelayBank<hw_init::GpioOutput> {
    /// The board's relay pins, as configured by `init_peripherals`.
    pub fn board() -> Self {
        let [v1, v2, v3] = pins::RELAY_VALVE_GPIOS;
        Self::new(
            hw_init::GpioOutput::new(pins::RELAY_PUMP_GPIO),
            [
                hw_init::GpioOutput::new(v1),
                hw_init::GpioOutput::new(v2),
                hw_init::GpioOutput::new(v3),
            ],
            hw_init::GpioOutput::new(pins::RELAY_LAMP_GPIO),
        )
    }
}

// ── Actuator feedback ─────────────────────────────────────────

/// Compares a feedback input with the level its relay was driven to.
/// With no feedback line wired the actuator is always reported healthy.
pub struct FeedbackHealth<I> {
    name: &'static str,
    input: Option<I>,
    expected: Arc<AtomicBool>,
}

impl<I: InputPin> FeedbackHealth<I> {
    pub fn new(name: &'static str, input: Option<I>, expected: Arc<AtomicBool>) -> Self {
        Self {
            name,
            input,
            expected,
        }
    }
}

impl<I: InputPin> ActuatorHealth for FeedbackHealth<I> {
    fn check(&mut self) -> bool {
        let Some(input) = self.input.as_mut() else {
            return true;
        };
        let expected = self.expected.load(Ordering::Acquire);
        match input.is_high() {
            Ok(level) if level == expected => true,
            Ok(level) => {
                warn!(
                    "{} feedback mismatch: driven={} sensed={}",
                    self.name,
                    u8::from(expected),
                    u8::from(level)
                );
                false
            }
            Err(_) => {
                warn!("{} feedback read failed", self.name);
                false
            }
        }
    }
}

impl FeedbackHealth<hw_init::GpioInput> {
    pub fn board(name: &'static str, gpio: Option<i32>, expected: Arc<AtomicBool>) -> Self {
        Self::new(name, gpio.map(hw_init::GpioInput::new), expected)
    }
}

// ── Soil probes ───────────────────────────────────────────────

/// ADC1 oneshot reads of the three probe channels.
#[derive(Debug, Default)]
pub struct AdcSoilProbe;

impl SoilProbe for AdcSoilProbe {
    fn read_raw(&mut self, zone: usize) -> Result<u16, SensorError> {
        let ch = *pins::SOIL_ADC1_CHANNELS
            .get(zone)
            .ok_or(SensorError::AdcReadFailed)?;
        hw_init::adc1_read(ch)
    }
}

// ── Simulated ambient sensor ──────────────────────────────────

/// Ambient sensor backed by shared atomics.  `fail` makes reads return
/// nothing, like an unplugged DHT.
#[derive(Debug, Clone)]
pub struct SimAmbient {
    temp_bits: Arc<AtomicU32>,
    hum_bits: Arc<AtomicU32>,
    fail: Arc<AtomicBool>,
}

impl SimAmbient {
    pub fn new(temp_c: f32, humidity: f32) -> Self {
        Self {
            temp_bits: Arc::new(AtomicU32::new(temp_c.to_bits())),
            hum_bits: Arc::new(AtomicU32::new(humidity.to_bits())),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set(&self, temp_c: f32, humidity: f32) {
        self.temp_bits.store(temp_c.to_bits(), Ordering::Relaxed);
        self.hum_bits.store(humidity.to_bits(), Ordering::Relaxed);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

impl AmbientPort for SimAmbient {
    fn read(&mut self) -> Option<(f32, f32)> {
        if self.fail.load(Ordering::Relaxed) {
            return None;
        }
        Some((
            f32::from_bits(self.temp_bits.load(Ordering::Relaxed)),
            f32::from_bits(self.hum_bits.load(Ordering::Relaxed)),
        ))
    }
}
