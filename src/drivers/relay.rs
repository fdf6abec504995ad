//! Relay channel driver (active-HIGH relay board).
//!
//! Wraps any `embedded-hal` output pin.  The last level successfully
//! driven is published through a shared flag so a feedback check can
//! compare the physical line against what was commanded.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::error::ActuatorError;

pub struct Relay<P> {
    name: &'static str,
    pin: P,
    driven: Arc<AtomicBool>,
}

impl<P: OutputPin> Relay<P> {
    pub fn new(name: &'static str, pin: P) -> Self {
        Self {
            name,
            pin,
            driven: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let res = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if res.is_err() {
            warn!("relay {}: GPIO write failed", self.name);
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.driven.store(on, Ordering::Release);
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.driven.load(Ordering::Acquire)
    }

    /// Shared view of the driven level.
    pub fn level(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.driven)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
