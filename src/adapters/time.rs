//! Time adapters: the monotonic [`Clock`] every task stamps with and a
//! blocking [`DelayNs`] for sensor bursts and LCD paging.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` (µs since boot)
//!   and the FreeRTOS tick delay.
//! - **host**: `std::time::Instant` and `std::thread::sleep`.

use embedded_hal::delay::DelayNs;

use crate::app::ports::Clock;

/// Milliseconds since boot.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: read of the high-resolution timer counter.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }
}

/// Blocking delay that yields to the scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskDelay;

impl DelayNs for TaskDelay {
    #[cfg(target_os = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        // Sub-tick waits busy-wait; longer ones block the task.
        if ns < 1_000_000 {
            esp_idf_hal::delay::Ets::delay_us(ns.div_ceil(1000));
        } else {
            esp_idf_hal::delay::FreeRtos::delay_ms(ns / 1_000_000);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    #[cfg(target_os = "espidf")]
    fn delay_ms(&mut self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }
}
