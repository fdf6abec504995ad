//! DHT11 temperature / humidity sensor (single-wire, open drain).
//!
//! Frame: 40 bits, MSB first, as five bytes
//! `[hum_int, hum_dec, temp_int, temp_dec, checksum]`.  A bit is a ~50 µs
//! low followed by a high pulse of ~27 µs (`0`) or ~70 µs (`1`).
//!
//! The pulse decoding is pure and host-tested; only the bit-banging is
//! device specific.

/// High pulses longer than this decode as `1` (µs).
pub const ONE_THRESHOLD_US: u32 = 40;

/// Turn the 40 measured high-pulse widths into the five frame bytes.
pub fn bits_to_frame(high_us: &[u32; 40]) -> [u8; 5] {
    let mut frame = [0u8; 5];
    for (i, &w) in high_us.iter().enumerate() {
        if w > ONE_THRESHOLD_US {
            frame[i / 8] |= 0x80 >> (i % 8);
        }
    }
    frame
}

/// Validate the checksum and decode `(temp_c, humidity)`.
pub fn decode(frame: [u8; 5]) -> Option<(f32, f32)> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return None;
    }
    let humidity = f32::from(frame[0]) + f32::from(frame[1]) * 0.1;
    let mut temp = f32::from(frame[2]) + f32::from(frame[3] & 0x7f) * 0.1;
    if frame[3] & 0x80 != 0 {
        temp = -temp;
    }
    if humidity > 100.0 {
        return None;
    }
    Some((temp, humidity))
}

#[cfg(target_os = "espidf")]
pub use device::Dht11;

#[cfg(target_os = "espidf")]
mod device {
    use esp_idf_svc::sys::*;
    use log::debug;

    use crate::app::ports::AmbientPort;

    /// Start signal: host holds the line low this long (µs).
    const START_LOW_US: u32 = 20_000;
    const EDGE_TIMEOUT_US: i64 = 200;

    pub struct Dht11 {
        pin: i32,
    }

    impl Dht11 {
        pub fn new(pin: i32) -> Self {
            // SAFETY: pin is reserved for the sensor; open-drain with pull-up.
            unsafe {
                gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD);
                gpio_set_pull_mode(pin, gpio_pull_mode_t_GPIO_PULLUP_ONLY);
                gpio_set_level(pin, 1);
            }
            Self { pin }
        }

        /// Busy-wait while the line sits at `level`.  Returns the time spent.
        fn wait_while(&self, level: i32) -> Option<u32> {
            // SAFETY: timer and GPIO reads are register accesses.
            unsafe {
                let start = esp_timer_get_time();
                while gpio_get_level(self.pin) == level {
                    if esp_timer_get_time() - start > EDGE_TIMEOUT_US {
                        return None;
                    }
                }
                Some((esp_timer_get_time() - start) as u32)
            }
        }

        fn read_frame(&mut self) -> Option<[u8; 5]> {
            // SAFETY: start pulse on our own open-drain pin.
            unsafe {
                gpio_set_level(self.pin, 0);
                esp_rom_delay_us(START_LOW_US);
                gpio_set_level(self.pin, 1);
                esp_rom_delay_us(30);
            }
            // Sensor response: 80 µs low, 80 µs high.
            self.wait_while(0)?;
            self.wait_while(1)?;

            let mut widths = [0u32; 40];
            for w in widths.iter_mut() {
                self.wait_while(0)?;
                *w = self.wait_while(1)?;
            }
            Some(super::bits_to_frame(&widths))
        }
    }

    impl AmbientPort for Dht11 {
        fn read(&mut self) -> Option<(f32, f32)> {
            let frame = self.read_frame();
            if frame.is_none() {
                debug!("dht11: no response on GPIO{}", self.pin);
            }
            super::decode(frame?)
        }
    }
}
