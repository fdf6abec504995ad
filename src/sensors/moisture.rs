//! Capacitive soil moisture probes.
//!
//! Each reading is the median of a short burst of ADC conversions, mapped
//! linearly from the calibration window `[wet, dry]` onto `[100 %, 0 %]`.
//! A wetter soil gives a lower raw value.

use embedded_hal::delay::DelayNs;

use crate::app::ports::SoilProbe;
use crate::error::SensorError;
use crate::state::ZONE_COUNT;

/// Conversions per reading.
pub const BURST_SAMPLES: usize = 5;
/// Spacing between conversions in a burst (ms).
pub const BURST_SPACING_MS: u32 = 5;

/// Map a raw conversion onto percent moisture.
///
/// Integer arithmetic (truncating), clamped to `[0, 100]`; never increases
/// as `raw` grows.  A degenerate window (`dry <= wet`) reads as dry.
pub fn map_to_percent(raw: u16, wet: u16, dry: u16) -> f32 {
    if dry <= wet {
        return 0.0;
    }
    let span = i32::from(dry) - i32::from(wet);
    let pct = 100 - (i32::from(raw) - i32::from(wet)) * 100 / span;
    pct.clamp(0, 100) as f32
}

/// Median of a burst.  Sorts in place.
pub fn median(samples: &mut [u16; BURST_SAMPLES]) -> u16 {
    samples.sort_unstable();
    samples[BURST_SAMPLES / 2]
}

pub struct SoilSampler<P> {
    probe: P,
    wet: u16,
    dry: u16,
}

impl<P: SoilProbe> SoilSampler<P> {
    pub fn new(probe: P, wet: u16, dry: u16) -> Self {
        Self { probe, wet, dry }
    }

    /// Median-filtered percentage for one zone.
    pub fn read_zone(&mut self, zone: usize, delay: &mut impl DelayNs) -> Result<f32, SensorError> {
        let mut burst = [0u16; BURST_SAMPLES];
        for (i, slot) in burst.iter_mut().enumerate() {
            *slot = self.probe.read_raw(zone)?;
            if i + 1 < BURST_SAMPLES {
                delay.delay_ms(BURST_SPACING_MS);
            }
        }
        Ok(map_to_percent(median(&mut burst), self.wet, self.dry))
    }

    /// All zones; a zone that failed to read comes back as NaN so the
    /// store keeps its previous value.
    pub fn read_all(&mut self, delay: &mut impl DelayNs) -> [f32; ZONE_COUNT] {
        let mut out = [f32::NAN; ZONE_COUNT];
        for (zone, slot) in out.iter_mut().enumerate() {
            match self.read_zone(zone, delay) {
                Ok(pct) => *slot = pct,
                Err(e) => log::warn!("Soil: zone {zone} read failed: {e}"),
            }
        }
        out
    }
}
