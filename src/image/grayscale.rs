//! Window/level mapping of raw samples to 8-bit grayscale
//!
//! Each raw sample is rescaled to its calibrated value and pushed through a
//! linear window: values at or below `center - width/2` become black, values
//! above `center + width/2` become white. MONOCHROME1 data is inverted
//! afterwards.

use crate::dicom::{PhotometricParams, RawSamples};
use crate::types::{RescaleParams, WindowSettings};

/// Precomputed window bounds, built once per mapping pass
#[derive(Debug, Clone, Copy)]
struct WindowFn {
    rescale: RescaleParams,
    low: f64,
    high: f64,
    width: f64,
    invert: bool,
}

impl WindowFn {
    fn new(rescale: RescaleParams, window: &WindowSettings, invert: bool) -> Self {
        Self {
            rescale,
            low: window.low(),
            high: window.high(),
            width: window.width,
            invert,
        }
    }

    /// Runs once per sample
    #[inline(always)]
    fn apply(&self, raw: f64) -> u8 {
        let gray = window_value(self.rescale.apply(raw), self.low, self.high, self.width);
        if self.invert { 255 - gray } else { gray }
    }
}

/// Map one calibrated value through a window, without polarity inversion.
///
/// The boundaries are asymmetric: `value <= low` is 0, `value > high` is 255.
#[inline(always)]
#[must_use]
pub fn window_value(value: f64, low: f64, high: f64, width: f64) -> u8 {
    if value <= low {
        0
    } else if value > high {
        255
    } else {
        // In range: 0 < (value - low) / width <= 1, so the cast cannot saturate
        (255.0 * (value - low) / width).round() as u8
    }
}

/// Map a single raw sample with the given calibration and window
#[must_use]
pub fn map_sample(raw: f64, rescale: RescaleParams, window: &WindowSettings, invert: bool) -> u8 {
    WindowFn::new(rescale, window, invert).apply(raw)
}

/// Map every raw sample to an 8-bit gray level.
///
/// Inversion follows the photometric interpretation; the result has exactly
/// one byte per input sample.
#[must_use]
pub fn map_to_gray(
    samples: &RawSamples,
    photometric: &PhotometricParams,
    window: &WindowSettings,
) -> Vec<u8> {
    let f = WindowFn::new(photometric.rescale, window, photometric.is_inverted());

    match samples {
        RawSamples::U8(values) => values.iter().map(|&v| f.apply(f64::from(v))).collect(),
        RawSamples::U16(values) => values.iter().map(|&v| f.apply(f64::from(v))).collect(),
        RawSamples::I16(values) => values.iter().map(|&v| f.apply(f64::from(v))).collect(),
    }
}
