//! Radar backscatter conversions
//!
//! Acquisition channels deliver SAR backscatter (VV/VH) as linear power.
//! The unit is fixed per channel; nothing here tries to guess whether an
//! array is already logarithmic.

use super::band_math::band_math;
use leona_core::raster::Raster;
use leona_core::Result;

/// Lower clamp applied before taking the logarithm (−60 dB)
pub const DECIBEL_FLOOR: f64 = 1e-6;

/// Convert one linear power value to decibels: `10 * log10(max(x, floor))`.
///
/// NaN stays NaN.
pub fn decibels(value: f64) -> f64 {
    if value.is_nan() {
        return f64::NAN;
    }
    10.0 * value.max(DECIBEL_FLOOR).log10()
}

/// Convert a linear-power raster to decibels.
///
/// Non-positive values are clamped to [`DECIBEL_FLOOR`] instead of producing −∞.
pub fn to_decibels(linear: &Raster<f64>) -> Result<Raster<f64>> {
    band_math(linear, decibels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert!((decibels(1.0) - 0.0).abs() < 1e-12);
        assert!((decibels(0.1) + 10.0).abs() < 1e-12);
        assert!((decibels(100.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_floor() {
        assert!((decibels(0.0) + 60.0).abs() < 1e-9);
        assert!((decibels(-3.0) + 60.0).abs() < 1e-9);
        assert!(decibels(0.0).is_finite());
        assert!(decibels(f64::NAN).is_nan());
    }

    #[test]
    fn test_monotonic_above_floor() {
        let mut prev = decibels(DECIBEL_FLOOR * 1.01);
        let mut x = DECIBEL_FLOOR * 1.01;
        while x < 1e4 {
            x *= 1.37;
            let db = decibels(x);
            assert!(db > prev, "{} dB at {} not above {}", db, x, prev);
            prev = db;
        }
    }

    #[test]
    fn test_raster_conversion() {
        let mut linear = Raster::filled(3, 3, 0.01);
        linear.set(0, 0, 0.0).unwrap();
        linear.set(2, 2, f64::NAN).unwrap();

        let db = to_decibels(&linear).unwrap();
        assert!((db.get(1, 1).unwrap() + 20.0).abs() < 1e-12);
        assert!((db.get(0, 0).unwrap() + 60.0).abs() < 1e-9);
        assert!(db.get(2, 2).unwrap().is_nan());
    }
}
