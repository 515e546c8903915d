//! Result assembly
//!
//! Packs detections and zonal reductions into serializable records. All
//! computation happens at full precision; rounding is applied once, when a
//! record is finalized for output.

mod detection;

pub use detection::{DataQuality, DataStatus, DetectionResult};

use serde::{Deserialize, Serialize};

use crate::statistics::ZonalStats;
use leona_core::ValidityMask;

/// Decimal places of temperatures
pub const TEMPERATURE_DECIMALS: u32 = 2;
/// Decimal places of percentages
pub const PERCENT_DECIMALS: u32 = 1;
/// Decimal places of fractions and index means
pub const FRACTION_DECIMALS: u32 = 3;
/// Decimal places of areas reported in km² at catchment scale
pub const AREA_DECIMALS: u32 = 4;
/// Decimal places of small areas and per-pixel figures
pub const FINE_DECIMALS: u32 = 6;

/// Round half away from zero to `decimals` places.
///
/// Non-finite input becomes 0.0; NaN never reaches a finalized record.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// Mean/std/min/max of one delta, rounded for output.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeltaStats {
    pub mean: f64,
    pub std: f64,
    pub max: f64,
    pub min: f64,
}

impl DeltaStats {
    pub fn from_zonal(stats: &ZonalStats, decimals: u32) -> Self {
        Self {
            mean: round_to(stats.mean, decimals),
            std: round_to(stats.std, decimals),
            max: round_to(stats.max, decimals),
            min: round_to(stats.min, decimals),
        }
    }
}

/// Raster width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: usize,
    pub height: usize,
}

impl Resolution {
    pub fn of(mask: &ValidityMask) -> Self {
        Self {
            width: mask.cols(),
            height: mask.rows(),
        }
    }
}

/// A finalized record together with the mask it was derived from.
///
/// The mask is what `--mask-out` exports; it is not part of the record.
#[derive(Debug, Clone)]
pub struct AnalysisOutput<R> {
    pub report: R,
    pub mask: ValidityMask,
}
