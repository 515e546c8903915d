//! Validity masking
//!
//! Builds per-pixel usability masks from quality layers and derived index
//! ranges. Rules are combined with logical AND; for a two-period comparison
//! each period is masked independently and the two masks are ANDed, so a
//! pixel takes part in a delta only when both periods are usable.

mod scene_class;

pub use scene_class::SceneClass;

use serde::{Deserialize, Serialize};
use tracing::debug;

use leona_core::{BandRaster, Raster, Result, ValidityMask};

/// An interval of physically plausible values.
///
/// NaN is never inside a range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    /// Whether the bounds themselves are accepted
    #[serde(default)]
    pub inclusive: bool,
}

impl ValueRange {
    /// Plausible NDVI values for any period
    pub const NDVI: ValueRange = ValueRange::exclusive(-1.0, 1.0);

    /// NDVI of a pixel that is vegetated to begin with
    pub const VEGETATED_NDVI: ValueRange = ValueRange::exclusive(0.2, 1.0);

    /// `min < v < max`
    pub const fn exclusive(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            inclusive: false,
        }
    }

    /// `min <= v <= max`
    pub const fn inclusive(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            inclusive: true,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        if self.inclusive {
            value >= self.min && value <= self.max
        } else {
            value > self.min && value < self.max
        }
    }
}

/// Which quality layers of a band raster to honor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskingRules {
    /// Band holding scene-classification codes
    pub scene_class_band: Option<String>,
    /// Classes rejected when `scene_class_band` is set
    pub excluded_classes: Vec<SceneClass>,
    /// Band holding the sensor's own validity flag (0 = invalid)
    pub data_mask_band: Option<String>,
}

impl MaskingRules {
    /// No quality layers; only index ranges decide validity.
    pub fn none() -> Self {
        Self {
            scene_class_band: None,
            excluded_classes: Vec::new(),
            data_mask_band: None,
        }
    }

    /// Only the sensor validity flag in `band`.
    pub fn data_mask_only(band: impl Into<String>) -> Self {
        Self {
            data_mask_band: Some(band.into()),
            ..Self::none()
        }
    }
}

/// Sentinel-2 L2A defaults: `SCL` with the default cloud/shadow/snow classes, and `dataMask`.
impl Default for MaskingRules {
    fn default() -> Self {
        Self {
            scene_class_band: Some("SCL".to_string()),
            excluded_classes: SceneClass::DEFAULT_EXCLUDED.to_vec(),
            data_mask_band: Some("dataMask".to_string()),
        }
    }
}

/// Reject pixels whose scene class is excluded or cannot be decoded.
pub fn scene_class_mask(scl: &Raster<f64>, excluded: &[SceneClass]) -> ValidityMask {
    ValidityMask::from_raster(scl, |v| match SceneClass::from_value(v) {
        Some(class) => !excluded.contains(&class),
        None => false,
    })
}

/// Reject pixels whose validity flag is zero or missing.
pub fn data_mask(flag: &Raster<f64>) -> ValidityMask {
    ValidityMask::from_raster(flag, |v| v.is_finite() && v != 0.0)
}

/// Reject pixels whose index value lies outside `range`.
pub fn range_mask(index: &Raster<f64>, range: ValueRange) -> ValidityMask {
    ValidityMask::from_raster(index, |v| range.contains(v))
}

/// Combined quality mask of one band raster under `rules`.
///
/// Fails with `MissingBand` when a rule names a band the raster lacks.
pub fn validity_mask(raster: &BandRaster, rules: &MaskingRules) -> Result<ValidityMask> {
    let (rows, cols) = raster.shape();
    let mut mask = ValidityMask::all_valid(rows, cols);

    if let Some(band) = &rules.scene_class_band {
        let scl = scene_class_mask(raster.band(band)?, &rules.excluded_classes);
        debug!(band = %band, rejected = scl.count_invalid(), "scene classification mask");
        mask = mask.and(&scl)?;
    }
    if let Some(band) = &rules.data_mask_band {
        let flags = data_mask(raster.band(band)?);
        debug!(band = %band, rejected = flags.count_invalid(), "data mask");
        mask = mask.and(&flags)?;
    }

    Ok(mask)
}

/// Validity of a pixel for a two-period comparison: both periods must be valid.
pub fn combine_periods(reference: &ValidityMask, recent: &ValidityMask) -> Result<ValidityMask> {
    reference.and(recent)
}
