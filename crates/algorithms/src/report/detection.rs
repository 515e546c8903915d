//! Two-period detection records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::change::{ChangeDetection, ThresholdSet};
use crate::statistics::{aggregate, reduce, ZonalStats};
use leona_core::{BoundingBox, Result};

/// Whether a result rests on any usable pixel at all.
///
/// Distinguishes "no change detected" from "nothing could be observed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    Ok,
    /// Masking left no pixel valid in both periods
    NoValidData,
}

/// Valid pixel counters of the two periods and their overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    pub reference_valid_pixels: usize,
    pub recent_valid_pixels: usize,
    pub overlap_pixels: usize,
    pub status: DataStatus,
}

impl DataQuality {
    pub fn new(
        reference_valid_pixels: usize,
        recent_valid_pixels: usize,
        overlap_pixels: usize,
    ) -> Self {
        Self {
            reference_valid_pixels,
            recent_valid_pixels,
            overlap_pixels,
            status: if overlap_pixels == 0 {
                DataStatus::NoValidData
            } else {
                DataStatus::Ok
            },
        }
    }
}

/// Outcome of one two-period analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detected_pixel_count: usize,
    pub detected_area_km2: f64,
    pub pixel_area_km2: f64,
    pub valid_pixel_count: usize,
    pub valid_area_km2: f64,
    /// Statistics of each delta over the valid overlap, keyed by delta name
    pub delta_stats: BTreeMap<String, ZonalStats>,
    /// Thresholds applied, with non-finite entries reported as 0.0
    pub thresholds_used: ThresholdSet,
    /// Thresholds that were not finite and therefore detected nothing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub malformed_thresholds: Vec<String>,
    pub data_quality: DataQuality,
}

impl DetectionResult {
    /// Convert a detection into area and statistics over `bbox`.
    pub fn assemble(
        detection: &ChangeDetection,
        bbox: &BoundingBox,
        thresholds: &ThresholdSet,
        reference_valid_pixels: usize,
        recent_valid_pixels: usize,
    ) -> Result<Self> {
        let area = aggregate(&detection.detected, &detection.validity, bbox)?;

        let mut delta_stats = BTreeMap::new();
        for delta in &detection.deltas {
            delta_stats.insert(delta.name.clone(), reduce(&delta.delta, &detection.validity)?);
        }

        Ok(Self {
            detected_pixel_count: area.detected_pixels,
            detected_area_km2: area.detected_area_km2,
            pixel_area_km2: area.pixel_area_km2,
            valid_pixel_count: area.valid_pixels,
            valid_area_km2: area.valid_area_km2,
            delta_stats,
            thresholds_used: thresholds.finite_or_zero(),
            malformed_thresholds: thresholds.malformed(),
            data_quality: DataQuality::new(
                reference_valid_pixels,
                recent_valid_pixels,
                area.valid_pixels,
            ),
        })
    }

    pub fn has_valid_data(&self) -> bool {
        self.data_quality.status == DataStatus::Ok
    }

    pub fn delta(&self, name: &str) -> ZonalStats {
        self.delta_stats.get(name).copied().unwrap_or_default()
    }
}
