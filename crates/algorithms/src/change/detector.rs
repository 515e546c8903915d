//! Two-period change detection
//!
//! For each index the detector differences a reference and a recent raster,
//! blanks pixels outside the combined validity mask, tests the delta
//! against a one-sided threshold, and combines the per-index tests into a
//! single detection mask.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::thresholds::ThresholdSet;
use crate::imagery::band_difference;
use leona_core::{Error, Raster, Result, ValidityMask};

/// How the temporal delta of an index is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaConvention {
    /// `recent − reference`; the default for every delta
    RecentMinusReference,
    /// `reference − recent`; loss expressed as a positive number
    ReferenceMinusRecent,
}

/// Direction of a one-sided threshold test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `delta > threshold`
    Exceeds,
    /// `delta < −|threshold|`
    FallsBelow,
}

impl Direction {
    /// Whether `delta` passes the test against `threshold`.
    ///
    /// NaN on either side fails, so a malformed threshold yields an empty detection.
    pub fn holds(self, delta: f64, threshold: f64) -> bool {
        match self {
            Direction::Exceeds => delta > threshold,
            Direction::FallsBelow => delta < -threshold.abs(),
        }
    }
}

/// How per-index tests are merged into the detection mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineRule {
    /// Every index must pass
    #[default]
    All,
    /// At least one index must pass
    Any,
}

/// One index to difference and test.
#[derive(Debug, Clone)]
pub struct IndexChange<'a> {
    /// Name of the delta in results (e.g. `delta_ndwi`)
    pub name: String,
    pub reference: &'a Raster<f64>,
    pub recent: &'a Raster<f64>,
    pub convention: DeltaConvention,
    /// Key into the [`ThresholdSet`]
    pub threshold: String,
    pub direction: Direction,
}

impl<'a> IndexChange<'a> {
    pub fn new(
        name: impl Into<String>,
        reference: &'a Raster<f64>,
        recent: &'a Raster<f64>,
        convention: DeltaConvention,
        threshold: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            name: name.into(),
            reference,
            recent,
            convention,
            threshold: threshold.into(),
            direction,
        }
    }
}

/// Delta raster of one index and the pixels passing its threshold.
#[derive(Debug, Clone)]
pub struct IndexDelta {
    pub name: String,
    /// NaN outside the validity mask
    pub delta: Raster<f64>,
    pub threshold: f64,
    pub direction: Direction,
    /// Valid pixels whose delta passes the threshold
    pub passing: ValidityMask,
}

/// Output of one detector run.
#[derive(Debug, Clone)]
pub struct ChangeDetection {
    /// Combined validity of both periods
    pub validity: ValidityMask,
    pub deltas: Vec<IndexDelta>,
    /// Pixels flagged as changed
    pub detected: ValidityMask,
}

impl ChangeDetection {
    pub fn valid_pixels(&self) -> usize {
        self.validity.count_valid()
    }

    pub fn detected_pixels(&self) -> usize {
        self.detected.count_valid()
    }

    pub fn delta(&self, name: &str) -> Option<&IndexDelta> {
        self.deltas.iter().find(|d| d.name == name)
    }
}

/// Stateless per-call change detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    combine: CombineRule,
}

impl ChangeDetector {
    pub fn new(combine: CombineRule) -> Self {
        Self { combine }
    }

    pub fn combine_rule(&self) -> CombineRule {
        self.combine
    }

    /// Difference, threshold and combine the given index changes.
    ///
    /// Shape mismatches between any raster and `validity` are fatal. A
    /// threshold key absent from `thresholds` fails with `MissingThreshold`.
    pub fn detect(
        &self,
        changes: &[IndexChange<'_>],
        thresholds: &ThresholdSet,
        validity: &ValidityMask,
    ) -> Result<ChangeDetection> {
        if changes.is_empty() {
            return Err(Error::InvalidParameter {
                name: "changes",
                value: "[]".to_string(),
                reason: "at least one index change is required".to_string(),
            });
        }

        let (rows, cols) = validity.shape();
        let mut detected = match self.combine {
            CombineRule::All => ValidityMask::all_valid(rows, cols),
            CombineRule::Any => ValidityMask::all_invalid(rows, cols),
        };
        let mut deltas = Vec::with_capacity(changes.len());

        for change in changes {
            let threshold = thresholds.require(&change.threshold)?;
            let raw = match change.convention {
                DeltaConvention::RecentMinusReference => {
                    band_difference(change.recent, change.reference)?
                }
                DeltaConvention::ReferenceMinusRecent => {
                    band_difference(change.reference, change.recent)?
                }
            };
            let delta = validity.apply(&raw)?;

            let direction = change.direction;
            let passing = ValidityMask::from_raster(&delta, |d| direction.holds(d, threshold));
            debug!(
                index = %change.name,
                threshold,
                passing = passing.count_valid(),
                "threshold applied"
            );

            detected = match self.combine {
                CombineRule::All => detected.and(&passing)?,
                CombineRule::Any => detected.or(&passing)?,
            };
            deltas.push(IndexDelta {
                name: change.name.clone(),
                delta,
                threshold,
                direction,
                passing,
            });
        }

        let detected = detected.and(validity)?;

        Ok(ChangeDetection {
            validity: validity.clone(),
            deltas,
            detected,
        })
    }
}
