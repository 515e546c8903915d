//! Vegetation loss between two optical acquisitions
//!
//! A pixel is deforested when it was vegetated in the reference period and
//! both its NDVI and its NBR dropped by more than their thresholds. Losses
//! are expressed as `reference − recent`, so a positive delta is a loss.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::change::{
    ChangeDetector, CombineRule, DeltaConvention, Direction, IndexChange, ThresholdSet, DNBR,
    DNDVI,
};
use crate::imagery::{nbr, ndvi};
use crate::masking::{combine_periods, range_mask, validity_mask, MaskingRules, ValueRange};
use crate::report::{
    round_to, AnalysisOutput, DataStatus, DeltaStats, DetectionResult, AREA_DECIMALS,
    FINE_DECIMALS,
};
use crate::statistics::reduce;
use leona_core::{Algorithm, BandRaster, BoundingBox, Error, Result};

/// Name of the NDVI loss delta in results
pub const DELTA_NDVI: &str = "dndvi";
/// Name of the NBR loss delta in results
pub const DELTA_NBR: &str = "dnbr";

/// Sentinel-2 L2A band names used by the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticalBands {
    pub red: String,
    pub nir: String,
    pub swir: String,
}

impl Default for OpticalBands {
    fn default() -> Self {
        Self {
            red: "B04".to_string(),
            nir: "B08".to_string(),
            swir: "B12".to_string(),
        }
    }
}

/// Parameters for deforestation detection
#[derive(Debug, Clone)]
pub struct DeforestationParams {
    /// Must contain `dNDVI` and `dNBR`
    pub thresholds: ThresholdSet,
    /// Quality layers honored in both periods
    pub masking: MaskingRules,
    /// NDVI a reference pixel needs to count as vegetated
    pub reference_ndvi: ValueRange,
    /// NDVI accepted in the recent period
    pub recent_ndvi: ValueRange,
    pub bands: OpticalBands,
}

impl DeforestationParams {
    pub fn default_thresholds() -> ThresholdSet {
        ThresholdSet::new().with(DNDVI, 0.3).with(DNBR, 0.2)
    }
}

impl Default for DeforestationParams {
    fn default() -> Self {
        Self {
            thresholds: Self::default_thresholds(),
            masking: MaskingRules::default(),
            reference_ndvi: ValueRange::VEGETATED_NDVI,
            recent_ndvi: ValueRange::NDVI,
            bands: OpticalBands::default(),
        }
    }
}

/// Two co-registered acquisitions over a region.
#[derive(Debug, Clone)]
pub struct DeforestationInput {
    pub region: BoundingBox,
    pub reference: BandRaster,
    pub recent: BandRaster,
}

/// Counters of usable pixels per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeforestationQuality {
    pub ref_valid_pixels: usize,
    pub recent_valid_pixels: usize,
    pub cloud_free_overlap: usize,
    pub status: DataStatus,
}

/// Finalized deforestation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeforestationReport {
    pub deforested_pixels: usize,
    pub deforested_area_km2: f64,
    pub ndvi_mean_ref: f64,
    pub ndvi_mean_recent: f64,
    pub dnbr_mean: f64,
    pub valid_pixels: usize,
    pub valid_area_km2: f64,
    pub pixel_area_km2: f64,
    pub dndvi_stats: DeltaStats,
    pub dnbr_stats: DeltaStats,
    pub thresholds: ThresholdSet,
    /// Non-finite thresholds, reported as 0.0 in `thresholds`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub malformed_thresholds: Vec<String>,
    pub data_quality: DeforestationQuality,
}

/// Deforestation detection
#[derive(Debug, Clone, Default)]
pub struct Deforestation;

impl Algorithm for Deforestation {
    type Input = DeforestationInput;
    type Output = AnalysisOutput<DeforestationReport>;
    type Params = DeforestationParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Deforestation"
    }

    fn description(&self) -> &'static str {
        "Detect vegetation loss from combined NDVI and NBR drops between two acquisitions"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        detect_deforestation(&input.region, &input.reference, &input.recent, &params)
    }
}

/// Detect deforestation between `reference` and `recent` over `region`.
///
/// A period mask is the quality-layer mask ANDed with the period's NDVI
/// range; the reference range is stricter than the recent one so that a
/// complete loss of vegetation still registers.
pub fn detect_deforestation(
    region: &BoundingBox,
    reference: &BandRaster,
    recent: &BandRaster,
    params: &DeforestationParams,
) -> Result<AnalysisOutput<DeforestationReport>> {
    let bands = &params.bands;

    let ref_ndvi = ndvi(reference.band(&bands.nir)?, reference.band(&bands.red)?)?;
    let ref_nbr = nbr(reference.band(&bands.nir)?, reference.band(&bands.swir)?)?;
    let rec_ndvi = ndvi(recent.band(&bands.nir)?, recent.band(&bands.red)?)?;
    let rec_nbr = nbr(recent.band(&bands.nir)?, recent.band(&bands.swir)?)?;

    let ref_valid = validity_mask(reference, &params.masking)?
        .and(&range_mask(&ref_ndvi, params.reference_ndvi))?;
    let rec_valid =
        validity_mask(recent, &params.masking)?.and(&range_mask(&rec_ndvi, params.recent_ndvi))?;
    let overlap = combine_periods(&ref_valid, &rec_valid)?;
    debug!(
        reference = ref_valid.count_valid(),
        recent = rec_valid.count_valid(),
        overlap = overlap.count_valid(),
        "valid pixels"
    );

    let changes = [
        IndexChange::new(
            DELTA_NDVI,
            &ref_ndvi,
            &rec_ndvi,
            DeltaConvention::ReferenceMinusRecent,
            DNDVI,
            Direction::Exceeds,
        ),
        IndexChange::new(
            DELTA_NBR,
            &ref_nbr,
            &rec_nbr,
            DeltaConvention::ReferenceMinusRecent,
            DNBR,
            Direction::Exceeds,
        ),
    ];
    let detection =
        ChangeDetector::new(CombineRule::All).detect(&changes, &params.thresholds, &overlap)?;

    let result = DetectionResult::assemble(
        &detection,
        region,
        &params.thresholds,
        ref_valid.count_valid(),
        rec_valid.count_valid(),
    )?;

    let ndvi_mean_ref = reduce(&ref_ndvi, &ref_valid)?.mean;
    let ndvi_mean_recent = reduce(&rec_ndvi, &rec_valid)?.mean;
    let dndvi = result.delta(DELTA_NDVI);
    let dnbr = result.delta(DELTA_NBR);

    info!(
        deforested = result.detected_pixel_count,
        valid = result.valid_pixel_count,
        area_km2 = result.detected_area_km2,
        "deforestation analysis complete"
    );

    let report = DeforestationReport {
        deforested_pixels: result.detected_pixel_count,
        deforested_area_km2: round_to(result.detected_area_km2, AREA_DECIMALS),
        ndvi_mean_ref: round_to(ndvi_mean_ref, FINE_DECIMALS),
        ndvi_mean_recent: round_to(ndvi_mean_recent, FINE_DECIMALS),
        dnbr_mean: round_to(dnbr.mean, FINE_DECIMALS),
        valid_pixels: result.valid_pixel_count,
        valid_area_km2: round_to(result.valid_area_km2, AREA_DECIMALS),
        pixel_area_km2: round_to(result.pixel_area_km2, FINE_DECIMALS),
        dndvi_stats: DeltaStats::from_zonal(&dndvi, FINE_DECIMALS),
        dnbr_stats: DeltaStats::from_zonal(&dnbr, FINE_DECIMALS),
        thresholds: result.thresholds_used.clone(),
        malformed_thresholds: result.malformed_thresholds.clone(),
        data_quality: DeforestationQuality {
            ref_valid_pixels: result.data_quality.reference_valid_pixels,
            recent_valid_pixels: result.data_quality.recent_valid_pixels,
            cloud_free_overlap: result.data_quality.overlap_pixels,
            status: result.data_quality.status,
        },
    };

    Ok(AnalysisOutput {
        report,
        mask: detection.detected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masking::SceneClass;
    use leona_core::{Provenance, Raster};

    /// Bands whose NDVI is `ndvi` and NBR is `nbr_value` (up to the epsilon).
    fn scene(rows: usize, cols: usize, ndvi: f64, nbr_value: f64, scl: SceneClass) -> BandRaster {
        let nir = 0.5;
        let red = nir * (1.0 - ndvi) / (1.0 + ndvi);
        let swir = nir * (1.0 - nbr_value) / (1.0 + nbr_value);
        BandRaster::new(
            [
                ("B04", Raster::filled(rows, cols, red)),
                ("B08", Raster::filled(rows, cols, nir)),
                ("B12", Raster::filled(rows, cols, swir)),
                ("SCL", Raster::filled(rows, cols, scl.code() as f64)),
                ("dataMask", Raster::filled(rows, cols, 1.0)),
            ],
            Provenance::new("sentinel-2-l2a"),
        )
        .unwrap()
    }

    #[test]
    fn test_clear_loss_is_detected() {
        let region = BoundingBox::new(0.0, 0.0, 0.01, 0.01).unwrap();
        let reference = scene(6, 6, 0.6, 0.5, SceneClass::Vegetation);
        let recent = scene(6, 6, 0.1, 0.2, SceneClass::Vegetation);

        let params = DeforestationParams::default();
        let out = detect_deforestation(&region, &reference, &recent, &params).unwrap();
        assert_eq!(out.report.deforested_pixels, 36);
        assert_eq!(out.report.valid_pixels, 36);
        assert_eq!(out.report.data_quality.status, DataStatus::Ok);
        assert!((out.report.ndvi_mean_ref - 0.6).abs() < 1e-4);
        assert_eq!(out.mask.count_valid(), 36);
    }

    #[test]
    fn test_unvegetated_reference_is_excluded() {
        let region = BoundingBox::new(0.0, 0.0, 0.01, 0.01).unwrap();
        let reference = scene(4, 4, 0.15, 0.5, SceneClass::NotVegetated);
        let recent = scene(4, 4, -0.4, 0.0, SceneClass::NotVegetated);

        let params = DeforestationParams::default();
        let out = detect_deforestation(&region, &reference, &recent, &params).unwrap();
        assert_eq!(out.report.data_quality.ref_valid_pixels, 0);
        assert_eq!(out.report.data_quality.recent_valid_pixels, 16);
        assert_eq!(out.report.deforested_pixels, 0);
        assert_eq!(out.report.data_quality.status, DataStatus::NoValidData);
    }

    #[test]
    fn test_missing_band() {
        let region = BoundingBox::new(0.0, 0.0, 0.01, 0.01).unwrap();
        let reference = scene(4, 4, 0.6, 0.5, SceneClass::Vegetation);
        let recent = BandRaster::new(
            [("B04", Raster::filled(4, 4, 0.1))],
            Provenance::new("sentinel-2-l2a"),
        )
        .unwrap();

        let params = DeforestationParams::default();
        let result = detect_deforestation(&region, &reference, &recent, &params);
        assert!(matches!(result, Err(Error::MissingBand(_))));
    }

    #[test]
    fn test_nan_threshold_report_stays_finite() {
        let region = BoundingBox::new(0.0, 0.0, 0.01, 0.01).unwrap();
        let reference = scene(3, 3, 0.6, 0.5, SceneClass::Vegetation);
        let recent = scene(3, 3, 0.1, 0.2, SceneClass::Vegetation);
        let mut params = DeforestationParams::default();
        params.thresholds.set(DNDVI, f64::NAN);

        let out = detect_deforestation(&region, &reference, &recent, &params).unwrap();
        assert_eq!(out.report.deforested_pixels, 0);
        assert_eq!(out.report.thresholds.get(DNDVI), Some(0.0));
        assert_eq!(out.report.thresholds.get(DNBR), Some(0.2));

        let json = serde_json::to_string(&out.report).unwrap();
        assert!(!json.contains("null"), "{json}");
        assert!(json.contains(r#""malformed_thresholds":["dNDVI"]"#));
    }
}
