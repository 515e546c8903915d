//! Irrigation detection by SAR and optical fusion
//!
//! Newly irrigated fields get wetter (NDWI rises) and, at C-band, darker in
//! VV backscatter. Either signal alone is unreliable, so a pixel is flagged
//! only when both move past their thresholds. Deltas are `recent − reference`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::change::{
    ChangeDetector, CombineRule, DeltaConvention, Direction, IndexChange, ThresholdSet, DNDWI,
    DVV_DB,
};
use crate::imagery::{ndwi, to_decibels};
use crate::masking::{combine_periods, range_mask, validity_mask, MaskingRules, ValueRange};
use crate::report::{
    round_to, AnalysisOutput, DataQuality, DeltaStats, DetectionResult, Resolution,
    FINE_DECIMALS,
};
use crate::statistics::fraction;
use leona_core::{Algorithm, BandRaster, BoundingBox, Error, Raster, Result, ValidityMask};

/// Name of the NDWI delta in results
pub const DELTA_NDWI: &str = "delta_ndwi";
/// Name of the VV backscatter delta in results
pub const DELTA_VV_DB: &str = "delta_vv_db";

/// Band names of the radar and optical acquisitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionBands {
    /// Co-polarized backscatter in linear power
    pub vv: String,
    pub green: String,
    pub nir: String,
}

impl Default for FusionBands {
    fn default() -> Self {
        Self {
            vv: "VV".to_string(),
            green: "B03".to_string(),
            nir: "B08".to_string(),
        }
    }
}

/// Parameters for irrigation detection
#[derive(Debug, Clone)]
pub struct IrrigationParams {
    /// Must contain `dNDWI` and `dVV_dB`
    pub thresholds: ThresholdSet,
    /// Quality layers honored on the optical acquisitions
    pub optical_masking: MaskingRules,
    pub bands: FusionBands,
}

impl IrrigationParams {
    pub fn default_thresholds() -> ThresholdSet {
        ThresholdSet::new().with(DNDWI, 0.05).with(DVV_DB, 1.0)
    }
}

impl Default for IrrigationParams {
    fn default() -> Self {
        Self {
            thresholds: Self::default_thresholds(),
            optical_masking: MaskingRules::none(),
            bands: FusionBands::default(),
        }
    }
}

/// Radar and optical acquisitions for both periods, all on one grid.
#[derive(Debug, Clone)]
pub struct IrrigationInput {
    pub region: BoundingBox,
    pub radar_reference: BandRaster,
    pub radar_recent: BandRaster,
    pub optical_reference: BandRaster,
    pub optical_recent: BandRaster,
}

/// Finalized irrigation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationReport {
    pub pixels_detected: usize,
    pub area_detected_km2: f64,
    pub pixel_area_km2: f64,
    pub delta_ndwi_stats: DeltaStats,
    pub delta_vv_db_stats: DeltaStats,
    /// NDWI gain threshold; 0.0 when the configured value is not finite
    pub ndwi_threshold: f64,
    /// VV drop threshold in dB; 0.0 when the configured value is not finite
    pub vv_db_threshold: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub malformed_thresholds: Vec<String>,
    /// Share of NDWI candidates that the radar confirmed; a proportion, not a probability
    pub confidence_fraction: f64,
    pub resolution: Resolution,
    pub data_quality: DataQuality,
}

/// Irrigation detection
#[derive(Debug, Clone, Default)]
pub struct Irrigation;

impl Algorithm for Irrigation {
    type Input = IrrigationInput;
    type Output = AnalysisOutput<IrrigationReport>;
    type Params = IrrigationParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Irrigation"
    }

    fn description(&self) -> &'static str {
        "Detect irrigation from an NDWI increase fused with a VV backscatter decrease"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        detect_irrigation(&input, &params)
    }
}

/// Validity of one period: optical quality layers, a finite NDWI and a finite VV.
fn period_validity(
    optical: &BandRaster,
    ndwi_index: &Raster<f64>,
    vv_db: &Raster<f64>,
    rules: &MaskingRules,
) -> Result<ValidityMask> {
    validity_mask(optical, rules)?
        .and(&range_mask(ndwi_index, ValueRange::inclusive(-1.0, 1.0)))?
        .and(&ValidityMask::from_raster(vv_db, |v| v.is_finite()))
}

/// Detect irrigation between the reference and recent acquisitions of `input`.
///
/// VV is always converted from linear power to decibels; the radar channel
/// delivers linear power and no unit detection is attempted.
pub fn detect_irrigation(
    input: &IrrigationInput,
    params: &IrrigationParams,
) -> Result<AnalysisOutput<IrrigationReport>> {
    let bands = &params.bands;

    let ndwi_ref = ndwi(
        input.optical_reference.band(&bands.green)?,
        input.optical_reference.band(&bands.nir)?,
    )?;
    let ndwi_rec = ndwi(
        input.optical_recent.band(&bands.green)?,
        input.optical_recent.band(&bands.nir)?,
    )?;
    let vv_ref_db = to_decibels(input.radar_reference.band(&bands.vv)?)?;
    let vv_rec_db = to_decibels(input.radar_recent.band(&bands.vv)?)?;

    let ref_valid = period_validity(
        &input.optical_reference,
        &ndwi_ref,
        &vv_ref_db,
        &params.optical_masking,
    )?;
    let rec_valid = period_validity(
        &input.optical_recent,
        &ndwi_rec,
        &vv_rec_db,
        &params.optical_masking,
    )?;
    let overlap = combine_periods(&ref_valid, &rec_valid)?;
    debug!(
        reference = ref_valid.count_valid(),
        recent = rec_valid.count_valid(),
        overlap = overlap.count_valid(),
        "valid pixels"
    );

    let changes = [
        IndexChange::new(
            DELTA_NDWI,
            &ndwi_ref,
            &ndwi_rec,
            DeltaConvention::RecentMinusReference,
            DNDWI,
            Direction::Exceeds,
        ),
        IndexChange::new(
            DELTA_VV_DB,
            &vv_ref_db,
            &vv_rec_db,
            DeltaConvention::RecentMinusReference,
            DVV_DB,
            Direction::FallsBelow,
        ),
    ];
    let detection =
        ChangeDetector::new(CombineRule::All).detect(&changes, &params.thresholds, &overlap)?;

    let ndwi_candidates = detection
        .delta(DELTA_NDWI)
        .map(|d| d.passing.count_valid())
        .unwrap_or(0);
    let confidence = fraction(detection.detected_pixels(), ndwi_candidates);

    let result = DetectionResult::assemble(
        &detection,
        &input.region,
        &params.thresholds,
        ref_valid.count_valid(),
        rec_valid.count_valid(),
    )?;

    info!(
        detected = result.detected_pixel_count,
        candidates = ndwi_candidates,
        confidence,
        "irrigation analysis complete"
    );

    let report = IrrigationReport {
        pixels_detected: result.detected_pixel_count,
        area_detected_km2: round_to(result.detected_area_km2, FINE_DECIMALS),
        pixel_area_km2: round_to(result.pixel_area_km2, FINE_DECIMALS),
        delta_ndwi_stats: DeltaStats::from_zonal(&result.delta(DELTA_NDWI), FINE_DECIMALS),
        delta_vv_db_stats: DeltaStats::from_zonal(&result.delta(DELTA_VV_DB), FINE_DECIMALS),
        ndwi_threshold: result.thresholds_used.require(DNDWI)?,
        vv_db_threshold: result.thresholds_used.require(DVV_DB)?,
        malformed_thresholds: result.malformed_thresholds.clone(),
        confidence_fraction: round_to(confidence, FINE_DECIMALS),
        resolution: Resolution::of(&detection.detected),
        data_quality: result.data_quality,
    };

    Ok(AnalysisOutput {
        report,
        mask: detection.detected,
    })
}
