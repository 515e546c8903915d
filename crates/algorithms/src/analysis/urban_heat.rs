//! Urban heat from a single thermal acquisition
//!
//! There is no second period here: land surface temperature and NDVI are
//! reduced over the valid part of the region, and pixels more than one
//! standard deviation warmer than the regional mean are heat hotspots.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::imagery::{lst_celsius, ndvi, ThermalCalibration};
use crate::masking::{validity_mask, MaskingRules};
use crate::report::{
    round_to, AnalysisOutput, DataStatus, FRACTION_DECIMALS, PERCENT_DECIMALS,
    TEMPERATURE_DECIMALS,
};
use crate::statistics::{
    coverage_percentage, estimated_total_pixels, hotspots, reduce, LANDSAT_PIXEL_SIZE_M,
};
use leona_core::{Algorithm, BandRaster, BoundingBox, Error, Result, ValidityMask};

/// Landsat Collection 2 Level-2 band names used by the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalBands {
    /// Surface temperature digital numbers; 0 is the fill value
    pub thermal: String,
    pub red: String,
    pub nir: String,
}

impl Default for ThermalBands {
    fn default() -> Self {
        Self {
            thermal: "ST_B10".to_string(),
            red: "SR_B4".to_string(),
            nir: "SR_B5".to_string(),
        }
    }
}

/// Qualitative vegetation level from the regional mean NDVI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VegetationHealth {
    High,
    Medium,
    Low,
}

impl VegetationHealth {
    /// `High` above 0.5, `Medium` above 0.3, `Low` otherwise.
    pub fn classify(mean_ndvi: f64) -> Self {
        if mean_ndvi > 0.5 {
            VegetationHealth::High
        } else if mean_ndvi > 0.3 {
            VegetationHealth::Medium
        } else {
            VegetationHealth::Low
        }
    }
}

/// Parameters for the urban heat analysis
#[derive(Debug, Clone)]
pub struct UrbanHeatParams {
    pub calibration: ThermalCalibration,
    /// Extra quality layers; none by default, the thermal fill value always applies
    pub masking: MaskingRules,
    pub bands: ThermalBands,
    /// Nominal pixel edge used to estimate coverage
    pub pixel_size_m: f64,
}

impl Default for UrbanHeatParams {
    fn default() -> Self {
        Self {
            calibration: ThermalCalibration::LANDSAT_C2_L2,
            masking: MaskingRules::none(),
            bands: ThermalBands::default(),
            pixel_size_m: LANDSAT_PIXEL_SIZE_M,
        }
    }
}

/// One thermal acquisition over a region.
#[derive(Debug, Clone)]
pub struct UrbanHeatInput {
    pub region: BoundingBox,
    pub scene: BandRaster,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureAnalysis {
    pub mean_temperature_c: f64,
    pub temperature_std_c: f64,
    pub min_temperature_c: f64,
    pub max_temperature_c: f64,
    pub urban_heat_fraction: f64,
    pub heat_threshold_c: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VegetationAnalysis {
    pub mean_ndvi: f64,
    pub vegetation_health: VegetationHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatDataQuality {
    pub valid_pixels: usize,
    /// Pixels the region would hold at the nominal pixel size
    pub total_pixels: usize,
    pub coverage_percentage: f64,
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    pub status: DataStatus,
}

/// Finalized urban heat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrbanHeatReport {
    pub temperature_analysis: TemperatureAnalysis,
    pub vegetation_analysis: VegetationAnalysis,
    pub data_quality: HeatDataQuality,
}

/// Urban heat analysis
#[derive(Debug, Clone, Default)]
pub struct UrbanHeat;

impl Algorithm for UrbanHeat {
    type Input = UrbanHeatInput;
    type Output = AnalysisOutput<UrbanHeatReport>;
    type Params = UrbanHeatParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "UrbanHeat"
    }

    fn description(&self) -> &'static str {
        "Summarize land surface temperature and flag one-sigma heat hotspots"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        analyze_urban_heat(&input.region, &input.scene, &params)
    }
}

/// Reduce temperature and vegetation over `region` and flag heat hotspots.
///
/// The returned mask holds the hotspot pixels.
pub fn analyze_urban_heat(
    region: &BoundingBox,
    scene: &BandRaster,
    params: &UrbanHeatParams,
) -> Result<AnalysisOutput<UrbanHeatReport>> {
    if !(params.pixel_size_m.is_finite() && params.pixel_size_m > 0.0) {
        return Err(Error::InvalidParameter {
            name: "pixel_size_m",
            value: params.pixel_size_m.to_string(),
            reason: "must be a positive number of metres".to_string(),
        });
    }

    let bands = &params.bands;
    let thermal = scene.band(&bands.thermal)?;
    let lst = lst_celsius(thermal, &params.calibration)?;
    let ndvi_index = ndvi(scene.band(&bands.nir)?, scene.band(&bands.red)?)?;

    let valid = validity_mask(scene, &params.masking)?
        .and(&ValidityMask::from_raster(thermal, |dn| dn.is_finite() && dn != 0.0))?;
    let valid_pixels = valid.count_valid();
    debug!(valid = valid_pixels, "valid thermal pixels");
    if valid_pixels == 0 {
        warn!("no valid thermal pixels in region");
    }

    let lst_stats = reduce(&lst, &valid)?;
    let ndvi_stats = reduce(&ndvi_index, &valid)?;
    let hot = hotspots(&lst, &valid, &lst_stats)?;

    let total_pixels = estimated_total_pixels(region, params.pixel_size_m);
    let coverage = coverage_percentage(valid_pixels, total_pixels);
    let provenance = scene.provenance();

    info!(
        mean_c = lst_stats.mean,
        hotspots = hot.count,
        coverage,
        "urban heat analysis complete"
    );

    let report = UrbanHeatReport {
        temperature_analysis: TemperatureAnalysis {
            mean_temperature_c: round_to(lst_stats.mean, TEMPERATURE_DECIMALS),
            temperature_std_c: round_to(lst_stats.std, TEMPERATURE_DECIMALS),
            min_temperature_c: round_to(lst_stats.min, TEMPERATURE_DECIMALS),
            max_temperature_c: round_to(lst_stats.max, TEMPERATURE_DECIMALS),
            urban_heat_fraction: round_to(hot.fraction, FRACTION_DECIMALS),
            heat_threshold_c: round_to(hot.threshold, TEMPERATURE_DECIMALS),
        },
        vegetation_analysis: VegetationAnalysis {
            mean_ndvi: round_to(ndvi_stats.mean, FRACTION_DECIMALS),
            vegetation_health: VegetationHealth::classify(ndvi_stats.mean),
        },
        data_quality: HeatDataQuality {
            valid_pixels,
            total_pixels,
            coverage_percentage: round_to(coverage, PERCENT_DECIMALS),
            collection: provenance.source.clone(),
            image_date: provenance.acquired.map(|d| d.format("%Y-%m-%d").to_string()),
            cloud_cover: provenance.cloud_cover.map(|c| round_to(c, PERCENT_DECIMALS)),
            status: if valid_pixels == 0 {
                DataStatus::NoValidData
            } else {
                DataStatus::Ok
            },
        },
    };

    Ok(AnalysisOutput {
        report,
        mask: hot.mask,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use leona_core::{Provenance, Raster};

    /// Digital number giving `celsius` under the default calibration.
    fn dn(celsius: f64) -> f64 {
        (celsius + 273.15 - 149.0) / 0.00341802
    }

    fn scene(thermal: Raster<f64>) -> BandRaster {
        let (rows, cols) = thermal.shape();
        BandRaster::new(
            [
                ("ST_B10", thermal),
                ("SR_B4", Raster::filled(rows, cols, 0.1)),
                ("SR_B5", Raster::filled(rows, cols, 0.3)),
            ],
            Provenance::new("landsat-8-9-c2-l2")
                .with_date(NaiveDate::from_ymd_opt(2024, 7, 14).unwrap())
                .with_cloud_cover(7.345),
        )
        .unwrap()
    }

    #[test]
    fn test_vegetation_health() {
        assert_eq!(VegetationHealth::classify(0.62), VegetationHealth::High);
        assert_eq!(VegetationHealth::classify(0.5), VegetationHealth::Medium);
        assert_eq!(VegetationHealth::classify(0.31), VegetationHealth::Medium);
        assert_eq!(VegetationHealth::classify(0.3), VegetationHealth::Low);
        assert_eq!(VegetationHealth::classify(0.0), VegetationHealth::Low);
    }

    #[test]
    fn test_hotspots_and_temperatures() {
        let mut thermal = Raster::filled(4, 4, dn(30.0));
        thermal.set(0, 0, dn(45.0)).unwrap();
        thermal.set(1, 1, dn(45.0)).unwrap();
        thermal.set(3, 3, 0.0).unwrap();
        let region = BoundingBox::new(-58.40, -34.61, -58.39, -34.60).unwrap();

        let params = UrbanHeatParams::default();
        let out = analyze_urban_heat(&region, &scene(thermal), &params).unwrap();
        let t = out.report.temperature_analysis;
        assert_eq!(out.report.data_quality.valid_pixels, 15);
        assert_eq!(t.max_temperature_c, 45.0);
        assert_eq!(t.min_temperature_c, 30.0);
        assert_eq!(t.urban_heat_fraction, round_to(2.0 / 15.0, 3));
        assert!(out.mask.is_valid(0, 0));
        assert!(!out.mask.is_valid(3, 3));
        assert_eq!(out.report.vegetation_analysis.vegetation_health, VegetationHealth::Medium);
        assert_eq!(out.report.data_quality.image_date.as_deref(), Some("2024-07-14"));
        assert_eq!(out.report.data_quality.cloud_cover, Some(7.3));
        assert!(out.report.data_quality.coverage_percentage <= 100.0);
    }

    #[test]
    fn test_all_fill_values() {
        let region = BoundingBox::new(0.0, 0.0, 0.01, 0.01).unwrap();
        let params = UrbanHeatParams::default();
        let out = analyze_urban_heat(&region, &scene(Raster::filled(3, 3, 0.0)), &params).unwrap();

        assert_eq!(out.report.data_quality.valid_pixels, 0);
        assert_eq!(out.report.data_quality.status, DataStatus::NoValidData);
        assert_eq!(out.report.temperature_analysis.mean_temperature_c, 0.0);
        assert_eq!(out.report.temperature_analysis.urban_heat_fraction, 0.0);
        assert_eq!(out.report.vegetation_analysis.vegetation_health, VegetationHealth::Low);
        assert_eq!(out.report.data_quality.coverage_percentage, 0.0);
    }

    #[test]
    fn test_custom_calibration() {
        let region = BoundingBox::new(0.0, 0.0, 0.01, 0.01).unwrap();
        let params = UrbanHeatParams {
            calibration: ThermalCalibration { scale: 0.01, offset: 0.0 },
            ..UrbanHeatParams::default()
        };
        let thermal = Raster::filled(2, 2, 30000.0);
        let out = analyze_urban_heat(&region, &scene(thermal), &params).unwrap();
        assert_eq!(out.report.temperature_analysis.mean_temperature_c, 26.85);
    }

    #[test]
    fn test_invalid_pixel_size() {
        let region = BoundingBox::new(0.0, 0.0, 0.01, 0.01).unwrap();
        let params = UrbanHeatParams {
            pixel_size_m: 0.0,
            ..UrbanHeatParams::default()
        };
        assert!(analyze_urban_heat(&region, &scene(Raster::filled(2, 2, 1.0)), &params).is_err());
    }
}
