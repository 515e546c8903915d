//! End-to-end scenarios over synthetic scenes.
//!
//! No fixtures or network access: every scene is built in memory with band
//! values chosen so that the derived indices hit the intended numbers.

use approx::assert_relative_eq;
use leona_algorithms::analysis::{
    detect_deforestation, detect_irrigation, DeforestationParams, IrrigationInput,
    IrrigationParams,
};
use leona_algorithms::change::{
    ChangeDetector, CombineRule, DeltaConvention, Direction, IndexChange, ThresholdSet, DNBR,
    DNDVI,
};
use leona_algorithms::masking::SceneClass;
use leona_algorithms::report::{DataStatus, DetectionResult};
use leona_algorithms::statistics::pixel_area_km2;
use leona_core::io::{read_geotiff, write_mask_geotiff};
use leona_core::{BandRaster, BoundingBox, Provenance, Raster, ValidityMask};

const SIZE: usize = 8;

fn small_box() -> BoundingBox {
    BoundingBox::new(0.0, 0.0, 0.01, 0.01).unwrap()
}

/// Sentinel-2 style scene with the given NDVI and NBR and one SCL class everywhere.
fn s2_scene(ndvi: f64, nbr: f64, scl: SceneClass) -> BandRaster {
    let nir = 0.4;
    let red = nir * (1.0 - ndvi) / (1.0 + ndvi);
    let swir = nir * (1.0 - nbr) / (1.0 + nbr);
    BandRaster::new(
        [
            ("B04", Raster::filled(SIZE, SIZE, red)),
            ("B08", Raster::filled(SIZE, SIZE, nir)),
            ("B12", Raster::filled(SIZE, SIZE, swir)),
            ("SCL", Raster::filled(SIZE, SIZE, scl.code() as f64)),
            ("dataMask", Raster::filled(SIZE, SIZE, 1.0)),
        ],
        Provenance::new("sentinel-2-l2a"),
    )
    .unwrap()
}

fn index_detection(nbr_delta: f64) -> DetectionResult {
    let ndvi_ref = Raster::filled(SIZE, SIZE, 0.6);
    let ndvi_rec = Raster::filled(SIZE, SIZE, 0.1);
    let nbr_ref = Raster::filled(SIZE, SIZE, 0.5);
    let nbr_rec = Raster::filled(SIZE, SIZE, 0.5 - nbr_delta);
    let thresholds = ThresholdSet::new().with(DNDVI, 0.3).with(DNBR, 0.2);
    let validity = ValidityMask::all_valid(SIZE, SIZE);

    let detection = ChangeDetector::new(CombineRule::All)
        .detect(
            &[
                IndexChange::new(
                    "dndvi",
                    &ndvi_ref,
                    &ndvi_rec,
                    DeltaConvention::ReferenceMinusRecent,
                    DNDVI,
                    Direction::Exceeds,
                ),
                IndexChange::new(
                    "dnbr",
                    &nbr_ref,
                    &nbr_rec,
                    DeltaConvention::ReferenceMinusRecent,
                    DNBR,
                    Direction::Exceeds,
                ),
            ],
            &thresholds,
            &validity,
        )
        .unwrap();
    DetectionResult::assemble(&detection, &small_box(), &thresholds, SIZE * SIZE, SIZE * SIZE)
        .unwrap()
}

#[test]
fn both_losses_above_threshold_flag_every_valid_pixel() {
    let result = index_detection(0.25);
    assert_eq!(result.detected_pixel_count, result.valid_pixel_count);
    assert_eq!(result.detected_pixel_count, SIZE * SIZE);
}

#[test]
fn ndvi_loss_alone_is_not_deforestation() {
    let result = index_detection(0.1);
    assert_eq!(result.detected_pixel_count, 0);
    assert_eq!(result.valid_pixel_count, SIZE * SIZE);
    assert_eq!(result.data_quality.status, DataStatus::Ok);
}

#[test]
fn deforestation_pipeline_on_band_rasters() {
    let reference = s2_scene(0.6, 0.5, SceneClass::Vegetation);
    let recent = s2_scene(0.1, 0.25, SceneClass::NotVegetated);

    let params = DeforestationParams::default();
    let out = detect_deforestation(&small_box(), &reference, &recent, &params).unwrap();
    let report = out.report;
    assert_eq!(report.deforested_pixels, report.valid_pixels);
    assert_eq!(report.data_quality.cloud_free_overlap, SIZE * SIZE);
    assert_relative_eq!(report.dnbr_mean, 0.25, epsilon = 1e-5);

    let pixel = pixel_area_km2(&small_box(), SIZE, SIZE).unwrap();
    assert_relative_eq!(report.deforested_area_km2, (pixel * 64.0 * 1e4).round() / 1e4);
}

#[test]
fn fully_clouded_scene_reports_zeros_without_error() {
    let reference = s2_scene(0.6, 0.5, SceneClass::CloudHigh);
    let recent = s2_scene(0.1, 0.25, SceneClass::Vegetation);

    let params = DeforestationParams::default();
    let out = detect_deforestation(&small_box(), &reference, &recent, &params).unwrap();
    let report = out.report;
    assert_eq!(report.valid_pixels, 0);
    assert_eq!(report.deforested_pixels, 0);
    assert_eq!(report.deforested_area_km2, 0.0);
    assert_eq!(report.ndvi_mean_ref, 0.0);
    assert_eq!(report.dnbr_mean, 0.0);
    assert_eq!(report.dndvi_stats.std, 0.0);
    assert_eq!(report.data_quality.status, DataStatus::NoValidData);
    assert_eq!(report.data_quality.recent_valid_pixels, SIZE * SIZE);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["data_quality"]["status"], "no_valid_data");
    assert!(json["dndvi_stats"]["mean"].is_number());
}

#[test]
fn threshold_overrides_change_the_outcome() {
    let reference = s2_scene(0.6, 0.5, SceneClass::Vegetation);
    let recent = s2_scene(0.1, 0.25, SceneClass::Vegetation);
    let params = DeforestationParams {
        thresholds: DeforestationParams::default_thresholds()
            .merged(&ThresholdSet::new().with(DNDVI, 0.6)),
        ..DeforestationParams::default()
    };

    let out = detect_deforestation(&small_box(), &reference, &recent, &params).unwrap();
    assert_eq!(out.report.deforested_pixels, 0);
    assert_eq!(out.report.thresholds.get(DNDVI), Some(0.6));
}

#[test]
fn mismatched_periods_are_rejected() {
    let reference = s2_scene(0.6, 0.5, SceneClass::Vegetation);
    let recent = BandRaster::new(
        [
            ("B04", Raster::filled(4, 4, 0.1)),
            ("B08", Raster::filled(4, 4, 0.4)),
            ("B12", Raster::filled(4, 4, 0.2)),
            ("SCL", Raster::filled(4, 4, 4.0)),
            ("dataMask", Raster::filled(4, 4, 1.0)),
        ],
        Provenance::new("sentinel-2-l2a"),
    )
    .unwrap();

    let params = DeforestationParams::default();
    assert!(detect_deforestation(&small_box(), &reference, &recent, &params).is_err());
}

#[test]
fn irrigation_mask_exports_as_geotiff() {
    let region = BoundingBox::new(30.0, 10.0, 30.02, 10.01).unwrap();
    let radar = |v: f64| {
        BandRaster::new([("VV", Raster::filled(4, 8, v))], Provenance::new("sentinel-1-grd"))
            .unwrap()
    };
    let optical = |g: f64, n: f64| {
        BandRaster::new(
            [("B03", Raster::filled(4, 8, g)), ("B08", Raster::filled(4, 8, n))],
            Provenance::new("sentinel-2-l2a"),
        )
        .unwrap()
    };
    let input = IrrigationInput {
        region,
        radar_reference: radar(0.1),
        radar_recent: radar(0.02),
        optical_reference: optical(0.1, 0.3),
        optical_recent: optical(0.3, 0.1),
    };

    let out = detect_irrigation(&input, &IrrigationParams::default()).unwrap();
    assert_eq!(out.report.pixels_detected, 32);
    assert_eq!(out.report.confidence_fraction, 1.0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("irrigation_mask.tif");
    write_mask_geotiff(&out.mask, region.geotransform(4, 8), &path).unwrap();

    let mask: Raster<u8> = read_geotiff(&path).unwrap();
    assert_eq!(mask.shape(), (4, 8));
    assert_eq!(mask.get(2, 5).unwrap(), 255);
    let (min_x, min_y, max_x, max_y) = mask.bounds();
    assert_relative_eq!(min_x, 30.0, epsilon = 1e-9);
    assert_relative_eq!(max_x, 30.02, epsilon = 1e-9);
    assert_relative_eq!(min_y, 10.0, epsilon = 1e-9);
    assert_relative_eq!(max_y, 10.01, epsilon = 1e-9);
}
