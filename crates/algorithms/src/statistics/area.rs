//! Pixel-space to geographic-unit conversion
//!
//! Uses an equirectangular approximation of the bounding box: one degree of
//! latitude is 111.32 km and one degree of longitude shrinks with the cosine
//! of the box's mean latitude. Curvature inside the box is ignored, so the
//! result is only meaningful for boxes spanning a few degrees at most.

use serde::{Deserialize, Serialize};

use leona_core::{BoundingBox, Error, Result, ValidityMask};

/// Kilometres per degree of latitude (and of longitude at the equator)
pub const KM_PER_DEGREE: f64 = 111.32;

/// Nominal Landsat pixel edge in metres
pub const LANDSAT_PIXEL_SIZE_M: f64 = 30.0;

/// Approximate ground size of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodesicExtent {
    pub width_km: f64,
    pub height_km: f64,
}

impl GeodesicExtent {
    pub fn area_km2(&self) -> f64 {
        self.width_km * self.height_km
    }
}

pub fn geodesic_extent(bbox: &BoundingBox) -> GeodesicExtent {
    let avg_lat = bbox.center_lat().to_radians();
    GeodesicExtent {
        width_km: bbox.width_deg().abs() * KM_PER_DEGREE * avg_lat.cos(),
        height_km: bbox.height_deg().abs() * KM_PER_DEGREE,
    }
}

/// Ground area of one pixel when `bbox` is split into `rows × cols` pixels.
pub fn pixel_area_km2(bbox: &BoundingBox, rows: usize, cols: usize) -> Result<f64> {
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }
    Ok(geodesic_extent(bbox).area_km2() / (rows * cols) as f64)
}

pub fn detected_area_km2(pixel_count: usize, pixel_area_km2: f64) -> f64 {
    pixel_count as f64 * pixel_area_km2
}

/// Pixels the box would hold at a nominal pixel edge of `pixel_size_m`, at least one.
pub fn estimated_total_pixels(bbox: &BoundingBox, pixel_size_m: f64) -> usize {
    let area_m2 = geodesic_extent(bbox).area_km2() * 1e6;
    let estimate = (area_m2 / (pixel_size_m * pixel_size_m)).floor();
    if estimate.is_finite() && estimate >= 1.0 {
        estimate as usize
    } else {
        1
    }
}

/// `valid / estimated_total × 100`, capped at 100.
pub fn coverage_percentage(valid_pixels: usize, estimated_total: usize) -> f64 {
    if estimated_total == 0 {
        return 0.0;
    }
    (valid_pixels as f64 / estimated_total as f64 * 100.0).min(100.0)
}

/// Area figures of one detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub pixel_area_km2: f64,
    pub detected_pixels: usize,
    pub detected_area_km2: f64,
    pub valid_pixels: usize,
    pub valid_area_km2: f64,
}

/// Convert a detection mask and its validity mask into km² over `bbox`.
pub fn aggregate(
    detected: &ValidityMask,
    validity: &ValidityMask,
    bbox: &BoundingBox,
) -> Result<AreaSummary> {
    validity.check_shape(detected.shape())?;

    let (rows, cols) = validity.shape();
    let pixel_area = pixel_area_km2(bbox, rows, cols)?;
    let detected_pixels = detected.count_valid();
    let valid_pixels = validity.count_valid();

    Ok(AreaSummary {
        pixel_area_km2: pixel_area,
        detected_pixels,
        detected_area_km2: detected_area_km2(detected_pixels, pixel_area),
        valid_pixels,
        valid_area_km2: detected_area_km2(valid_pixels, pixel_area),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_one_degree_at_equator() {
        let bbox = BoundingBox::new(0.0, -0.5, 1.0, 0.5).unwrap();
        let (rows, cols) = (100, 100);
        let total = pixel_area_km2(&bbox, rows, cols).unwrap() * (rows * cols) as f64;
        let expected = KM_PER_DEGREE * KM_PER_DEGREE;
        assert!((total - expected).abs() / expected < 0.01, "got {total}");
        assert_relative_eq!(expected, 12392.14, epsilon = 0.01);
    }

    #[test]
    fn test_longitude_shrinks_with_latitude() {
        let equator = geodesic_extent(&BoundingBox::new(10.0, -0.5, 11.0, 0.5).unwrap());
        let north = geodesic_extent(&BoundingBox::new(10.0, 59.5, 11.0, 60.5).unwrap());
        assert_relative_eq!(north.height_km, equator.height_km, epsilon = 1e-9);
        assert_relative_eq!(north.width_km, equator.width_km * 0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_zero_dimensions() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        assert!(pixel_area_km2(&bbox, 0, 10).is_err());
        assert!(pixel_area_km2(&bbox, 10, 0).is_err());
    }

    #[test]
    fn test_estimated_total_pixels() {
        // ~1.113 km square, ~1376 Landsat pixels
        let bbox = BoundingBox::new(0.0, 0.0, 0.01, 0.01).unwrap();
        let total = estimated_total_pixels(&bbox, LANDSAT_PIXEL_SIZE_M);
        assert!((1370..1380).contains(&total), "got {total}");

        let tiny = BoundingBox::new(0.0, 0.0, 1e-7, 1e-7).unwrap();
        assert_eq!(estimated_total_pixels(&tiny, LANDSAT_PIXEL_SIZE_M), 1);
    }

    #[test]
    fn test_coverage_is_capped() {
        assert_relative_eq!(coverage_percentage(50, 200), 25.0);
        assert_relative_eq!(coverage_percentage(300, 200), 100.0);
        assert_eq!(coverage_percentage(0, 200), 0.0);
        assert_eq!(coverage_percentage(10, 0), 0.0);
    }

    #[test]
    fn test_aggregate() {
        let bbox = BoundingBox::new(0.0, 0.0, 0.01, 0.01).unwrap();
        let validity = ValidityMask::all_valid(10, 10);
        let mut flags = ndarray::Array2::from_elem((10, 10), false);
        for col in 0..10 {
            flags[(2, col)] = true;
        }
        let detected = ValidityMask::from_array(flags);

        let summary = aggregate(&detected, &validity, &bbox).unwrap();
        assert_eq!(summary.detected_pixels, 10);
        assert_eq!(summary.valid_pixels, 100);
        let total = geodesic_extent(&bbox).area_km2();
        assert_relative_eq!(summary.valid_area_km2, total, epsilon = 1e-12);
        let tenth = summary.valid_area_km2 / 10.0;
        assert_relative_eq!(summary.detected_area_km2, tenth, epsilon = 1e-12);
    }

    #[test]
    fn test_aggregate_nothing_valid() {
        let bbox = BoundingBox::new(0.0, 0.0, 0.01, 0.01).unwrap();
        let none = ValidityMask::all_invalid(4, 4);
        let summary = aggregate(&none, &none, &bbox).unwrap();
        assert_eq!(summary.detected_area_km2, 0.0);
        assert_eq!(summary.valid_area_km2, 0.0);
        assert!(summary.pixel_area_km2 > 0.0);
    }
}
