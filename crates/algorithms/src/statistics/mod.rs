//! Area and summary statistics
//!
//! - **area**: pixel counts to km² over a bounding box
//! - **zonal**: scalar reduction of an index over a region, hotspot rule

pub mod area;
pub mod zonal;

pub use area::{
    aggregate, coverage_percentage, detected_area_km2, estimated_total_pixels, geodesic_extent,
    pixel_area_km2, AreaSummary, GeodesicExtent, KM_PER_DEGREE, LANDSAT_PIXEL_SIZE_M,
};
pub use zonal::{hotspots, reduce, Hotspots, ZonalStats};

/// `part / whole`, 0.0 when `whole` is zero.
pub fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
