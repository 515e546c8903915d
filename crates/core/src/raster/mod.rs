//! Raster data structures and operations

mod band_raster;
mod element;
mod geotransform;
mod grid;
mod mask;

pub use band_raster::{BandRaster, Provenance};
pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::Raster;
pub use mask::ValidityMask;

/// A derived per-pixel index (NDVI, NDWI, LST in °C, ...).
///
/// Undefined pixels hold NaN. Index rasters are produced by pure transforms
/// and never mutated after creation.
pub type IndexRaster = Raster<f64>;
