//! Band algebra
//!
//! Pure per-pixel transforms from raw bands to derived index rasters:
//! - Spectral indices: NDVI, NBR, NDWI
//! - Radar: linear power to decibels
//! - Thermal: digital numbers to land surface temperature
//! - Band math: element-wise raster algebra and differences

mod band_math;
mod indices;
mod radar;
mod thermal;

pub use band_math::{band_difference, band_math};
pub use indices::{
    nbr, ndvi, ndwi, normalized_difference, SpectralIndex, NDWI_EPSILON,
    NORMALIZED_DIFFERENCE_EPSILON,
};
pub use radar::{decibels, to_decibels, DECIBEL_FLOOR};
pub use thermal::{lst_celsius, ThermalCalibration, KELVIN_OFFSET};
