//! Spectral indices
//!
//! Normalized-difference indices computed from single-band rasters.
//! Every function is a pure transform: inputs are borrowed, a new raster
//! is returned, and undefined pixels come out as NaN rather than errors.

use ndarray::Array2;
use crate::maybe_rayon::*;
use leona_core::raster::Raster;
use leona_core::{Error, Result};

/// Additive denominator guard for NDVI and NBR
pub const NORMALIZED_DIFFERENCE_EPSILON: f64 = 1e-6;

/// Additive denominator guard for NDWI, applied only when the denominator is non-zero
pub const NDWI_EPSILON: f64 = 1e-9;

/// Enumeration of supported spectral indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectralIndex {
    /// Normalized Difference Vegetation Index
    NDVI,
    /// Normalized Burn Ratio
    NBR,
    /// Normalized Difference Water Index (McFeeters)
    NDWI,
}

impl SpectralIndex {
    /// Short name used for thresholds and report keys
    pub fn name(&self) -> &'static str {
        match self {
            SpectralIndex::NDVI => "ndvi",
            SpectralIndex::NBR => "nbr",
            SpectralIndex::NDWI => "ndwi",
        }
    }
}

// ---------------------------------------------------------------------------
// Generic normalized difference
// ---------------------------------------------------------------------------

/// Compute the epsilon-guarded normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b + epsilon)`
///
/// There is no error path for bad values: NaN inputs or nodata cells give
/// NaN, and a vanishing denominator gives a large or infinite value that
/// downstream range masking is expected to reject.
///
/// # Arguments
/// * `band_a` - Numerator positive band
/// * `band_b` - Numerator negative band
/// * `epsilon` - Added to the denominator
pub fn normalized_difference(
    band_a: &Raster<f64>,
    band_b: &Raster<f64>,
    epsilon: f64,
) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();
    let nodata_a = band_a.nodata();
    let nodata_b = band_b.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };

                if is_nodata_f64(a, nodata_a) || is_nodata_f64(b, nodata_b) {
                    continue;
                }

                row_data[col] = (a - b) / (a + b + epsilon);
            }
            row_data
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

// ---------------------------------------------------------------------------
// NDVI
// ---------------------------------------------------------------------------

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red + 1e-6)`
///
/// Values range from -1 to 1:
/// - Dense vegetation: 0.6 to 0.9
/// - Sparse vegetation: 0.2 to 0.5
/// - Bare soil: 0.1 to 0.2
/// - Water/clouds: -1.0 to 0.0
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, red, NORMALIZED_DIFFERENCE_EPSILON)
}

// ---------------------------------------------------------------------------
// NBR
// ---------------------------------------------------------------------------

/// Normalized Burn Ratio
///
/// `NBR = (NIR - SWIR) / (NIR + SWIR + 1e-6)`
///
/// Drops sharply where canopy is cleared or burned.
pub fn nbr(nir: &Raster<f64>, swir: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, swir, NORMALIZED_DIFFERENCE_EPSILON)
}

// ---------------------------------------------------------------------------
// NDWI
// ---------------------------------------------------------------------------

/// Normalized Difference Water Index (McFeeters, 1996)
///
/// `NDWI = (Green - NIR) / (Green + NIR + 1e-9)`
///
/// Pixels where `Green + NIR == 0` are NaN, never ±Inf; the branch is
/// taken before dividing. Positive values indicate open water or wet soil.
pub fn ndwi(green: &Raster<f64>, nir: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(green, nir)?;

    let (rows, cols) = green.shape();
    let nodata_green = green.nodata();
    let nodata_nir = nir.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let g = unsafe { green.get_unchecked(row, col) };
                let n = unsafe { nir.get_unchecked(row, col) };

                if is_nodata_f64(g, nodata_green) || is_nodata_f64(n, nodata_nir) {
                    continue;
                }

                let denom = g + n;
                if denom == 0.0 {
                    continue;
                }

                row_data[col] = (g - n) / (denom + NDWI_EPSILON);
            }
            row_data
        })
        .collect();

    build_output(green, rows, cols, data)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn is_nodata_f64(value: f64, nodata: Option<f64>) -> bool {
    if value.is_nan() {
        return true;
    }
    match nodata {
        Some(nd) => (value - nd).abs() < f64::EPSILON,
        None => false,
    }
}

pub(crate) fn check_dimensions(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            er: a.rows(),
            ec: a.cols(),
            ar: b.rows(),
            ac: b.cols(),
        });
    }
    Ok(())
}

pub(crate) fn build_output(
    template: &Raster<f64>,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
) -> Result<Raster<f64>> {
    let mut output = template.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}
