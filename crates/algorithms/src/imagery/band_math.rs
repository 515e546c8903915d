//! Band math operations
//!
//! Raster algebra: apply a function to one raster, or subtract two rasters,
//! element-wise.

use crate::maybe_rayon::*;
use super::indices::{build_output, check_dimensions, is_nodata_f64};
use leona_core::raster::Raster;
use leona_core::Result;

/// Apply a unary function to every cell in a raster.
///
/// Nodata cells (NaN or the raster's nodata value) are NaN in the output
/// and never reach `f`.
///
/// # Example
/// ```ignore
/// let scaled = band_math(&input, |v| v * 0.0001)?;
/// ```
pub fn band_math<F>(raster: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    let (rows, cols) = raster.shape();
    let nodata = raster.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let val = unsafe { raster.get_unchecked(row, col) };
                if is_nodata_f64(val, nodata) {
                    continue;
                }
                row_data[col] = f(val);
            }
            row_data
        })
        .collect();

    build_output(raster, rows, cols, data)
}

/// Element-wise difference `minuend - subtrahend`.
///
/// Both rasters must have the same dimensions. Nodata in either input
/// produces NaN in the output.
pub fn band_difference(minuend: &Raster<f64>, subtrahend: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(minuend, subtrahend)?;

    let (rows, cols) = minuend.shape();
    let nodata_a = minuend.nodata();
    let nodata_b = subtrahend.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let va = unsafe { minuend.get_unchecked(row, col) };
                let vb = unsafe { subtrahend.get_unchecked(row, col) };

                if is_nodata_f64(va, nodata_a) || is_nodata_f64(vb, nodata_b) {
                    continue;
                }

                row_data[col] = va - vb;
            }
            row_data
        })
        .collect();

    build_output(minuend, rows, cols, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leona_core::GeoTransform;

    fn make_band(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(5, 5, value);
        r.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));
        r
    }

    #[test]
    fn test_band_math_scale() {
        let input = make_band(5000.0);
        let result = band_math(&input, |v| v * 0.0001).unwrap();
        let val = result.get(2, 2).unwrap();
        assert!((val - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_band_math_preserves_nan() {
        let mut input = make_band(100.0);
        input.set(2, 2, f64::NAN).unwrap();

        let result = band_math(&input, |v| v * 2.0).unwrap();
        assert!(result.get(2, 2).unwrap().is_nan());
        assert_eq!(result.get(0, 0).unwrap(), 200.0);
    }

    #[test]
    fn test_band_difference() {
        let a = make_band(0.1);
        let b = make_band(0.6);

        let result = band_difference(&a, &b).unwrap();
        let val = result.get(2, 2).unwrap();
        assert!((val + 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_band_difference_propagates_nodata() {
        let mut a = make_band(0.4);
        a.set_nodata(Some(-9999.0));
        a.set(1, 1, -9999.0).unwrap();
        let mut b = make_band(0.1);
        b.set(3, 3, f64::NAN).unwrap();

        let result = band_difference(&a, &b).unwrap();
        assert!(result.get(1, 1).unwrap().is_nan());
        assert!(result.get(3, 3).unwrap().is_nan());
        assert!((result.get(0, 0).unwrap() - 0.3).abs() < 1e-10);
    }

    #[test]
    fn test_band_difference_mismatch() {
        let a = make_band(1.0);
        let b = Raster::filled(3, 3, 1.0);
        assert!(band_difference(&a, &b).is_err());
    }
}
