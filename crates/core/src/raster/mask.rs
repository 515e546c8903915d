//! Per-pixel validity masks

use ndarray::{Array2, Zip};

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};

/// Boolean raster marking pixels that may take part in statistics or detection.
///
/// `true` means usable. A mask is always derived from (and shaped like) the
/// raster it qualifies; combining masks never modifies either operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityMask {
    data: Array2<bool>,
}

impl ValidityMask {
    /// Mask with every pixel valid
    pub fn all_valid(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), true),
        }
    }

    /// Mask with every pixel invalid
    pub fn all_invalid(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), false),
        }
    }

    pub fn from_array(data: Array2<bool>) -> Self {
        Self { data }
    }

    /// Evaluate `predicate` on every cell of `raster`.
    pub fn from_raster<T, F>(raster: &Raster<T>, predicate: F) -> Self
    where
        T: RasterElement,
        F: Fn(T) -> bool,
    {
        Self {
            data: raster.data().mapv(predicate),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Whether the pixel at (row, col) is valid; out-of-range pixels are not.
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.data.get((row, col)).copied().unwrap_or(false)
    }

    pub fn data(&self) -> &Array2<bool> {
        &self.data
    }

    /// Number of valid pixels
    pub fn count_valid(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Number of invalid pixels
    pub fn count_invalid(&self) -> usize {
        self.data.len() - self.count_valid()
    }

    /// Logical AND of two masks of identical shape.
    pub fn and(&self, other: &ValidityMask) -> Result<ValidityMask> {
        self.check_shape(other.shape())?;
        let mut data = Array2::from_elem(self.shape(), false);
        Zip::from(&mut data)
            .and(&self.data)
            .and(&other.data)
            .for_each(|out, &a, &b| *out = a && b);
        Ok(Self { data })
    }

    /// Logical OR of two masks of identical shape.
    pub fn or(&self, other: &ValidityMask) -> Result<ValidityMask> {
        self.check_shape(other.shape())?;
        let mut data = Array2::from_elem(self.shape(), false);
        Zip::from(&mut data)
            .and(&self.data)
            .and(&other.data)
            .for_each(|out, &a, &b| *out = a || b);
        Ok(Self { data })
    }

    /// Copy of `raster` with NaN written wherever this mask is invalid.
    pub fn apply(&self, raster: &Raster<f64>) -> Result<Raster<f64>> {
        self.check_shape(raster.shape())?;
        let mut out = raster.clone();
        Zip::from(out.data_mut())
            .and(&self.data)
            .for_each(|v, &valid| {
                if !valid {
                    *v = f64::NAN;
                }
            });
        out.set_nodata(Some(f64::NAN));
        Ok(out)
    }

    /// Encode as a 0/255 byte raster for export.
    pub fn to_raster(&self, transform: GeoTransform) -> Raster<u8> {
        let mut raster = Raster::from_array(self.data.mapv(|v| if v { 255u8 } else { 0u8 }));
        raster.set_transform(transform);
        raster
    }

    pub fn check_shape(&self, shape: (usize, usize)) -> Result<()> {
        if self.shape() != shape {
            return Err(Error::SizeMismatch {
                er: self.rows(),
                ec: self.cols(),
                ar: shape.0,
                ac: shape.1,
            });
        }
        Ok(())
    }
}
