//! Main Raster type

use crate::bbox::BoundingBox;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{s, Array2, ArrayView2};

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a 2D grid with an associated
/// geotransform and an optional no-data value.
///
/// # Example
///
/// ```ignore
/// use leona_core::Raster;
///
/// let mut raster: Raster<f64> = Raster::new(100, 100);
/// raster.set(10, 20, 0.42)?;
/// let value = raster.get(10, 20)?;
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// Affine transformation
    transform: GeoTransform,
    /// No-data value
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a zero-filled raster of another element type sharing this raster's georeferencing
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            nodata: None,
        }
    }

    /// Apply `f` to every cell, keeping the georeferencing.
    ///
    /// The source raster is left untouched; the output has no no-data value set.
    pub fn map<U, F>(&self, f: F) -> Raster<U>
    where
        U: RasterElement,
        F: Fn(T) -> U,
    {
        Raster {
            data: self.data.mapv(f),
            transform: self.transform,
            nodata: None,
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Consume the raster and return the underlying array
    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Cut out the pixel window covering `region`.
    ///
    /// Window edges snap to the nearest pixel edge of this raster's grid, so
    /// the cell size is kept and the output bounds differ from `region` by
    /// less than half a pixel per side. Window cells that fall outside this
    /// raster hold the no-data value (NaN for floats), which is then set on
    /// the output.
    pub fn clip(&self, region: &BoundingBox) -> Result<Raster<T>> {
        let gt = self.transform;
        if !gt.is_north_up() {
            return Err(Error::Other("cannot clip a rotated raster".to_string()));
        }

        let (x0, y0) = gt.geo_to_pixel(region.min_lon(), region.max_lat());
        let (x1, y1) = gt.geo_to_pixel(region.max_lon(), region.min_lat());
        let (c0, c1) = snap_window(x0, x1)?;
        let (r0, r1) = snap_window(y0, y1)?;

        let out_rows = (r1 - r0) as usize;
        let out_cols = (c1 - c0) as usize;
        let fill = self.nodata.unwrap_or_else(T::default_nodata);
        let mut data = Array2::from_elem((out_rows, out_cols), fill);

        // Overlap of the window with this raster, in source pixel indices
        let (sr0, sr1) = (r0.max(0), r1.min(self.rows() as isize));
        let (sc0, sc1) = (c0.max(0), c1.min(self.cols() as isize));
        let mut covered = 0;
        if sr0 < sr1 && sc0 < sc1 {
            let src = self
                .data
                .slice(s![sr0 as usize..sr1 as usize, sc0 as usize..sc1 as usize]);
            let (dr, dc) = ((sr0 - r0) as usize, (sc0 - c0) as usize);
            data.slice_mut(s![dr..dr + src.nrows(), dc..dc + src.ncols()])
                .assign(&src);
            covered = ((sr1 - sr0) * (sc1 - sc0)) as usize;
        }

        let nodata = if covered < out_rows * out_cols {
            Some(fill)
        } else {
            self.nodata
        };

        Ok(Raster {
            data,
            transform: GeoTransform::new(
                gt.origin_x + c0 as f64 * gt.pixel_width,
                gt.origin_y + r0 as f64 * gt.pixel_height,
                gt.pixel_width,
                gt.pixel_height,
            ),
            nodata,
        })
    }
}

/// Round a fractional pixel span to whole pixel edges, at least one pixel wide.
fn snap_window(a: f64, b: f64) -> Result<(isize, isize)> {
    let lo = a.min(b).round();
    let hi = a.max(b).round();
    if !lo.is_finite() || !hi.is_finite() {
        return Err(Error::Other("raster has a degenerate geotransform".to_string()));
    }
    let hi = hi.max(lo + 1.0);
    Ok((lo as isize, hi as isize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f64> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.get(10, 0).is_err());
        assert!(raster.set(0, 10, 1.0).is_err());
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Raster::<f64>::from_vec(vec![0.0; 5], 2, 3).is_err());
        let r = Raster::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        assert_eq!(r.get(1, 0).unwrap(), 4.0);
    }

    #[test]
    fn test_map_keeps_source() {
        let mut raster: Raster<f64> = Raster::filled(2, 2, 0.5);
        raster.set_transform(GeoTransform::new(10.0, 20.0, 0.1, -0.1));
        let doubled: Raster<f64> = raster.map(|v| v * 2.0);
        assert_eq!(doubled.get(0, 0).unwrap(), 1.0);
        assert_eq!(raster.get(0, 0).unwrap(), 0.5);
        assert_eq!(doubled.transform(), raster.transform());
    }

    fn scene() -> Raster<f64> {
        // 10 x 5 grid over lon -62.0..-61.9, lat -10.0..-9.9
        let mut raster = Raster::from_vec((0..50).map(f64::from).collect(), 10, 5).unwrap();
        raster.set_transform(GeoTransform::new(-62.0, -9.9, 0.02, -0.01));
        raster
    }

    #[test]
    fn test_clip_to_inner_region() {
        let region = BoundingBox::new(-61.96, -9.97, -61.92, -9.93).unwrap();
        let clipped = scene().clip(&region).unwrap();

        assert_eq!(clipped.shape(), (4, 2));
        assert_eq!(clipped.get(0, 0).unwrap(), 17.0);
        assert_eq!(clipped.get(3, 1).unwrap(), 33.0);
        assert_eq!(clipped.nodata(), None);

        let (min_x, min_y, max_x, max_y) = clipped.bounds();
        assert!((min_x + 61.96).abs() < 1e-9);
        assert!((min_y + 9.97).abs() < 1e-9);
        assert!((max_x + 61.92).abs() < 1e-9);
        assert!((max_y + 9.93).abs() < 1e-9);
    }

    #[test]
    fn test_clip_pads_outside_footprint() {
        let region = BoundingBox::new(-61.92, -9.92, -61.88, -9.9).unwrap();
        let clipped = scene().clip(&region).unwrap();

        assert_eq!(clipped.shape(), (2, 2));
        assert_eq!(clipped.get(0, 0).unwrap(), 4.0);
        assert_eq!(clipped.get(1, 0).unwrap(), 9.0);
        assert!(clipped.get(0, 1).unwrap().is_nan());
        assert!(clipped.is_nodata(clipped.get(1, 1).unwrap()));
    }

    #[test]
    fn test_clip_keeps_at_least_one_pixel() {
        let region = BoundingBox::new(-61.951, -9.951, -61.949, -9.949).unwrap();
        assert_eq!(scene().clip(&region).unwrap().shape(), (1, 1));
    }
}
