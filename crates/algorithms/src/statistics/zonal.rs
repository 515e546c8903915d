//! Zonal statistics
//!
//! Reduces an index raster to scalar statistics over the pixels selected by
//! a region mask. Non-finite values inside the region are skipped.

use serde::{Deserialize, Serialize};

use leona_core::{Raster, Result, ValidityMask};

/// Summary of one index over a region.
///
/// An empty region reports every statistic as 0.0 and a count of zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ZonalStats {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl ZonalStats {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            mean,
            std: var.sqrt(),
            min,
            max,
            count,
        }
    }
}

/// Reduce `index` over the pixels where `region` is valid.
pub fn reduce(index: &Raster<f64>, region: &ValidityMask) -> Result<ZonalStats> {
    region.check_shape(index.shape())?;

    let (rows, cols) = index.shape();
    let mut values = Vec::with_capacity(region.count_valid());
    for row in 0..rows {
        for col in 0..cols {
            if !region.is_valid(row, col) {
                continue;
            }
            let v = unsafe { index.get_unchecked(row, col) };
            if v.is_finite() {
                values.push(v);
            }
        }
    }

    Ok(ZonalStats::from_values(&values))
}

/// Pixels of a region standing out from the rest.
#[derive(Debug, Clone)]
pub struct Hotspots {
    pub mask: ValidityMask,
    /// Value a pixel had to exceed
    pub threshold: f64,
    pub count: usize,
    /// `count` over the region's valid pixel count, 0.0 for an empty region
    pub fraction: f64,
}

/// Flag region pixels with `value > mean + std` (one sigma above the mean).
pub fn hotspots(
    index: &Raster<f64>,
    region: &ValidityMask,
    stats: &ZonalStats,
) -> Result<Hotspots> {
    region.check_shape(index.shape())?;

    let threshold = stats.mean + stats.std;
    let above = ValidityMask::from_raster(index, |v| v > threshold);
    let mask = above.and(region)?;
    let count = mask.count_valid();

    Ok(Hotspots {
        threshold,
        count,
        fraction: super::fraction(count, region.count_valid()),
        mask,
    })
}
