//! Multi-band rasters as delivered by acquisition channels

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};

/// Where a raster came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Collection or product identifier (e.g. `sentinel-2-l2a`)
    pub source: String,
    /// Scene identifier within the collection, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,
    /// Acquisition date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquired: Option<NaiveDate>,
    /// Scene cloud cover in percent, if the provider reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
}

impl Provenance {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_scene_id(mut self, scene_id: impl Into<String>) -> Self {
        self.scene_id = Some(scene_id.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.acquired = Some(date);
        self
    }

    pub fn with_cloud_cover(mut self, percent: f64) -> Self {
        self.cloud_cover = Some(percent);
        self
    }
}

/// A named stack of co-registered bands.
///
/// Every band has the same non-empty `(rows, cols)` shape; construction
/// fails otherwise, so no partial computation ever sees a ragged stack.
#[derive(Debug, Clone)]
pub struct BandRaster {
    bands: BTreeMap<String, Raster<f64>>,
    shape: (usize, usize),
    provenance: Provenance,
}

impl BandRaster {
    /// Build a band stack, checking that all bands share one non-empty shape.
    pub fn new<I, S>(bands: I, provenance: Provenance) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Raster<f64>)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        let mut shape: Option<(usize, usize)> = None;

        for (name, raster) in bands {
            let (rows, cols) = raster.shape();
            if rows == 0 || cols == 0 {
                return Err(Error::InvalidDimensions {
                    width: cols,
                    height: rows,
                });
            }
            match shape {
                None => shape = Some((rows, cols)),
                Some((er, ec)) if (er, ec) != (rows, cols) => {
                    return Err(Error::SizeMismatch {
                        er,
                        ec,
                        ar: rows,
                        ac: cols,
                    });
                }
                Some(_) => {}
            }
            map.insert(name.into(), raster);
        }

        let shape = shape.ok_or(Error::InvalidDimensions {
            width: 0,
            height: 0,
        })?;

        Ok(Self {
            bands: map,
            shape,
            provenance,
        })
    }

    /// Band by name
    pub fn band(&self, name: &str) -> Result<&Raster<f64>> {
        self.bands
            .get(name)
            .ok_or_else(|| Error::MissingBand(name.to_string()))
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.contains_key(name)
    }

    /// Band names in sorted order
    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.keys().map(String::as_str)
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.0
    }

    pub fn cols(&self) -> usize {
        self.shape.1
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Every band cut to the pixel window covering `region`.
    ///
    /// See [`Raster::clip`]. Bands on different grids may clip to different
    /// shapes, which fails like any ragged stack.
    pub fn clip(&self, region: &BoundingBox) -> Result<BandRaster> {
        let bands = self
            .bands
            .iter()
            .map(|(name, raster)| Ok((name.clone(), raster.clip(region)?)))
            .collect::<Result<Vec<_>>>()?;
        BandRaster::new(bands, self.provenance.clone())
    }

    /// Georeferencing shared by the stack (taken from the first band).
    pub fn transform(&self) -> GeoTransform {
        self.bands
            .values()
            .next()
            .map(|r| *r.transform())
            .unwrap_or_default()
    }
}
