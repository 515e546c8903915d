//! In-memory scene catalog

use std::collections::BTreeMap;

use tracing::info;

use crate::error::Result;
use crate::request::AcquisitionRequest;
use crate::scene::{select_scene, SceneMeta};
use crate::source::BandSource;
use leona_core::BandRaster;

/// Scenes held in memory, e.g. already-decoded rasters or test fixtures.
///
/// Scenes are keyed by id; inserting an existing id replaces the scene.
/// Rasters must carry their georeferencing: fetches clip them to the
/// request region.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    scenes: BTreeMap<String, (SceneMeta, BandRaster)>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scene; the band list of `meta` is taken from `raster`.
    pub fn insert(&mut self, mut meta: SceneMeta, raster: BandRaster) {
        meta.bands = raster
            .band_names()
            .map(|name| (name.to_string(), name.to_string()))
            .collect();
        self.scenes.insert(meta.id.clone(), (meta, raster));
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

impl BandSource for MemoryCatalog {
    fn fetch_bands(&self, request: &AcquisitionRequest) -> Result<BandRaster> {
        let meta = select_scene(self.scenes.values().map(|(meta, _)| meta), request)?;
        let raster = &self.scenes[&meta.id].1;
        info!(scene = %meta.id, date = %meta.date, "selected scene");

        let names: Vec<&str> = if request.bands.is_empty() {
            raster.band_names().collect()
        } else {
            request.bands.iter().map(String::as_str).collect()
        };
        let bands = names
            .into_iter()
            .map(|name| Ok((name, raster.band(name)?.clip(&request.region)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(BandRaster::new(bands, meta.provenance())?)
    }
}
