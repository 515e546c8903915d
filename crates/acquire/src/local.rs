//! Directory-backed scene catalog
//!
//! Layout: `<root>/<collection>/<scene-id>/scene.toml`, with one
//! single-band GeoTIFF per band next to the manifest. Fetched bands are
//! clipped to the request region using each file's georeferencing.
//!
//! ```toml
//! id = "S2B_20240612_T21LYG"
//! date = "2024-06-12"
//! cloud_cover = 3.4
//!
//! [footprint]
//! min_lon = -62.2
//! min_lat = -10.1
//! max_lon = -61.8
//! max_lat = -9.7
//!
//! [bands]
//! B04 = "B04.tif"
//! B08 = "B08.tif"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{AcquireError, Result};
use crate::request::AcquisitionRequest;
use crate::scene::{select_scene, SceneMeta};
use crate::source::BandSource;
use leona_core::io::read_geotiff;
use leona_core::{BandRaster, Raster};

/// File name of a scene manifest
pub const MANIFEST_FILE: &str = "scene.toml";

/// A scene catalog rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    root: PathBuf,
}

/// A manifest together with the directory it was read from.
#[derive(Debug, Clone)]
struct LocalScene {
    meta: SceneMeta,
    dir: PathBuf,
}

impl LocalCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parse one manifest; the collection defaults to the parent directory name.
    pub fn read_manifest(path: &Path, collection: &str) -> Result<SceneMeta> {
        let text = fs::read_to_string(path)?;
        let mut meta: SceneMeta = toml::from_str(&text).map_err(|source| AcquireError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        if meta.collection.is_empty() {
            meta.collection = collection.to_string();
        }
        Ok(meta)
    }

    /// All scenes of `collection`. A missing collection directory holds no scenes.
    pub fn scenes(&self, collection: &str) -> Result<Vec<SceneMeta>> {
        Ok(self.local_scenes(collection)?.into_iter().map(|s| s.meta).collect())
    }

    fn local_scenes(&self, collection: &str) -> Result<Vec<LocalScene>> {
        let dir = self.root.join(collection);
        if !dir.is_dir() {
            warn!(path = %dir.display(), "collection directory not found");
            return Ok(Vec::new());
        }

        let mut scenes = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let scene_dir = entry?.path();
            let manifest = scene_dir.join(MANIFEST_FILE);
            if !manifest.is_file() {
                continue;
            }
            let meta = Self::read_manifest(&manifest, collection)?;
            scenes.push(LocalScene {
                meta,
                dir: scene_dir,
            });
        }
        debug!(collection, scenes = scenes.len(), "scanned collection");
        Ok(scenes)
    }
}

impl BandSource for LocalCatalog {
    fn fetch_bands(&self, request: &AcquisitionRequest) -> Result<BandRaster> {
        let scenes = self.local_scenes(&request.collection)?;
        let meta = select_scene(scenes.iter().map(|s| &s.meta), request)?;
        let scene = scenes
            .iter()
            .find(|s| s.meta.id == meta.id)
            .ok_or_else(|| AcquireError::InvalidRequest(format!("scene {} not found", meta.id)))?;
        info!(
            scene = %meta.id,
            date = %meta.date,
            cloud_cover = ?meta.cloud_cover,
            "selected scene"
        );

        let names: Vec<&String> = if request.bands.is_empty() {
            meta.bands.keys().collect()
        } else {
            request.bands.iter().collect()
        };

        let mut bands = Vec::with_capacity(names.len());
        for name in names {
            let file = meta.bands.get(name).ok_or_else(|| AcquireError::MissingAsset {
                scene: meta.id.clone(),
                band: name.clone(),
            })?;
            let raster: Raster<f64> = read_geotiff(scene.dir.join(file))?;
            bands.push((name.clone(), raster.clip(&request.region)?));
        }

        let stack = BandRaster::new(bands, meta.provenance())?;
        debug!(scene = %meta.id, shape = ?stack.shape(), "clipped to region");
        Ok(stack)
    }
}
