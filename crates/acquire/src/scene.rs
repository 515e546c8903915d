//! Scene metadata and selection

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AcquireError, Result};
use crate::request::{AcquisitionRequest, SceneOrder};
use leona_core::{BoundingBox, Provenance};

/// Catalog entry describing one acquisition.
///
/// On disk this is the `scene.toml` manifest; `bands` maps band names to
/// GeoTIFF paths relative to the scene directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMeta {
    pub id: String,
    #[serde(default)]
    pub collection: String,
    pub date: NaiveDate,
    /// Percent; `None` when the provider does not report it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    pub footprint: BoundingBox,
    #[serde(default)]
    pub bands: BTreeMap<String, String>,
}

impl SceneMeta {
    pub fn has_band(&self, band: &str) -> bool {
        self.bands.contains_key(band)
    }

    pub fn provenance(&self) -> Provenance {
        let provenance = Provenance::new(self.collection.clone())
            .with_scene_id(self.id.clone())
            .with_date(self.date);
        match self.cloud_cover {
            Some(c) => provenance.with_cloud_cover(c),
            None => provenance,
        }
    }

    /// Whether this scene satisfies every filter of `request`.
    ///
    /// Unknown cloud cover passes the cloud filter.
    pub fn matches(&self, request: &AcquisitionRequest) -> bool {
        let cloud_ok = match (self.cloud_cover, request.max_cloud_cover) {
            (Some(cover), Some(limit)) => cover <= limit,
            _ => true,
        };
        self.collection == request.collection
            && request.time_range.contains(self.date)
            && cloud_ok
            && self.footprint.intersects(&request.region)
            && request.bands.iter().all(|b| self.has_band(b))
    }
}

fn cloud_key(scene: &SceneMeta) -> f64 {
    scene.cloud_cover.unwrap_or(f64::INFINITY)
}

fn compare(a: &SceneMeta, b: &SceneMeta, order: SceneOrder) -> Ordering {
    let by_cloud = cloud_key(a).total_cmp(&cloud_key(b));
    let by_recency = b.date.cmp(&a.date);
    match order {
        SceneOrder::LeastCloudy => by_cloud.then(by_recency),
        SceneOrder::MostRecent => by_recency.then(by_cloud),
    }
    .then_with(|| a.id.cmp(&b.id))
}

/// Pick the best scene for `request`, or fail with `DataUnavailable`.
pub fn select_scene<'a, I>(scenes: I, request: &AcquisitionRequest) -> Result<&'a SceneMeta>
where
    I: IntoIterator<Item = &'a SceneMeta>,
{
    let candidates: Vec<&SceneMeta> = scenes.into_iter().filter(|s| s.matches(request)).collect();
    debug!(
        search = %request.search_body(),
        candidates = candidates.len(),
        "scene search"
    );

    candidates
        .into_iter()
        .min_by(|a, b| compare(a, b, request.order))
        .ok_or_else(|| AcquireError::DataUnavailable {
            collection: request.collection.clone(),
            from: request.time_range.start_instant(),
            to: request.time_range.end_instant(),
        })
}
