//! What an analysis asks an acquisition channel for

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::time_range::TimeRange;
use leona_core::BoundingBox;

/// Which matching scene wins when several qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneOrder {
    /// Lowest cloud cover first, most recent on ties
    #[default]
    LeastCloudy,
    /// Most recent first, lowest cloud cover on ties
    MostRecent,
}

/// A request for co-registered bands over a region and time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionRequest {
    pub region: BoundingBox,
    pub time_range: TimeRange,
    pub bands: Vec<String>,
    pub collection: String,
    /// Scenes reporting more cloud cover (percent) are skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cloud_cover: Option<f64>,
    #[serde(default)]
    pub order: SceneOrder,
}

impl AcquisitionRequest {
    pub fn new(region: BoundingBox, time_range: TimeRange, collection: impl Into<String>) -> Self {
        Self {
            region,
            time_range,
            bands: Vec::new(),
            collection: collection.into(),
            max_cloud_cover: None,
            order: SceneOrder::default(),
        }
    }

    /// Set the band list.
    pub fn bands(mut self, bands: &[&str]) -> Self {
        self.bands = bands.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set the cloud cover limit in percent.
    pub fn max_cloud_cover(mut self, percent: f64) -> Self {
        self.max_cloud_cover = Some(percent);
        self
    }

    /// Set the scene preference.
    pub fn order(mut self, order: SceneOrder) -> Self {
        self.order = order;
        self
    }

    /// STAC item-search body for this request.
    ///
    /// The region goes out as a GeoJSON polygon under `intersects`; the
    /// cloud limit, when set, as an `eo:cloud_cover` query.
    pub fn search_body(&self) -> Value {
        let mut body = json!({
            "collections": [self.collection],
            "intersects": self.region.to_geojson_polygon(),
            "datetime": format!(
                "{}/{}",
                self.time_range.start_instant(),
                self.time_range.end_instant()
            ),
        });
        if let Some(limit) = self.max_cloud_cover {
            body["query"] = json!({ "eo:cloud_cover": { "lte": limit } });
        }
        body
    }
}
