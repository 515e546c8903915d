//! Geographic bounding box in decimal degrees

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::GeoTransform;

/// An axis-aligned lon/lat rectangle.
///
/// The invariant `min < max` on both axes is checked at construction, and
/// the box cannot be mutated afterwards. Deserialization goes through the
/// same validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoundingBox")]
pub struct BoundingBox {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

#[derive(Deserialize)]
struct RawBoundingBox {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl TryFrom<RawBoundingBox> for BoundingBox {
    type Error = Error;

    fn try_from(raw: RawBoundingBox) -> Result<Self> {
        Self::new(raw.min_lon, raw.min_lat, raw.max_lon, raw.max_lat)
    }
}

impl BoundingBox {
    /// Create a bounding box, validating coordinate ranges and ordering.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        let coords = [min_lon, min_lat, max_lon, max_lat];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(invalid(format!("non-finite coordinate in {:?}", coords)));
        }
        if !(-180.0..=180.0).contains(&min_lon) || !(-180.0..=180.0).contains(&max_lon) {
            return Err(invalid(format!(
                "longitude outside [-180, 180]: {} / {}",
                min_lon, max_lon
            )));
        }
        if !(-90.0..=90.0).contains(&min_lat) || !(-90.0..=90.0).contains(&max_lat) {
            return Err(invalid(format!(
                "latitude outside [-90, 90]: {} / {}",
                min_lat, max_lat
            )));
        }
        if min_lon >= max_lon {
            return Err(invalid(format!("min_lon {} >= max_lon {}", min_lon, max_lon)));
        }
        if min_lat >= max_lat {
            return Err(invalid(format!("min_lat {} >= max_lat {}", min_lat, max_lat)));
        }

        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    /// Longitudinal span in degrees
    pub fn width_deg(&self) -> f64 {
        (self.max_lon - self.min_lon).abs()
    }

    /// Latitudinal span in degrees
    pub fn height_deg(&self) -> f64 {
        (self.max_lat - self.min_lat).abs()
    }

    /// Mean latitude of the box
    pub fn center_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }

    /// Whether two boxes share any area (touching edges do not count).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon < other.max_lon
            && other.min_lon < self.max_lon
            && self.min_lat < other.max_lat
            && other.min_lat < self.max_lat
    }

    /// Closed GeoJSON polygon ring (counter-clockwise, five vertices).
    pub fn to_geojson_polygon(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "Polygon",
            "coordinates": [[
                [self.min_lon, self.min_lat],
                [self.max_lon, self.min_lat],
                [self.max_lon, self.max_lat],
                [self.min_lon, self.max_lat],
                [self.min_lon, self.min_lat]
            ]]
        })
    }

    /// North-up lon/lat geotransform covering this box with a `rows x cols` grid.
    pub fn geotransform(&self, rows: usize, cols: usize) -> GeoTransform {
        let rows = rows.max(1) as f64;
        let cols = cols.max(1) as f64;
        GeoTransform::new(
            self.min_lon,
            self.max_lat,
            self.width_deg() / cols,
            -self.height_deg() / rows,
        )
    }
}

fn invalid(reason: String) -> Error {
    Error::InvalidBoundingBox { reason }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Parses `"min_lon,min_lat,max_lon,max_lat"`.
impl FromStr for BoundingBox {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(invalid(format!(
                "expected 'min_lon,min_lat,max_lon,max_lat', got '{}'",
                s
            )));
        }
        let mut coords = [0.0; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            *slot = part
                .parse::<f64>()
                .map_err(|e| invalid(format!("'{}': {}", part, e)))?;
        }
        Self::new(coords[0], coords[1], coords[2], coords[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_valid_box() {
        let bbox = BoundingBox::new(10.0, 45.0, 10.5, 45.25).unwrap();
        assert_relative_eq!(bbox.width_deg(), 0.5);
        assert_relative_eq!(bbox.height_deg(), 0.25);
        assert_relative_eq!(bbox.center_lat(), 45.125);
    }

    #[test]
    fn test_rejects_inverted_axes() {
        assert!(BoundingBox::new(1.0, 0.0, 0.0, 1.0).is_err());
        assert!(BoundingBox::new(0.0, 1.0, 1.0, 1.0).is_err());
        assert!(BoundingBox::new(0.0, 0.0, f64::NAN, 1.0).is_err());
        assert!(BoundingBox::new(0.0, -91.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_parse() {
        let bbox: BoundingBox = "0, 0, 0.01, 0.01".parse().unwrap();
        assert_eq!(bbox.max_lon(), 0.01);
        assert!("0,0,1".parse::<BoundingBox>().is_err());
        assert!("a,b,c,d".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: BoundingBox = serde_json::from_str(
            r#"{"min_lon": 0.0, "min_lat": 0.0, "max_lon": 1.0, "max_lat": 1.0}"#,
        )
        .unwrap();
        assert_eq!(ok.max_lat(), 1.0);

        let bad = serde_json::from_str::<BoundingBox>(
            r#"{"min_lon": 2.0, "min_lat": 0.0, "max_lon": 1.0, "max_lat": 1.0}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_geojson_ring_is_closed() {
        let bbox = BoundingBox::new(-3.75, 40.38, -3.65, 40.45).unwrap();
        let poly = bbox.to_geojson_polygon();
        let ring = poly["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
        assert_eq!(poly["type"], "Polygon");
    }

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let b = BoundingBox::new(0.5, 0.5, 2.0, 2.0).unwrap();
        let c = BoundingBox::new(1.0, 0.0, 2.0, 1.0).unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_geotransform_covers_box() {
        let bbox = BoundingBox::new(10.0, 40.0, 11.0, 41.0).unwrap();
        let gt = bbox.geotransform(100, 200);
        let (min_x, min_y, max_x, max_y) = gt.bounds(200, 100);
        assert_relative_eq!(min_x, 10.0, epsilon = 1e-10);
        assert_relative_eq!(min_y, 40.0, epsilon = 1e-10);
        assert_relative_eq!(max_x, 11.0, epsilon = 1e-10);
        assert_relative_eq!(max_y, 41.0, epsilon = 1e-10);
    }
}
