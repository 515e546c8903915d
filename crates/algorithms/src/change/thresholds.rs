//! Named detection thresholds

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use leona_core::{Error, Result};

/// Minimum NDVI loss (reference − recent)
pub const DNDVI: &str = "dNDVI";
/// Minimum NBR loss (reference − recent)
pub const DNBR: &str = "dNBR";
/// Minimum NDWI increase (recent − reference)
pub const DNDWI: &str = "dNDWI";
/// Minimum VV backscatter decrease in dB (magnitude)
pub const DVV_DB: &str = "dVV_dB";

/// Scalar thresholds keyed by name, fixed for the duration of one analysis.
///
/// Serializes as a flat map, e.g. `{"dNDVI": 0.3, "dNBR": 0.2}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdSet {
    values: BTreeMap<String, f64>,
}

impl ThresholdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Threshold by name, failing with `MissingThreshold` when absent.
    pub fn require(&self, name: &str) -> Result<f64> {
        self.get(name)
            .ok_or_else(|| Error::MissingThreshold(name.to_string()))
    }

    /// This set with every entry of `overrides` replacing or adding to it.
    pub fn merged(&self, overrides: &ThresholdSet) -> ThresholdSet {
        let mut values = self.values.clone();
        values.extend(overrides.values.iter().map(|(k, v)| (k.clone(), *v)));
        ThresholdSet { values }
    }

    /// Names of entries that are not finite numbers; such a threshold never fires.
    pub fn malformed(&self) -> Vec<String> {
        self.values
            .iter()
            .filter(|(_, v)| !v.is_finite())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Copy with every non-finite entry replaced by 0.0, for output records.
    pub fn finite_or_zero(&self) -> ThresholdSet {
        let values = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), if v.is_finite() { *v } else { 0.0 }))
            .collect();
        ThresholdSet { values }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        let t = ThresholdSet::new().with(DNDVI, 0.3);
        assert_eq!(t.require(DNDVI).unwrap(), 0.3);
        assert!(matches!(t.require(DNBR), Err(Error::MissingThreshold(_))));
    }

    #[test]
    fn test_merge_overrides() {
        let defaults = ThresholdSet::new().with(DNDVI, 0.3).with(DNBR, 0.2);
        let overrides = ThresholdSet::new().with(DNBR, 0.25);
        let merged = defaults.merged(&overrides);
        assert_eq!(merged.get(DNDVI), Some(0.3));
        assert_eq!(merged.get(DNBR), Some(0.25));
        assert_eq!(defaults.get(DNBR), Some(0.2));
    }

    #[test]
    fn test_non_finite_entries() {
        let t = ThresholdSet::new()
            .with(DNDVI, f64::NAN)
            .with(DNBR, 0.2)
            .with(DVV_DB, f64::INFINITY);
        assert_eq!(t.malformed(), vec![DNDVI.to_string(), DVV_DB.to_string()]);

        let clean = t.finite_or_zero();
        assert_eq!(clean.get(DNDVI), Some(0.0));
        assert_eq!(clean.get(DNBR), Some(0.2));
        assert!(clean.malformed().is_empty());
        assert!(t.get(DNDVI).unwrap().is_nan());
    }

    #[test]
    fn test_serde_flat_map() {
        let t = ThresholdSet::new().with(DNDWI, 0.05).with(DVV_DB, 1.0);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"dNDWI":0.05,"dVV_dB":1.0}"#);
        let back: ThresholdSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
