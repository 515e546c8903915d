//! Optional TOML configuration
//!
//! ```toml
//! [deforestation]
//! dNDVI = 0.35
//!
//! [irrigation]
//! dNDWI = 0.08
//! dVV_dB = 1.5
//!
//! [urban_heat]
//! calibration = { scale = 0.00341802, offset = 149.0 }
//! pixel_size_m = 30.0
//! ```
//!
//! Command-line flags win over the file, the file wins over built-in defaults.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use leona_algorithms::change::ThresholdSet;
use leona_algorithms::imagery::ThermalCalibration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub deforestation: ThresholdSet,
    pub irrigation: ThresholdSet,
    pub urban_heat: UrbanHeatConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrbanHeatConfig {
    pub calibration: Option<ThermalCalibration>,
    pub pixel_size_m: Option<f64>,
}

impl Config {
    /// Load `path`, or the empty configuration when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }
}

/// `defaults`, then the file's entries, then the flags that were given.
///
/// Non-finite values are rejected: they would silently detect nothing.
pub fn resolve_thresholds(
    defaults: ThresholdSet,
    file: &ThresholdSet,
    flags: &[(&str, Option<f64>)],
) -> Result<ThresholdSet> {
    let mut thresholds = defaults.merged(file);
    for (name, value) in flags {
        if let Some(value) = value {
            thresholds.set(*name, *value);
        }
    }
    let malformed = thresholds.malformed();
    if !malformed.is_empty() {
        bail!("Thresholds must be finite numbers: {}", malformed.join(", "));
    }
    Ok(thresholds)
}
