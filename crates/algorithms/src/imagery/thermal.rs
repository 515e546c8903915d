//! Land surface temperature from thermal bands

use serde::{Deserialize, Serialize};

use super::band_math::band_math;
use leona_core::raster::Raster;
use leona_core::Result;

/// Kelvin to Celsius offset
pub const KELVIN_OFFSET: f64 = 273.15;

/// Linear calibration from a thermal product's digital numbers to Kelvin:
/// `kelvin = dn * scale + offset`.
///
/// The constants belong to a specific sensor/product and are configuration,
/// not physics. The default is the Landsat 8/9 Collection 2 Level-2
/// surface-temperature band (`ST_B10`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalCalibration {
    pub scale: f64,
    pub offset: f64,
}

impl ThermalCalibration {
    pub const LANDSAT_C2_L2: ThermalCalibration = ThermalCalibration {
        scale: 0.00341802,
        offset: 149.0,
    };

    /// Celsius value for one digital number
    pub fn celsius(&self, dn: f64) -> f64 {
        dn * self.scale + self.offset - KELVIN_OFFSET
    }
}

impl Default for ThermalCalibration {
    fn default() -> Self {
        Self::LANDSAT_C2_L2
    }
}

/// Land surface temperature in °C from a thermal digital-number raster.
pub fn lst_celsius(thermal: &Raster<f64>, calibration: &ThermalCalibration) -> Result<Raster<f64>> {
    let calibration = *calibration;
    band_math(thermal, move |dn| calibration.celsius(dn))
}
