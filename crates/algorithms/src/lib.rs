//! # Leona Algorithms
//!
//! Raster change detection for satellite imagery.
//!
//! ## Modules
//!
//! - **imagery**: Spectral indices, decibel conversion, land surface temperature
//! - **masking**: Scene-classification, data-mask and value-range validity
//! - **change**: Two-period deltas, thresholds, detection masks
//! - **statistics**: Area conversion and zonal reduction
//! - **report**: Rounded, serializable result records
//! - **analysis**: Deforestation, irrigation and urban heat pipelines

pub mod analysis;
pub mod change;
pub mod imagery;
pub mod masking;
pub(crate) mod maybe_rayon;
pub mod report;
pub mod statistics;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analysis::{
        analyze_urban_heat, detect_deforestation, detect_irrigation, Deforestation,
        DeforestationInput, DeforestationParams, Irrigation, IrrigationInput, IrrigationParams,
        UrbanHeat, UrbanHeatInput, UrbanHeatParams,
    };
    pub use crate::change::{
        ChangeDetection, ChangeDetector, CombineRule, DeltaConvention, Direction, IndexChange,
        ThresholdSet,
    };
    pub use crate::imagery::{
        band_difference, band_math, lst_celsius, nbr, ndvi, ndwi, normalized_difference,
        to_decibels, SpectralIndex, ThermalCalibration,
    };
    pub use crate::masking::{validity_mask, MaskingRules, SceneClass, ValueRange};
    pub use crate::report::{AnalysisOutput, DataStatus, DetectionResult};
    pub use crate::statistics::{pixel_area_km2, reduce, ZonalStats};
    pub use leona_core::prelude::*;
}
