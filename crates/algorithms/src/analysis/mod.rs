//! Analysis pipelines
//!
//! Each analysis configures the shared band algebra, masking, detection and
//! statistics stages with its own bands, masking rules and thresholds:
//!
//! - **deforestation**: NDVI and NBR loss between two optical acquisitions
//! - **irrigation**: NDWI gain fused with VV backscatter drop
//! - **urban_heat**: single-date land surface temperature hotspots

pub mod deforestation;
pub mod irrigation;
pub mod urban_heat;

pub use deforestation::{
    detect_deforestation, Deforestation, DeforestationInput, DeforestationParams,
    DeforestationQuality, DeforestationReport, OpticalBands,
};
pub use irrigation::{
    detect_irrigation, FusionBands, Irrigation, IrrigationInput, IrrigationParams,
    IrrigationReport,
};
pub use urban_heat::{
    analyze_urban_heat, HeatDataQuality, TemperatureAnalysis, ThermalBands, UrbanHeat,
    UrbanHeatInput, UrbanHeatParams, UrbanHeatReport, VegetationAnalysis, VegetationHealth,
};
