//! # Leona Core
//!
//! Core value types for satellite change detection.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid
//! - `BandRaster`: A named stack of co-registered bands with provenance
//! - `ValidityMask`: Per-pixel usability flags
//! - `BoundingBox`: Geographic region of interest in decimal degrees
//! - Algorithm trait for consistent analysis APIs
//! - Native GeoTIFF I/O

pub mod bbox;
pub mod error;
pub mod io;
pub mod raster;

pub use bbox::BoundingBox;
pub use error::{Error, Result};
pub use raster::{
    BandRaster, GeoTransform, IndexRaster, Provenance, Raster, RasterElement, ValidityMask,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bbox::BoundingBox;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{
        BandRaster, GeoTransform, IndexRaster, Provenance, Raster, RasterElement, ValidityMask,
    };
    pub use crate::Algorithm;
}

/// Core trait for the analyses built on top of leona.
///
/// Analyses are pure functions that transform input rasters according to parameters.
pub trait Algorithm {
    /// Input type for the analysis
    type Input;
    /// Output type for the analysis
    type Output;
    /// Parameters controlling analysis behavior
    type Params: Default;
    /// Error type for analysis execution
    type Error: std::error::Error;

    /// Returns the analysis name
    fn name(&self) -> &'static str;

    /// Returns a description of what the analysis does
    fn description(&self) -> &'static str;

    /// Execute the analysis
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(
        &self,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
