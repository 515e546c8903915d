//! # Leona Acquire
//!
//! The contract between change-detection analyses and whatever supplies
//! their imagery, plus two catalog implementations.
//!
//! - [`BandSource`]: fetch co-registered bands for a region and time window
//! - [`MemoryCatalog`]: scenes held in memory
//! - [`LocalCatalog`]: scenes stored as GeoTIFFs with a `scene.toml` manifest
//!
//! Every catalog selects scenes the same way: matching collection, date
//! inside the window, cloud cover within the limit, footprint intersecting
//! the region and all requested bands present. No match is the terminal
//! `DataUnavailable` error.

pub mod error;
pub mod local;
pub mod memory;
pub mod request;
pub mod scene;
pub mod source;
pub mod time_range;

pub use error::{AcquireError, Result};
pub use local::{LocalCatalog, MANIFEST_FILE};
pub use memory::MemoryCatalog;
pub use request::{AcquisitionRequest, SceneOrder};
pub use scene::{select_scene, SceneMeta};
pub use source::{fetch_pair, BandSource};
pub use time_range::TimeRange;
