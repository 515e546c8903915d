//! Error types for acquisition channels.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors produced while locating or loading scenes.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// No scene matched the request; terminal for the analysis call.
    #[error("no {collection} scene available between {from} and {to}")]
    DataUnavailable {
        collection: String,
        from: String,
        to: String,
    },

    #[error("invalid time range: {start} is after {end}")]
    InvalidTimeRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("scene {scene} has no asset for band {band}")]
    MissingAsset { scene: String, band: String },

    #[error("invalid scene manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] leona_core::Error),
}

/// Result alias for acquisition operations.
pub type Result<T> = std::result::Result<T, AcquireError>;
