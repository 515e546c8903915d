//! Change detection
//!
//! Per-index temporal deltas tested against named thresholds and combined
//! into a single detection mask.

mod detector;
mod thresholds;

pub use detector::{
    ChangeDetection, ChangeDetector, CombineRule, DeltaConvention, Direction, IndexChange,
    IndexDelta,
};
pub use thresholds::{ThresholdSet, DNBR, DNDVI, DNDWI, DVV_DB};
