//! The acquisition contract

use tracing::info;

use crate::error::Result;
use crate::request::AcquisitionRequest;
use leona_core::BandRaster;

/// Anything that can deliver co-registered bands for a region and window.
///
/// Implementations fail with `DataUnavailable` when no scene matches and
/// never retry internally.
pub trait BandSource: Send + Sync {
    fn fetch_bands(&self, request: &AcquisitionRequest) -> Result<BandRaster>;
}

impl<S: BandSource + ?Sized> BandSource for &S {
    fn fetch_bands(&self, request: &AcquisitionRequest) -> Result<BandRaster> {
        (**self).fetch_bands(request)
    }
}

/// Fetch the reference and recent rasters concurrently.
pub fn fetch_pair<S: BandSource + ?Sized>(
    source: &S,
    reference: &AcquisitionRequest,
    recent: &AcquisitionRequest,
) -> Result<(BandRaster, BandRaster)> {
    let (reference, recent) = rayon::join(
        || source.fetch_bands(reference),
        || source.fetch_bands(recent),
    );
    let (reference, recent) = (reference?, recent?);
    info!(
        reference = reference.provenance().scene_id.as_deref().unwrap_or("-"),
        recent = recent.provenance().scene_id.as_deref().unwrap_or("-"),
        "fetched scene pair"
    );
    Ok((reference, recent))
}
