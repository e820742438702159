//! Fatal error class for a discovery run.
//!
//! Only run-aborting conditions live here. Per-candidate failures (details
//! lookup, website fetch, parse) are recoverable and become human-readable
//! strings in `DiscoveryResult::warnings` instead.

use thiserror::Error;

/// Errors that abort a whole discovery run. No partial result is returned
/// alongside these: without coordinates or a candidate list nothing
/// downstream is meaningful.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("places API key not configured; set DINESCOUT_API_KEY or GOOGLE_MAPS_API_KEY")]
    MissingApiKey,

    #[error("geocoding failed: {0}")]
    Geocoding(String),

    #[error("nearby search failed: {0}")]
    NearbySearch(String),

    #[error("provider transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
