//! Geocoding endpoint — free-text address to coordinates.
//!
//! Any outcome other than `OK` with a usable first result is fatal for the
//! whole discovery run: nothing downstream is meaningful without
//! coordinates.

use super::{Geometry, PlacesClient, ProviderStatus};
use crate::error::DiscoveryError;
use serde::{Deserialize, Serialize};

const GEOCODE_PATH: &str = "/maps/api/geocode/json";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: ProviderStatus,
    #[serde(default)]
    results: Vec<GeocodeEntry>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeEntry {
    formatted_address: Option<String>,
    geometry: Option<Geometry>,
}

/// A successfully geocoded address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedAddress {
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
}

/// Geocode a free-text address. Fatal on any non-OK status or when the
/// first result carries no geometry.
pub async fn geocode(
    client: &PlacesClient,
    address: &str,
) -> Result<GeocodedAddress, DiscoveryError> {
    let response: GeocodeResponse = client
        .get_json(GEOCODE_PATH, &[("address", address), ("key", client.key())])
        .await?;

    if response.status != ProviderStatus::Ok {
        let detail = response
            .error_message
            .unwrap_or_else(|| "no detail from provider".to_string());
        return Err(DiscoveryError::Geocoding(format!(
            "provider status {} ({detail})",
            response.status.as_str()
        )));
    }

    let first = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| DiscoveryError::Geocoding("OK status but empty results".to_string()))?;
    let geometry = first
        .geometry
        .ok_or_else(|| DiscoveryError::Geocoding("first result has no geometry".to_string()))?;

    Ok(GeocodedAddress {
        lat: geometry.location.lat,
        lng: geometry.location.lng,
        formatted_address: first
            .formatted_address
            .unwrap_or_else(|| address.to_string()),
    })
}
