//! Request, candidate, and result types for a discovery run.

use crate::ordering::fingerprint::PlatformFingerprint;
use crate::ordering::links::LinkCandidate;
use crate::ordering::platform::PlatformSignal;
use crate::providers::geocoding::GeocodedAddress;
use crate::providers::places::NearbyPlace;
use crate::providers::LatLng;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-supplied parameters and budgets for one discovery run.
///
/// Numeric bounds are enforced at the CLI boundary before the core runs;
/// the core treats every field as a trusted budget and never recomputes
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub address: String,
    pub radius_miles: f64,
    pub min_rating: f64,
    pub min_reviews: u32,
    pub max_results: usize,
    pub fetch_websites: bool,
    pub max_website_lookups: usize,
    pub discover_ordering_links: bool,
    pub max_ordering_link_lookups: usize,
    pub max_ordering_candidates_per_restaurant: usize,
}

impl DiscoveryRequest {
    /// A request with moderate defaults for the given address.
    pub fn for_address(address: &str) -> Self {
        Self {
            address: address.to_string(),
            radius_miles: 2.0,
            min_rating: 4.0,
            min_reviews: 25,
            max_results: 10,
            fetch_websites: true,
            max_website_lookups: 10,
            discover_ordering_links: true,
            max_ordering_link_lookups: 10,
            max_ordering_candidates_per_restaurant: 3,
        }
    }
}

/// An unconfirmed restaurant from nearby search, before filtering/capping.
/// Internal to the pipeline; never part of the output.
#[derive(Debug, Clone)]
pub struct PlaceCandidate {
    pub place_id: String,
    pub name: String,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub price_level: Option<u8>,
    pub vicinity: Option<String>,
    pub location: Option<LatLng>,
    pub business_status: Option<String>,
}

impl From<NearbyPlace> for PlaceCandidate {
    fn from(place: NearbyPlace) -> Self {
        Self {
            place_id: place.place_id,
            name: place.name,
            rating: place.rating,
            user_ratings_total: place.user_ratings_total,
            price_level: place.price_level,
            vicinity: place.vicinity,
            location: place.geometry.map(|g| g.location),
            business_status: place.business_status,
        }
    }
}

/// One discovered restaurant. Assembled once per surviving candidate and
/// never mutated after assembly; fields default to `None`/empty when a
/// budgeted step failed or was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredRestaurant {
    pub name: String,
    pub place_id: String,
    pub maps_url: Option<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub price_level: Option<u8>,
    pub address: Option<String>,
    pub location: Option<LatLng>,
    pub website_url: Option<String>,
    pub website_host: Option<String>,
    pub ordering_platform: PlatformSignal,
    pub ordering_platform_fingerprint: Option<PlatformFingerprint>,
    pub ordering_links: Vec<LinkCandidate>,
}

/// Budget accounting for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryStats {
    pub candidates_from_places: usize,
    pub after_filters: usize,
    pub website_lookups_attempted: usize,
    pub website_lookups_succeeded: usize,
    pub ordering_link_lookups_attempted: usize,
    pub ordering_link_lookups_succeeded: usize,
}

/// Terminal value of one discovery run. Created once per invocation and
/// returned to the caller; never persisted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub input: DiscoveryRequest,
    pub geo: GeocodedAddress,
    pub restaurants: Vec<DiscoveredRestaurant>,
    pub stats: DiscoveryStats,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}
