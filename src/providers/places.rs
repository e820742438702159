//! Nearby-search and place-details endpoints.
//!
//! Nearby search is paginated: up to [`MAX_SEARCH_PAGES`] pages, with the
//! provider-mandated delay before each continuation token is used (the
//! token is not valid immediately after it is issued). `OK` and
//! `ZERO_RESULTS` are acceptable page statuses; anything else is fatal for
//! the run.
//!
//! Place details is per-candidate and recoverable: `ZERO_RESULTS`/
//! `NOT_FOUND` mean "skip this candidate", other failures bubble up as
//! ordinary errors for the orchestrator to record as warnings.

use super::{Geometry, PlacesClient, ProviderStatus};
use crate::error::DiscoveryError;
use anyhow::{bail, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const NEARBY_PATH: &str = "/maps/api/place/nearbysearch/json";
const DETAILS_PATH: &str = "/maps/api/place/details/json";

/// Maximum nearby-search pages per run.
pub const MAX_SEARCH_PAGES: usize = 3;

/// Mandatory wait before a continuation token may be used.
pub const PAGE_TOKEN_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    status: ProviderStatus,
    #[serde(default)]
    results: Vec<NearbyPlace>,
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

/// One place as returned by nearby search. Optional fields stay optional:
/// a missing rating is not zero.
#[derive(Debug, Clone, Deserialize)]
pub struct NearbyPlace {
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub price_level: Option<u8>,
    #[serde(default)]
    pub vicinity: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub business_status: Option<String>,
}

/// Run a paginated restaurant nearby search.
///
/// Stops early once `max_results` candidates have accumulated, once a page
/// carries no continuation token, or once a page returns zero results.
pub async fn nearby_search_paged(
    client: &PlacesClient,
    lat: f64,
    lng: f64,
    radius_meters: u32,
    max_results: usize,
) -> Result<Vec<NearbyPlace>, DiscoveryError> {
    let location = format!("{lat},{lng}");
    let radius = radius_meters.to_string();
    let mut places: Vec<NearbyPlace> = Vec::new();
    let mut page_token: Option<String> = None;

    for page in 0..MAX_SEARCH_PAGES {
        if let Some(token) = &page_token {
            // Provider contract: the token is not usable immediately.
            tokio::time::sleep(PAGE_TOKEN_DELAY).await;
            debug!("fetching nearby-search page {} with continuation token", page + 1);
            let response: NearbySearchResponse = client
                .get_json(
                    NEARBY_PATH,
                    &[("pagetoken", token.as_str()), ("key", client.key())],
                )
                .await?;
            if !append_page(response, &mut places, &mut page_token)? {
                break;
            }
        } else {
            let response: NearbySearchResponse = client
                .get_json(
                    NEARBY_PATH,
                    &[
                        ("location", location.as_str()),
                        ("radius", radius.as_str()),
                        ("type", "restaurant"),
                        ("key", client.key()),
                    ],
                )
                .await?;
            if !append_page(response, &mut places, &mut page_token)? {
                break;
            }
        }

        if places.len() >= max_results {
            break;
        }
    }

    Ok(places)
}

/// Fold one page into the accumulator. Returns whether pagination should
/// continue.
fn append_page(
    response: NearbySearchResponse,
    places: &mut Vec<NearbyPlace>,
    page_token: &mut Option<String>,
) -> Result<bool, DiscoveryError> {
    match response.status {
        ProviderStatus::Ok => {}
        ProviderStatus::ZeroResults => {
            *page_token = None;
            return Ok(false);
        }
        other => {
            let detail = response
                .error_message
                .unwrap_or_else(|| "no detail from provider".to_string());
            return Err(DiscoveryError::NearbySearch(format!(
                "provider status {} ({detail})",
                other.as_str()
            )));
        }
    }

    if response.results.is_empty() {
        *page_token = None;
        return Ok(false);
    }
    places.extend(response.results);
    *page_token = response.next_page_token;
    Ok(page_token.is_some())
}

#[derive(Debug, Deserialize)]
struct PlaceDetailsResponse {
    status: ProviderStatus,
    #[serde(default)]
    result: Option<PlaceDetails>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Fields requested from place details.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

/// Look up website/maps-url/address details for one place.
///
/// `Ok(None)` means the provider had no record (`ZERO_RESULTS`/`NOT_FOUND`);
/// skip the candidate. Other non-OK statuses are errors for the caller to
/// record as warnings.
pub async fn place_details(client: &PlacesClient, place_id: &str) -> Result<Option<PlaceDetails>> {
    let response: PlaceDetailsResponse = client
        .get_json(
            DETAILS_PATH,
            &[
                ("place_id", place_id),
                ("fields", "website,url,formatted_address"),
                ("key", client.key()),
            ],
        )
        .await?;

    match response.status {
        ProviderStatus::Ok => Ok(Some(response.result.unwrap_or_default())),
        ProviderStatus::ZeroResults | ProviderStatus::NotFound => Ok(None),
        other => {
            let detail = response
                .error_message
                .unwrap_or_else(|| "no detail from provider".to_string());
            bail!(
                "details for {place_id}: provider status {} ({detail})",
                other.as_str()
            )
        }
    }
}
