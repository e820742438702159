//! Discovery orchestrator — the pipeline entry point.
//!
//! Sequences: config check → geocode → paginated nearby search →
//! filter/cap → per-candidate budgeted details lookup, website download,
//! and fingerprint/link extraction → assembled [`DiscoveryResult`].
//!
//! Two failure classes. Fatal (missing key, geocoding, nearby-search
//! provider error) aborts the run with a [`DiscoveryError`] and no partial
//! result. Everything per-candidate is recoverable: caught where it
//! happens, recorded as a warning string, and the run continues with the
//! next candidate.
//!
//! The run is sequential on purpose: the pagination token carries a
//! mandatory inter-page delay, and budget accounting must be deterministic.
//! Counters are plain local values threaded through the run, never shared
//! state.

use crate::config::Config;
use crate::discovery::types::{
    DiscoveredRestaurant, DiscoveryRequest, DiscoveryResult, DiscoveryStats, PlaceCandidate,
};
use crate::error::DiscoveryError;
use crate::fetch::SiteFetcher;
use crate::ordering::fingerprint::{self, PlatformFingerprint};
use crate::ordering::links::{self, LinkCandidate};
use crate::ordering::platform;
use crate::providers::{geocoding, places, PlacesClient};
use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

/// Meters per statute mile, for the radius conversion.
pub const METERS_PER_MILE: f64 = 1609.344;

/// The discovery pipeline. One instance may serve many runs; each run is
/// independent and shares no mutable state with any other.
pub struct Discovery {
    client: PlacesClient,
    fetcher: SiteFetcher,
}

impl Discovery {
    /// Build the pipeline from configuration. Fails fast when the API key
    /// is missing.
    pub fn new(config: &Config) -> Result<Self, DiscoveryError> {
        let key = config.require_api_key()?;
        Ok(Self {
            client: PlacesClient::new(key, &config.base_url),
            fetcher: SiteFetcher::new(&config.user_agent),
        })
    }

    /// Run one discovery pass.
    pub async fn run(&self, request: DiscoveryRequest) -> Result<DiscoveryResult, DiscoveryError> {
        let geo = geocoding::geocode(&self.client, &request.address).await?;
        info!(
            "geocoded \"{}\" to ({}, {})",
            request.address, geo.lat, geo.lng
        );

        let radius_meters = (request.radius_miles * METERS_PER_MILE).round() as u32;
        let found = places::nearby_search_paged(
            &self.client,
            geo.lat,
            geo.lng,
            radius_meters,
            request.max_results,
        )
        .await?;

        let mut stats = DiscoveryStats {
            candidates_from_places: found.len(),
            ..DiscoveryStats::default()
        };
        info!("nearby search returned {} candidates", found.len());

        // Filter: a missing rating or review count excludes the candidate —
        // absent data does not trivially pass.
        let filtered: Vec<PlaceCandidate> = found
            .into_iter()
            .map(PlaceCandidate::from)
            .filter(|c| {
                c.rating.is_some_and(|r| r >= request.min_rating)
                    && c.user_ratings_total
                        .is_some_and(|n| n >= request.min_reviews)
            })
            .collect();
        stats.after_filters = filtered.len();

        // Cap preserving provider order; no re-sort by rating.
        let capped: Vec<PlaceCandidate> =
            filtered.into_iter().take(request.max_results).collect();

        let mut warnings: Vec<String> = Vec::new();
        let mut restaurants: Vec<DiscoveredRestaurant> = Vec::new();
        for candidate in capped {
            let restaurant = self
                .resolve_candidate(&request, candidate, &mut stats, &mut warnings)
                .await;
            restaurants.push(restaurant);
        }

        append_budget_warnings(&request, &stats, restaurants.len(), &mut warnings);

        Ok(DiscoveryResult {
            input: request,
            geo,
            restaurants,
            stats,
            warnings,
            generated_at: Utc::now(),
        })
    }

    /// Resolve website and ordering data for one capped candidate, charging
    /// the two lookup budgets. Always produces a restaurant record; partial
    /// failures leave fields at their defaults and add a warning.
    async fn resolve_candidate(
        &self,
        request: &DiscoveryRequest,
        candidate: PlaceCandidate,
        stats: &mut DiscoveryStats,
        warnings: &mut Vec<String>,
    ) -> DiscoveredRestaurant {
        let mut maps_url = None;
        let mut address = candidate.vicinity.clone();
        let mut website_url: Option<String> = None;

        if request.fetch_websites && stats.website_lookups_attempted < request.max_website_lookups
        {
            stats.website_lookups_attempted += 1;
            match places::place_details(&self.client, &candidate.place_id).await {
                Ok(Some(details)) => {
                    stats.website_lookups_succeeded += 1;
                    website_url = details.website;
                    maps_url = details.url;
                    if details.formatted_address.is_some() {
                        address = details.formatted_address;
                    }
                }
                Ok(None) => {
                    stats.website_lookups_succeeded += 1;
                    debug!("no details record for {}", candidate.name);
                }
                Err(e) => {
                    warnings.push(format!("details lookup for {} failed: {e:#}", candidate.name));
                }
            }
        }

        let mut fingerprint: Option<PlatformFingerprint> = None;
        let mut ordering_links: Vec<LinkCandidate> = Vec::new();
        if request.discover_ordering_links
            && stats.ordering_link_lookups_attempted < request.max_ordering_link_lookups
        {
            if let Some(url) = &website_url {
                stats.ordering_link_lookups_attempted += 1;
                match self
                    .scan_website(url, request.max_ordering_candidates_per_restaurant)
                    .await
                {
                    Ok((fp, found)) => {
                        stats.ordering_link_lookups_succeeded += 1;
                        fingerprint = fp;
                        ordering_links = found;
                    }
                    Err(e) => {
                        warnings.push(format!(
                            "ordering-link scan for {} failed: {e:#}",
                            candidate.name
                        ));
                    }
                }
            }
        }

        let website_host = website_url
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .and_then(|u| u.host_str().map(str::to_string));

        // The page's own evidence outranks a host-only guess when it is at
        // least as confident and names a concrete platform.
        let static_signal = platform::classify(website_url.as_deref());
        let ordering_platform = match &fingerprint {
            Some(fp)
                if fp.primary.platform.is_known()
                    && (!static_signal.platform.is_known()
                        || fp.primary.confidence >= static_signal.confidence) =>
            {
                fp.primary.clone()
            }
            _ => static_signal,
        };

        DiscoveredRestaurant {
            name: candidate.name,
            place_id: candidate.place_id,
            maps_url,
            rating: candidate.rating,
            user_ratings_total: candidate.user_ratings_total,
            price_level: candidate.price_level,
            address,
            location: candidate.location,
            website_url,
            website_host,
            ordering_platform,
            ordering_platform_fingerprint: fingerprint,
            ordering_links,
        }
    }

    /// Download one website body and run the static fingerprinter and link
    /// extractor against it. `scraper` types are `!Send`, so the parse runs
    /// on a blocking thread.
    async fn scan_website(
        &self,
        url: &str,
        max_candidates: usize,
    ) -> anyhow::Result<(Option<PlatformFingerprint>, Vec<LinkCandidate>)> {
        let page = self.fetcher.get(url).await?;
        let base = page.final_url.clone();
        let body = page.body;
        let scanned = tokio::task::spawn_blocking(move || {
            let fp = fingerprint::fingerprint(&base, &body, fingerprint::DEFAULT_MAX_SIGNALS);
            let found = links::extract_links(&base, &body, max_candidates);
            (fp, found)
        })
        .await?;
        Ok(scanned)
    }
}

/// Summary warnings that explain degraded results without failing the call.
fn append_budget_warnings(
    request: &DiscoveryRequest,
    stats: &DiscoveryStats,
    restaurant_count: usize,
    warnings: &mut Vec<String>,
) {
    if request.fetch_websites && request.max_website_lookups == 0 {
        warnings.push(
            "website fetching is enabled but max_website_lookups is 0; no websites were looked up"
                .to_string(),
        );
    }
    if request.discover_ordering_links && request.max_ordering_link_lookups == 0 {
        warnings.push(
            "ordering-link discovery is enabled but max_ordering_link_lookups is 0; no links were scanned"
                .to_string(),
        );
    }
    if request.fetch_websites
        && request.max_website_lookups > 0
        && stats.website_lookups_attempted < restaurant_count
    {
        warn!(
            "website budget covered {} of {} restaurants",
            stats.website_lookups_attempted, restaurant_count
        );
        warnings.push(format!(
            "website lookups covered {} of {} restaurants (budget {})",
            stats.website_lookups_attempted, restaurant_count, request.max_website_lookups
        ));
    }
    if request.discover_ordering_links
        && request.max_ordering_link_lookups > 0
        && stats.ordering_link_lookups_attempted < restaurant_count
    {
        warnings.push(format!(
            "ordering-link scans covered {} of {} restaurants (budget {})",
            stats.ordering_link_lookups_attempted,
            restaurant_count,
            request.max_ordering_link_lookups
        ));
    }
}
