//! `dinescout discover <address>` — run the full discovery pipeline.

use crate::cli;
use crate::config::Config;
use crate::discovery::{Discovery, DiscoveryRequest, DiscoveryResult};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Documented input bounds, applied here at the CLI boundary. The core
/// trusts its budgets and never recomputes them.
const RADIUS_MILES_RANGE: (f64, f64) = (0.1, 30.0);
const MIN_RATING_RANGE: (f64, f64) = (0.0, 5.0);
const MAX_RESULTS_RANGE: (usize, usize) = (1, 60);
const MAX_LOOKUPS_CAP: usize = 60;
const MAX_CANDIDATES_RANGE: (usize, usize) = (1, 10);

/// Clamp a raw request into the documented bounds.
pub fn clamp_request(mut request: DiscoveryRequest) -> DiscoveryRequest {
    request.radius_miles = request
        .radius_miles
        .clamp(RADIUS_MILES_RANGE.0, RADIUS_MILES_RANGE.1);
    request.min_rating = request
        .min_rating
        .clamp(MIN_RATING_RANGE.0, MIN_RATING_RANGE.1);
    request.max_results = request
        .max_results
        .clamp(MAX_RESULTS_RANGE.0, MAX_RESULTS_RANGE.1);
    request.max_website_lookups = request.max_website_lookups.min(MAX_LOOKUPS_CAP);
    request.max_ordering_link_lookups = request.max_ordering_link_lookups.min(MAX_LOOKUPS_CAP);
    request.max_ordering_candidates_per_restaurant = request
        .max_ordering_candidates_per_restaurant
        .clamp(MAX_CANDIDATES_RANGE.0, MAX_CANDIDATES_RANGE.1);
    request
}

/// Run the discover command.
pub async fn run(request: DiscoveryRequest) -> Result<()> {
    let request = clamp_request(request);
    let config = Config::from_env();
    let discovery = Discovery::new(&config)?;

    let spinner = if !cli::is_json() && !cli::is_quiet() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("discovering restaurants near {}", request.address));
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let result = discovery.run(request).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let result = result?;

    if cli::is_json() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_human(&result);
    }
    Ok(())
}

fn print_human(result: &DiscoveryResult) {
    println!(
        "Found {} restaurant(s) near {} ({:.4}, {:.4})",
        result.restaurants.len(),
        result.geo.formatted_address,
        result.geo.lat,
        result.geo.lng
    );
    println!();

    for restaurant in &result.restaurants {
        let rating = restaurant
            .rating
            .map(|r| format!("{r:.1}"))
            .unwrap_or_else(|| "-".to_string());
        let reviews = restaurant
            .user_ratings_total
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {} [{rating}★, {reviews} reviews]", restaurant.name);
        if let Some(address) = &restaurant.address {
            println!("    {address}");
        }
        if let Some(website) = &restaurant.website_url {
            println!("    website:  {website}");
        }
        println!(
            "    platform: {} ({:?}) — {}",
            restaurant.ordering_platform.label,
            restaurant.ordering_platform.confidence,
            restaurant.ordering_platform.reason
        );
        for link in &restaurant.ordering_links {
            let label = if link.label.is_empty() {
                "(no text)"
            } else {
                link.label.as_str()
            };
            println!("    order:    {} — {label}", link.url);
        }
        println!();
    }

    let s = &result.stats;
    println!(
        "Stats: {} from places, {} after filters; website lookups {}/{}, link scans {}/{}",
        s.candidates_from_places,
        s.after_filters,
        s.website_lookups_succeeded,
        s.website_lookups_attempted,
        s.ordering_link_lookups_succeeded,
        s.ordering_link_lookups_attempted
    );
    for warning in &result.warnings {
        println!("  warning: {warning}");
    }
}
