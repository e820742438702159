//! End-to-end discovery runs against mock provider endpoints.

use dinescout::config::Config;
use dinescout::discovery::{Discovery, DiscoveryRequest};
use dinescout::error::DiscoveryError;
use dinescout::ordering::platform::{Confidence, OrderingPlatform};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> Config {
    Config {
        api_key: Some("test-key".to_string()),
        base_url: server.uri(),
        user_agent: "dinescout-tests".to_string(),
    }
}

fn geocode_ok() -> serde_json::Value {
    json!({
        "status": "OK",
        "results": [{
            "formatted_address": "600 Congress Ave, Austin, TX 78701, USA",
            "geometry": { "location": { "lat": 30.27, "lng": -97.74 } }
        }]
    })
}

async fn mount_geocode_ok(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_ok()))
        .mount(server)
        .await;
}

fn nearby_place(id: &str, name: &str, rating: f64, reviews: u32) -> serde_json::Value {
    json!({
        "place_id": id,
        "name": name,
        "rating": rating,
        "user_ratings_total": reviews,
        "vicinity": "123 Main St",
        "geometry": { "location": { "lat": 30.2701, "lng": -97.7401 } },
        "business_status": "OPERATIONAL"
    })
}

#[tokio::test]
async fn test_zero_results_run_is_empty_not_fatal() {
    let server = MockServer::start().await;
    mount_geocode_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "ZERO_RESULTS", "results": [] })),
        )
        .mount(&server)
        .await;

    let discovery = Discovery::new(&test_config(&server)).unwrap();
    let result = discovery
        .run(DiscoveryRequest::for_address("600 Congress Ave"))
        .await
        .unwrap();

    assert_eq!(result.geo.lat, 30.27);
    assert_eq!(result.geo.lng, -97.74);
    assert!(result.restaurants.is_empty());
    assert_eq!(result.stats.candidates_from_places, 0);
    assert_eq!(result.stats.after_filters, 0);
}

#[tokio::test]
async fn test_geocoding_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "results": [],
            "error_message": "The provided API key is invalid."
        })))
        .mount(&server)
        .await;

    let discovery = Discovery::new(&test_config(&server)).unwrap();
    let err = discovery
        .run(DiscoveryRequest::for_address("nowhere"))
        .await
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::Geocoding(_)));
    assert!(err.to_string().contains("REQUEST_DENIED"));
}

#[tokio::test]
async fn test_nearby_search_provider_error_is_fatal() {
    let server = MockServer::start().await;
    mount_geocode_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "OVER_QUERY_LIMIT", "results": [] })),
        )
        .mount(&server)
        .await;

    let discovery = Discovery::new(&test_config(&server)).unwrap();
    let err = discovery
        .run(DiscoveryRequest::for_address("600 Congress Ave"))
        .await
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::NearbySearch(_)));
}

#[tokio::test]
async fn test_missing_api_key_fails_fast() {
    let config = Config {
        api_key: None,
        base_url: "http://localhost:1".to_string(),
        user_agent: "dinescout-tests".to_string(),
    };
    assert!(matches!(
        Discovery::new(&config),
        Err(DiscoveryError::MissingApiKey)
    ));
}

#[tokio::test]
async fn test_toast_website_happy_path() {
    let server = MockServer::start().await;
    mount_geocode_ok(&server).await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [nearby_place("p1", "Taco Casa", 4.6, 320)]
        })))
        .mount(&server)
        .await;

    let website = format!("{}/site", server.uri());
    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .and(query_param("place_id", "p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "result": {
                "website": website,
                "url": "https://maps.example/place/p1",
                "formatted_address": "123 Main St, Austin, TX 78701"
            }
        })))
        .mount(&server)
        .await;

    let html = r#"
    <html><head>
    <script src="https://cdn.toasttab.com/widget.js"></script>
    <script src="https://cdn.toasttab.com/menu.js"></script>
    <script src="https://order.toasttab.com/embed.js"></script>
    </head><body>
    <a href="https://order.toasttab.com/taco-casa">Order Online</a>
    </body></html>
    "#;
    Mock::given(method("GET"))
        .and(path("/site"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    let discovery = Discovery::new(&test_config(&server)).unwrap();
    let mut request = DiscoveryRequest::for_address("600 Congress Ave");
    request.max_website_lookups = 1;
    request.max_ordering_link_lookups = 1;
    let result = discovery.run(request).await.unwrap();

    assert_eq!(result.restaurants.len(), 1);
    let restaurant = &result.restaurants[0];
    assert_eq!(restaurant.name, "Taco Casa");
    assert_eq!(restaurant.address.as_deref(), Some("123 Main St, Austin, TX 78701"));
    assert!(restaurant.website_url.is_some());

    // Three script hits → aggregate 9 → high; the fingerprint outranks the
    // host-only classification of the (mock-hosted) website URL.
    assert_eq!(restaurant.ordering_platform.platform, OrderingPlatform::Toast);
    assert_eq!(restaurant.ordering_platform.confidence, Confidence::High);
    let fp = restaurant.ordering_platform_fingerprint.as_ref().unwrap();
    assert_eq!(fp.primary.platform, OrderingPlatform::Toast);

    assert!(!restaurant.ordering_links.is_empty());
    assert!(restaurant.ordering_links[0].url.contains("order.toasttab.com"));

    assert_eq!(result.stats.website_lookups_attempted, 1);
    assert_eq!(result.stats.website_lookups_succeeded, 1);
    assert_eq!(result.stats.ordering_link_lookups_attempted, 1);
    assert_eq!(result.stats.ordering_link_lookups_succeeded, 1);
    assert!(result.warnings.is_empty());
}

#[tokio::test]
async fn test_filters_exclude_missing_and_low_fields() {
    let server = MockServer::start().await;
    mount_geocode_ok(&server).await;

    // One passes; one has no rating at all; one rates too low; one has too
    // few reviews. Missing values do not trivially pass.
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                nearby_place("p1", "Keeper", 4.5, 100),
                { "place_id": "p2", "name": "No Rating" },
                nearby_place("p3", "Low Rating", 3.1, 500),
                nearby_place("p4", "Few Reviews", 4.9, 3),
            ]
        })))
        .mount(&server)
        .await;

    let discovery = Discovery::new(&test_config(&server)).unwrap();
    let mut request = DiscoveryRequest::for_address("600 Congress Ave");
    request.fetch_websites = false;
    request.discover_ordering_links = false;
    let result = discovery.run(request).await.unwrap();

    assert_eq!(result.stats.candidates_from_places, 4);
    assert_eq!(result.stats.after_filters, 1);
    assert_eq!(result.restaurants.len(), 1);
    assert_eq!(result.restaurants[0].name, "Keeper");
    // No website was looked up, so the platform signal is Unknown.
    assert_eq!(
        result.restaurants[0].ordering_platform.platform,
        OrderingPlatform::Unknown
    );
    assert_eq!(result.stats.website_lookups_attempted, 0);
}

#[tokio::test]
async fn test_budget_caps_lookups_and_warns_on_shortfall() {
    let server = MockServer::start().await;
    mount_geocode_ok(&server).await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                nearby_place("p1", "First", 4.5, 100),
                nearby_place("p2", "Second", 4.4, 90),
                nearby_place("p3", "Third", 4.3, 80),
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "result": { "formatted_address": "somewhere" }
        })))
        .mount(&server)
        .await;

    let discovery = Discovery::new(&test_config(&server)).unwrap();
    let mut request = DiscoveryRequest::for_address("600 Congress Ave");
    request.max_website_lookups = 1;
    request.discover_ordering_links = false;
    let result = discovery.run(request).await.unwrap();

    assert_eq!(result.restaurants.len(), 3);
    assert_eq!(result.stats.website_lookups_attempted, 1);
    assert_eq!(result.stats.website_lookups_succeeded, 1);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("1 of 3")));

    // Invariants.
    let s = &result.stats;
    assert!(s.after_filters <= s.candidates_from_places);
    assert!(s.website_lookups_succeeded <= s.website_lookups_attempted);
    assert!(s.website_lookups_attempted <= request_budget_min(1, s.after_filters));
}

fn request_budget_min(budget: usize, after_filters: usize) -> usize {
    budget.min(after_filters)
}

#[tokio::test]
async fn test_enabled_but_zero_budget_warns() {
    let server = MockServer::start().await;
    mount_geocode_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [nearby_place("p1", "Only", 4.5, 100)]
        })))
        .mount(&server)
        .await;

    let discovery = Discovery::new(&test_config(&server)).unwrap();
    let mut request = DiscoveryRequest::for_address("600 Congress Ave");
    request.max_website_lookups = 0;
    request.max_ordering_link_lookups = 0;
    let result = discovery.run(request).await.unwrap();

    assert_eq!(result.stats.website_lookups_attempted, 0);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("max_website_lookups is 0")));
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("max_ordering_link_lookups is 0")));
}

#[tokio::test]
async fn test_details_failure_is_warning_not_fatal() {
    let server = MockServer::start().await;
    mount_geocode_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                nearby_place("p1", "Broken Details", 4.5, 100),
                nearby_place("p2", "No Record", 4.4, 90),
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .and(query_param("place_id", "p1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "UNKNOWN_ERROR", "error_message": "backend" })),
        )
        .mount(&server)
        .await;

    // NOT_FOUND is a non-fatal skip, not a failure.
    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .and(query_param("place_id", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "NOT_FOUND" })))
        .mount(&server)
        .await;

    let discovery = Discovery::new(&test_config(&server)).unwrap();
    let mut request = DiscoveryRequest::for_address("600 Congress Ave");
    request.discover_ordering_links = false;
    let result = discovery.run(request).await.unwrap();

    assert_eq!(result.restaurants.len(), 2);
    assert_eq!(result.stats.website_lookups_attempted, 2);
    assert_eq!(result.stats.website_lookups_succeeded, 1);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("Broken Details")));
    // Both restaurants still assembled, with defaulted fields.
    assert!(result.restaurants[0].website_url.is_none());
}

#[tokio::test]
async fn test_pagination_follows_continuation_token() {
    let server = MockServer::start().await;
    mount_geocode_ok(&server).await;

    // Page 2, requested via the continuation token after the mandatory delay.
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .and(query_param("pagetoken", "tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [nearby_place("p2", "Second Page", 4.2, 60)]
        })))
        .mount(&server)
        .await;

    // Page 1, requested by location.
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .and(query_param("location", "30.27,-97.74"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [nearby_place("p1", "First Page", 4.5, 100)],
            "next_page_token": "tok-2"
        })))
        .mount(&server)
        .await;

    let discovery = Discovery::new(&test_config(&server)).unwrap();
    let mut request = DiscoveryRequest::for_address("600 Congress Ave");
    request.fetch_websites = false;
    request.discover_ordering_links = false;
    request.max_results = 10;
    let result = discovery.run(request).await.unwrap();

    assert_eq!(result.stats.candidates_from_places, 2);
    assert_eq!(result.restaurants.len(), 2);
    assert_eq!(result.restaurants[0].name, "First Page");
    assert_eq!(result.restaurants[1].name, "Second Page");
}

#[tokio::test]
async fn test_website_fetch_failure_is_warning() {
    let server = MockServer::start().await;
    mount_geocode_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [nearby_place("p1", "Dead Site", 4.5, 100)]
        })))
        .mount(&server)
        .await;

    let website = format!("{}/gone", server.uri());
    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "result": { "website": website }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let discovery = Discovery::new(&test_config(&server)).unwrap();
    let result = discovery
        .run(DiscoveryRequest::for_address("600 Congress Ave"))
        .await
        .unwrap();

    assert_eq!(result.restaurants.len(), 1);
    assert_eq!(result.stats.ordering_link_lookups_attempted, 1);
    assert_eq!(result.stats.ordering_link_lookups_succeeded, 0);
    assert!(result.warnings.iter().any(|w| w.contains("Dead Site")));
    // The record is still assembled; ordering fields stay at defaults.
    assert!(result.restaurants[0]
        .ordering_platform_fingerprint
        .is_none());
    assert!(result.restaurants[0].ordering_links.is_empty());
}
