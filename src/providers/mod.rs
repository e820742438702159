//! Typed clients for the geocoding/places provider.
//!
//! Provider JSON is deserialized into explicit per-endpoint response structs
//! with an exhaustive status enum rather than trusted at runtime; anything
//! the provider might send that we do not recognize lands on
//! [`ProviderStatus::Unrecognized`] instead of panicking a run.
//!
//! The base URL is configurable so tests can point the client at a local
//! mock server.

pub mod geocoding;
pub mod places;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-call timeout for provider endpoints.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Status strings the provider returns on every endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    Ok,
    ZeroResults,
    NotFound,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
    /// Any status string this client does not know about.
    #[serde(other)]
    Unrecognized,
}

impl ProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::ZeroResults => "ZERO_RESULTS",
            Self::NotFound => "NOT_FOUND",
            Self::OverQueryLimit => "OVER_QUERY_LIMIT",
            Self::RequestDenied => "REQUEST_DENIED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::Unrecognized => "UNRECOGNIZED",
        }
    }
}

/// A latitude/longitude pair, in the provider's wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Geometry wrapper as the provider nests it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

/// Shared client for all provider endpoints: one reqwest client, the API
/// key, and the (overridable) base URL.
#[derive(Clone)]
pub struct PlacesClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PlacesClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.api_key
    }

    /// Issue a GET against a provider path with query parameters and parse
    /// the JSON body.
    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, reqwest::Error> {
        self.http
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .send()
            .await?
            .json::<T>()
            .await
    }
}
