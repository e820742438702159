//! Environment-driven configuration.
//!
//! All knobs are `DINESCOUT_*` environment variables; the places API key is
//! also accepted from `GOOGLE_MAPS_API_KEY` since that is where most users
//! already have it. The Chromium path override
//! (`DINESCOUT_CHROMIUM_PATH`) is read in `browser::chromium::find_chromium`.

use crate::error::DiscoveryError;

/// Default provider base URL (overridable for tests).
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// User-agent sent on website downloads.
pub const DEFAULT_USER_AGENT: &str =
    "dinescout/0.3 (+https://github.com/dinescout/dinescout)";

/// Runtime configuration for a discovery run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Places/geocoding API key. Checked lazily so commands that never call
    /// the provider (doctor, completions, scan) work without one.
    pub api_key: Option<String>,
    /// Base URL for all provider endpoints.
    pub base_url: String,
    /// User-agent for website downloads.
    pub user_agent: String,
}

impl Config {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let api_key = std::env::var("DINESCOUT_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_MAPS_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());
        let base_url = std::env::var("DINESCOUT_PLACES_BASE_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let user_agent = std::env::var("DINESCOUT_USER_AGENT")
            .ok()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Self {
            api_key,
            base_url,
            user_agent,
        }
    }

    /// Fail fast when the API key is missing.
    pub fn require_api_key(&self) -> Result<&str, DiscoveryError> {
        self.api_key.as_deref().ok_or(DiscoveryError::MissingApiKey)
    }
}
