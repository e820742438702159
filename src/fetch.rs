//! Bounded website fetch.
//!
//! One GET per call: custom user-agent, limited redirects, a hard timeout,
//! and the body truncated to a fixed cap to bound memory. Non-2xx responses
//! are errors. No retries — the pipeline never retries external calls, so
//! the 5xx/backoff machinery a general-purpose client would carry is
//! deliberately absent.

use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Hard cap on downloaded body size.
pub const MAX_BODY_BYTES: usize = 1_000_000;

/// Per-request timeout.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(12);

/// Maximum redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// A fetched website body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL as requested.
    pub requested_url: String,
    /// Final URL after redirects.
    pub final_url: String,
    pub status: u16,
    /// Body text, truncated to [`MAX_BODY_BYTES`].
    pub body: String,
}

/// Website fetcher for restaurant homepages.
#[derive(Clone)]
pub struct SiteFetcher {
    client: reqwest::Client,
}

impl SiteFetcher {
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Fetch one page. Errors on transport failure or any non-2xx status.
    pub async fn get(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        if !(200..300).contains(&status) {
            bail!("{url} returned HTTP {status}");
        }

        let mut body = response.text().await.context("failed to read body")?;
        truncate_to_boundary(&mut body, MAX_BODY_BYTES);

        Ok(FetchedPage {
            requested_url: url.to_string(),
            final_url,
            status,
            body,
        })
    }
}

/// Truncate in place at a char boundary at or below `max`.
fn truncate_to_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
