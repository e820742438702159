//! Deep-scan fallback — browser-driven ordering-link extraction.
//!
//! Used only when the static pass (fingerprint + link extraction on the
//! fetched HTML) came back empty. Drives a single [`PageSession`] through:
//! load → settle → consent dismissal → bot-block check → static scan of the
//! rendered DOM → at most one "order"-style CTA click → re-settle →
//! re-check → re-scan.
//!
//! Three outcomes, none of which panic or propagate:
//! - links/fingerprint found (possibly after a click),
//! - ran but found nothing (bot block, no CTA) — explained in `notes`,
//! - failed — the error text lands in `error_message` with whatever partial
//!   fields were already populated.
//!
//! The session is closed on every exit path, and the whole attempt is
//! bounded by a wall-clock budget with shorter sub-timeouts inside so one
//! stuck selector cannot consume it all.

use crate::browser::{Browser, PageSession};
use crate::ordering::fingerprint::{self, PlatformFingerprint};
use crate::ordering::links::{self, LinkCandidate};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Title/body markers that indicate a bot challenge rather than content.
const BLOCK_MARKERS: &[&str] = &[
    "verify you are human",
    "checking your browser",
    "cloudflare",
    "captcha",
    "access denied",
    "unusual traffic",
];

/// Consent/cookie-overlay dismissal phrases. Short generic words require an
/// exact text match so ordinary navigation is not clicked by accident. At
/// most one click per phrase.
const CONSENT_PHRASES: &[(&str, bool)] = &[
    ("accept", false),
    ("agree", false),
    ("got it", false),
    ("continue", true),
    ("ok", true),
];

/// Ordered CTA label patterns, most specific first. `true` = exact match.
const CTA_LABELS: &[(&str, bool)] = &[
    ("order online", false),
    ("order now", false),
    ("order", true),
    ("online ordering", false),
    ("delivery", false),
    ("pickup", false),
];

/// CSS fallback when no labeled CTA is interactable.
const CTA_SELECTORS: &[&str] = &[
    r#"a[href*="order"]"#,
    r#"a[href*="ordering"]"#,
    r#"a[href*="delivery"]"#,
];

/// Which strategy located the clicked CTA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CtaStrategy {
    /// Matched a button/link by visible label.
    RoleLabel,
    /// Matched by href-contains CSS selector.
    HrefContains,
}

/// Tunables for one deep-scan attempt.
#[derive(Debug, Clone)]
pub struct DeepScanConfig {
    /// Wall-clock ceiling on the whole attempt.
    pub budget: Duration,
    /// Cap on the initial network-settle wait.
    pub settle_timeout: Duration,
    /// Cap on the post-click settle wait.
    pub post_click_settle: Duration,
    /// Cap on ordering-link candidates per scan.
    pub max_candidates: usize,
    /// Cap on ranked fingerprint signals.
    pub max_signals: usize,
}

impl Default for DeepScanConfig {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(60),
            settle_timeout: Duration::from_secs(10),
            post_click_settle: Duration::from_secs(8),
            max_candidates: 6,
            max_signals: fingerprint::DEFAULT_MAX_SIGNALS,
        }
    }
}

/// Result of one deep-scan attempt. Always returned, never an `Err`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepScanResult {
    /// URL of the page the final scan ran against.
    pub final_url: Option<String>,
    /// Whether an order CTA was clicked.
    pub clicked_order_cta: bool,
    /// Which strategy located the clicked CTA.
    pub cta_strategy: Option<CtaStrategy>,
    pub fingerprint: Option<PlatformFingerprint>,
    pub ordering_links: Vec<LinkCandidate>,
    /// Explanatory notes for "ran but found nothing" outcomes.
    pub notes: Vec<String>,
    /// Set when the attempt failed; partial fields are still populated.
    pub error_message: Option<String>,
}

/// Run a deep scan against one URL.
///
/// Never returns an error: failures are surfaced on
/// [`DeepScanResult::error_message`]. The page session is closed before this
/// function returns, on every path.
pub async fn deep_scan(browser: &dyn Browser, url: &str, config: &DeepScanConfig) -> DeepScanResult {
    let mut result = DeepScanResult::default();

    let mut session = match browser.new_session().await {
        Ok(session) => session,
        Err(e) => {
            result.error_message = Some(format!("failed to open browser session: {e:#}"));
            return result;
        }
    };

    let outcome = tokio::time::timeout(
        config.budget,
        scan_session(session.as_mut(), url, config, &mut result),
    )
    .await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!("deep scan of {url} failed: {e:#}");
            result.error_message = Some(format!("{e:#}"));
        }
        Err(_) => {
            result
                .notes
                .push(format!("budget of {:?} exhausted", config.budget));
        }
    }

    if let Err(e) = session.close().await {
        debug!("failed to close page session: {e:#}");
    }

    result
}

/// The state machine proper. Mutates `result` as it goes so the caller keeps
/// partial progress when an error or the budget cuts the run short.
async fn scan_session(
    session: &mut dyn PageSession,
    url: &str,
    config: &DeepScanConfig,
    result: &mut DeepScanResult,
) -> Result<()> {
    let settle_ms = config.settle_timeout.as_millis() as u64;
    session.navigate(url, settle_ms).await?;
    session.wait_for_settle(settle_ms).await?;
    result.final_url = Some(session.current_url().await.unwrap_or_else(|_| url.to_string()));

    dismiss_overlays(session, result).await;

    if check_blocked(session, result).await? {
        return Ok(());
    }

    let (fp, found) = scan_dom(session, config).await?;
    result.fingerprint = fp;
    result.ordering_links = found;
    if !result.ordering_links.is_empty() {
        result
            .notes
            .push("static pass on rendered DOM found ordering links".to_string());
        return Ok(());
    }

    let Some(strategy) = click_order_cta(session).await else {
        result
            .notes
            .push("no order call-to-action found to click".to_string());
        return Ok(());
    };
    result.clicked_order_cta = true;
    result.cta_strategy = Some(strategy);
    debug!("clicked order CTA via {strategy:?}");

    session
        .wait_for_settle(config.post_click_settle.as_millis() as u64)
        .await?;
    result.final_url = session.current_url().await.ok().or(result.final_url.take());

    if check_blocked(session, result).await? {
        return Ok(());
    }

    let (fp, found) = scan_dom(session, config).await?;
    result.fingerprint = fp;
    result.ordering_links = found;
    Ok(())
}

/// Best-effort consent/cookie overlay dismissal. Click failures are ignored;
/// an overlay that will not dismiss just degrades the scan.
async fn dismiss_overlays(session: &mut dyn PageSession, result: &mut DeepScanResult) {
    for (phrase, exact) in CONSENT_PHRASES {
        match session.click_by_text(phrase, *exact).await {
            Ok(true) => {
                result.notes.push(format!("dismissed overlay via \"{phrase}\""));
                let _ = session.wait_for_settle(1_000).await;
            }
            Ok(false) => {}
            Err(e) => debug!("overlay probe \"{phrase}\" failed: {e:#}"),
        }
    }
}

/// Inspect title and body text for bot-challenge markers. When found, record
/// a note and report `true`; the caller returns whatever was gathered.
async fn check_blocked(
    session: &mut dyn PageSession,
    result: &mut DeepScanResult,
) -> Result<bool> {
    let title = session.title().await.unwrap_or_default().to_lowercase();
    let body = session.body_text().await.unwrap_or_default().to_lowercase();
    for marker in BLOCK_MARKERS {
        if title.contains(marker) || body.contains(marker) {
            result
                .notes
                .push(format!("bot challenge detected (\"{marker}\"); aborting"));
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run the static fingerprinter and link extractor against the current DOM.
/// `scraper` types are `!Send`, so the parse runs on a blocking thread.
async fn scan_dom(
    session: &mut dyn PageSession,
    config: &DeepScanConfig,
) -> Result<(Option<PlatformFingerprint>, Vec<LinkCandidate>)> {
    let html = session.html().await?;
    let base = session.current_url().await?;
    let max_candidates = config.max_candidates;
    let max_signals = config.max_signals;
    let scanned = tokio::task::spawn_blocking(move || {
        let fp = fingerprint::fingerprint(&base, &html, max_signals);
        let found = links::extract_links(&base, &html, max_candidates);
        (fp, found)
    })
    .await?;
    Ok(scanned)
}

/// Try to click one "order"-style CTA: labeled roles first, then CSS
/// href-contains fallbacks. At most one click total.
async fn click_order_cta(session: &mut dyn PageSession) -> Option<CtaStrategy> {
    for (label, exact) in CTA_LABELS {
        match session.click_by_text(label, *exact).await {
            Ok(true) => return Some(CtaStrategy::RoleLabel),
            Ok(false) => {}
            Err(e) => debug!("CTA label probe \"{label}\" failed: {e:#}"),
        }
    }
    for selector in CTA_SELECTORS {
        match session.click_by_selector(selector).await {
            Ok(true) => return Some(CtaStrategy::HrefContains),
            Ok(false) => {}
            Err(e) => debug!("CTA selector probe {selector} failed: {e:#}"),
        }
    }
    None
}
