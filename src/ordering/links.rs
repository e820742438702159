//! Ordering-link extractor — find and rank "order here" anchors in a page.
//!
//! Every non-fragment, non-`mailto:`/`tel:`/`javascript:` anchor is resolved
//! against the page's base URL and scored as an ordering-link candidate. The
//! weights live in named constants so the rubric can be unit-tested apart
//! from the HTML walk. A score of zero or below is a hard floor: such
//! candidates are dropped entirely, not merely ranked last.
//!
//! Synchronous for the same reason as the fingerprinter: `scraper`'s types
//! are `!Send`, so async callers wrap this in `tokio::task::spawn_blocking`.

use crate::ordering::platform::{self, Confidence, PlatformSignal};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Boost when the anchor's visible text contains an ordering keyword.
pub const TEXT_KEYWORD_BOOST: i32 = 25;

/// Boost when the URL path itself contains "order"/"ordering".
pub const PATH_KEYWORD_BOOST: i32 = 15;

/// Boost when the URL classifies as a known platform at high confidence.
pub const PLATFORM_HIGH_BOOST: i32 = 40;

/// Boost when the URL classifies as a known platform below high confidence.
pub const PLATFORM_PARTIAL_BOOST: i32 = 30;

/// Penalty for gift-card/catering text, a common false positive.
pub const FALSE_POSITIVE_PENALTY: i32 = -20;

/// Penalty for known social-media hosts; never genuine ordering links.
pub const SOCIAL_HOST_PENALTY: i32 = -50;

/// Ordering keywords matched against anchor text (lowercased).
const ORDERING_KEYWORDS: &[&str] = &[
    "order",
    "online ordering",
    "delivery",
    "pickup",
    "takeout",
    "carryout",
];

/// Phrases that usually mean the link is not the main ordering flow.
const FALSE_POSITIVE_PHRASES: &[&str] = &["gift card", "giftcard", "gift cards", "catering"];

/// Social-media domains. Review sites (yelp, tripadvisor) are deliberately
/// absent: they can legitimately front ordering flows.
const SOCIAL_DOMAINS: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "tiktok.com",
    "youtube.com",
    "youtu.be",
    "linkedin.com",
    "pinterest.com",
];

/// Where a link candidate was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkSource {
    /// The restaurant's own website HTML.
    Website,
}

/// One scored ordering-link candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCandidate {
    pub url: String,
    pub host: String,
    /// The anchor's visible text, whitespace-collapsed.
    pub label: String,
    /// Ranking key only — never surfaced as a probability.
    pub score: i32,
    pub platform: PlatformSignal,
    pub source: LinkSource,
}

/// Extract and rank ordering-link candidates from a page's HTML.
///
/// Candidates scoring ≤ 0 are dropped. The survivors are sorted by score
/// descending (ties broken by URL lexical order for determinism),
/// deduplicated by resolved URL keeping the first occurrence, and truncated
/// to `max_candidates`.
pub fn extract_links(base_url: &str, html: &str, max_candidates: usize) -> Vec<LinkCandidate> {
    let document = Html::parse_document(html);
    let Ok(sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let base = Url::parse(base_url).ok();

    let mut candidates: Vec<LinkCandidate> = Vec::new();
    for element in document.select(&sel) {
        let href = element.value().attr("href").unwrap_or("").trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("javascript:")
        {
            continue;
        }

        let resolved = match &base {
            Some(base) => match base.join(href) {
                Ok(u) => u,
                Err(_) => continue,
            },
            None => match Url::parse(href) {
                Ok(u) => u,
                Err(_) => continue,
            },
        };
        let Some(host) = resolved.host_str().map(str::to_ascii_lowercase) else {
            continue;
        };

        let label = element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let url = resolved.to_string();
        let signal = platform::classify(Some(&url));
        let score = score_candidate(&label, resolved.path(), &host, &signal);
        if score <= 0 {
            continue;
        }

        candidates.push(LinkCandidate {
            url,
            host,
            label,
            score,
            platform: signal,
            source: LinkSource::Website,
        });
    }

    candidates.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.url.cmp(&b.url)));

    let mut seen: Vec<&str> = Vec::new();
    let mut deduped: Vec<LinkCandidate> = Vec::new();
    for candidate in &candidates {
        if deduped.len() >= max_candidates {
            break;
        }
        if seen.contains(&candidate.url.as_str()) {
            continue;
        }
        seen.push(&candidate.url);
        deduped.push(candidate.clone());
    }
    deduped
}

/// Score one candidate from its visible text, URL path, host, and platform
/// classification. May be negative; the caller applies the zero floor.
fn score_candidate(label: &str, path: &str, host: &str, signal: &PlatformSignal) -> i32 {
    let text = label.to_lowercase();
    let path = path.to_lowercase();

    let mut score = 0;
    if ORDERING_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        score += TEXT_KEYWORD_BOOST;
    }
    if path.contains("order") {
        // Covers both "order" and "ordering" path segments.
        score += PATH_KEYWORD_BOOST;
    }
    if signal.platform.is_known() {
        score += match signal.confidence {
            Confidence::High => PLATFORM_HIGH_BOOST,
            _ => PLATFORM_PARTIAL_BOOST,
        };
    }
    if FALSE_POSITIVE_PHRASES.iter().any(|p| text.contains(p)) {
        score += FALSE_POSITIVE_PENALTY;
    }
    if SOCIAL_DOMAINS.iter().any(|d| host_is(host, d)) {
        score += SOCIAL_HOST_PENALTY;
    }
    score
}

/// Host equals the domain or is a subdomain of it.
fn host_is(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::platform::OrderingPlatform;

    #[test]
    fn test_social_host_with_order_text_is_dropped() {
        // 25 (text) − 50 (social) = −25 → below the floor.
        let html = r#"<a href="https://facebook.com/restaurant">Order Now</a>"#;
        let links = extract_links("https://example.com", html, 5);
        assert!(links.is_empty());
    }

    #[test]
    fn test_platform_link_with_order_text_scores_high() {
        let html = r#"<a href="https://order.toasttab.com/my-place">Order Online</a>"#;
        let links = extract_links("https://example.com", html, 5);
        assert_eq!(links.len(), 1);
        // 25 (text) + 15 (path) + 40 (platform high) = 80.
        assert_eq!(links[0].score, 80);
        assert_eq!(links[0].platform.platform, OrderingPlatform::Toast);
        assert_eq!(links[0].host, "order.toasttab.com");
    }

    #[test]
    fn test_plain_order_path_scores_fifteen() {
        let html = r#"<a href="/order">Menu</a>"#;
        let links = extract_links("https://example.com", html, 5);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].score, PATH_KEYWORD_BOOST);
        assert_eq!(links[0].url, "https://example.com/order");
    }

    #[test]
    fn test_gift_card_penalty_applies() {
        let html = r#"<a href="https://order.toasttab.com/gifts">Order Gift Cards</a>"#;
        let links = extract_links("https://example.com", html, 5);
        assert_eq!(links.len(), 1);
        // 25 + 40 − 20 = 45.
        assert_eq!(links[0].score, 45);
    }

    #[test]
    fn test_zero_score_anchor_is_dropped() {
        let html = r#"<a href="https://example.com/about">About Us</a>"#;
        let links = extract_links("https://example.com", html, 5);
        assert!(links.is_empty());
    }

    #[test]
    fn test_dedup_keeps_highest_scoring_occurrence() {
        let html = r#"
        <a href="https://order.toasttab.com/place">Order Online</a>
        <a href="https://order.toasttab.com/place">click here</a>
        "#;
        let links = extract_links("https://example.com", html, 5);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label, "Order Online");
        assert_eq!(links[0].score, 80);
    }

    #[test]
    fn test_output_respects_max_candidates() {
        let html = r#"
        <a href="https://order.toasttab.com/a">Order</a>
        <a href="https://order.toasttab.com/b">Order</a>
        <a href="https://order.toasttab.com/c">Order</a>
        "#;
        let links = extract_links("https://example.com", html, 2);
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_sort_is_deterministic_on_ties() {
        let html = r#"
        <a href="https://order.toasttab.com/b">Order</a>
        <a href="https://order.toasttab.com/a">Order</a>
        "#;
        let links = extract_links("https://example.com", html, 5);
        assert_eq!(links.len(), 2);
        assert!(links[0].url < links[1].url);
    }

    #[test]
    fn test_fragment_mailto_tel_script_hrefs_skipped() {
        let html = r##"
        <a href="#menu">Order</a>
        <a href="mailto:order@example.com">Order by email</a>
        <a href="tel:+15125551234">Order by phone</a>
        <a href="javascript:openOrder()">Order</a>
        "##;
        let links = extract_links("https://example.com", html, 5);
        assert!(links.is_empty());
    }

    #[test]
    fn test_relative_hrefs_resolve_against_base() {
        let html = r#"<a href="ordering/start">Order takeout</a>"#;
        let links = extract_links("https://example.com/home/", html, 5);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/home/ordering/start");
        // 25 (text) + 15 (path) = 40.
        assert_eq!(links[0].score, 40);
    }

    #[test]
    fn test_social_subdomain_also_penalized() {
        let html = r#"<a href="https://www.instagram.com/place">Order delivery pickup takeout</a>"#;
        let links = extract_links("https://example.com", html, 5);
        assert!(links.is_empty());
    }
}
