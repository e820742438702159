//! Static ordering-platform classifier.
//!
//! Maps a URL's host to a known online-ordering platform by pattern match.
//! Pure and total: any input (including `None` and garbage strings) produces
//! a [`PlatformSignal`], never an error. No I/O, no hidden state — the same
//! input always yields the same signal.
//!
//! The host patterns live in [`PLATFORM_TABLE`], an ordered const table.
//! First match wins; ties are impossible because the table is checked in a
//! fixed order. Three match mechanisms per platform:
//!
//! 1. **Domain suffix** — host equals or ends with a canonical ordering
//!    domain (`order.toasttab.com` → Toast). Confidence: high.
//! 2. **Needle** — host contains a platform-specific substring that only
//!    appears on that platform's asset/CDN hosts. Confidence: medium.
//! 3. **Label** — one dotted label of the host equals a platform token, for
//!    tokens too short to be safe as substrings (`order.olo.example.com` →
//!    Olo, but `colorado.com` stays untouched). Confidence: medium.

use serde::{Deserialize, Serialize};
use url::Url;

/// Closed set of ordering platforms this pipeline can identify.
///
/// `Unknown` means no URL/host was available to classify; `Other` means a
/// URL existed but matched no known pattern. The distinction matters to
/// callers: `Unknown` is "could not look", `Other` is "looked, found nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingPlatform {
    Toast,
    ChowNow,
    Slice,
    Olo,
    Square,
    Clover,
    BentoBox,
    Popmenu,
    Other,
    Unknown,
}

impl OrderingPlatform {
    /// Human-readable platform name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Toast => "Toast",
            Self::ChowNow => "ChowNow",
            Self::Slice => "Slice",
            Self::Olo => "Olo",
            Self::Square => "Square",
            Self::Clover => "Clover",
            Self::BentoBox => "BentoBox",
            Self::Popmenu => "Popmenu",
            Self::Other => "Other",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether this is a concrete ordering platform (not `Other`/`Unknown`).
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other | Self::Unknown)
    }
}

/// Qualitative strength of a platform classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// One platform classification with its confidence and a human-readable
/// justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSignal {
    pub platform: OrderingPlatform,
    pub label: String,
    pub confidence: Confidence,
    pub reason: String,
}

impl PlatformSignal {
    pub fn new(platform: OrderingPlatform, confidence: Confidence, reason: String) -> Self {
        Self {
            platform,
            label: platform.label().to_string(),
            confidence,
            reason,
        }
    }

    /// Signal for "no URL/host available to classify".
    pub fn unknown(reason: &str) -> Self {
        Self::new(OrderingPlatform::Unknown, Confidence::Low, reason.to_string())
    }
}

// ── Pattern table ───────────────────────────────────────────────────────────

/// Host patterns for one platform. See the module docs for match semantics.
struct PlatformPattern {
    platform: OrderingPlatform,
    /// Exact-or-suffix domain matches. High confidence.
    domains: &'static [&'static str],
    /// Substring needles against the full host. Medium confidence.
    needles: &'static [&'static str],
    /// Dotted-label equality matches. Medium confidence.
    labels: &'static [&'static str],
}

/// Ordered classification table. Checked top to bottom; first match wins.
const PLATFORM_TABLE: &[PlatformPattern] = &[
    PlatformPattern {
        platform: OrderingPlatform::Toast,
        domains: &["toasttab.com"],
        needles: &["toasttab"],
        labels: &[],
    },
    PlatformPattern {
        platform: OrderingPlatform::ChowNow,
        domains: &["chownow.com"],
        needles: &["chownow"],
        labels: &[],
    },
    PlatformPattern {
        platform: OrderingPlatform::Slice,
        domains: &["slicelife.com"],
        needles: &["slicelife"],
        labels: &[],
    },
    PlatformPattern {
        platform: OrderingPlatform::Olo,
        domains: &["olo.com"],
        needles: &[],
        // "olo" is unsafe as a substring (colorado, bolognese); require a
        // whole host label.
        labels: &["olo"],
    },
    PlatformPattern {
        platform: OrderingPlatform::Square,
        domains: &["squareup.com", "square.site"],
        needles: &["squarecdn"],
        labels: &[],
    },
    PlatformPattern {
        platform: OrderingPlatform::Clover,
        domains: &["clover.com"],
        needles: &[],
        labels: &["clover"],
    },
    PlatformPattern {
        platform: OrderingPlatform::BentoBox,
        domains: &["getbento.com"],
        needles: &["bentobox"],
        labels: &[],
    },
    PlatformPattern {
        platform: OrderingPlatform::Popmenu,
        domains: &["popmenu.com"],
        needles: &["popmenu"],
        labels: &[],
    },
];

/// Host equals the domain, or ends with `.{domain}`.
fn host_matches_domain(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

// ── Classification ──────────────────────────────────────────────────────────

/// Classify a URL's host against the known ordering-platform table.
///
/// `None` or an unparsable URL yields `{Unknown, low}`. A parsable URL whose
/// host matches no pattern yields `{Other, low}` with the unrecognized host
/// in the reason string.
pub fn classify(url: Option<&str>) -> PlatformSignal {
    let Some(raw) = url else {
        return PlatformSignal::unknown("no url available");
    };

    let host = match Url::parse(raw) {
        Ok(parsed) => match parsed.host_str() {
            Some(h) => h.to_ascii_lowercase(),
            None => return PlatformSignal::unknown("url has no host"),
        },
        Err(_) => return PlatformSignal::unknown("url did not parse"),
    };

    for pattern in PLATFORM_TABLE {
        if let Some(domain) = pattern
            .domains
            .iter()
            .find(|d| host_matches_domain(&host, d))
        {
            return PlatformSignal::new(
                pattern.platform,
                Confidence::High,
                format!("host {host} is on the {domain} ordering domain"),
            );
        }
        if let Some(needle) = pattern.needles.iter().find(|n| host.contains(*n)) {
            return PlatformSignal::new(
                pattern.platform,
                Confidence::Medium,
                format!("host {host} contains platform marker \"{needle}\""),
            );
        }
        if let Some(label) = pattern
            .labels
            .iter()
            .find(|l| host.split('.').any(|part| part == **l))
        {
            return PlatformSignal::new(
                pattern.platform,
                Confidence::Medium,
                format!("host {host} carries the \"{label}\" label"),
            );
        }
    }

    PlatformSignal::new(
        OrderingPlatform::Other,
        Confidence::Low,
        format!("host {host} matches no known ordering platform"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_none_is_unknown_low() {
        let signal = classify(None);
        assert_eq!(signal.platform, OrderingPlatform::Unknown);
        assert_eq!(signal.confidence, Confidence::Low);
    }

    #[test]
    fn test_classify_unparsable_is_unknown_low() {
        let signal = classify(Some("not a url at all"));
        assert_eq!(signal.platform, OrderingPlatform::Unknown);
        assert_eq!(signal.confidence, Confidence::Low);
    }

    #[test]
    fn test_classify_toast_subdomain_high() {
        let signal = classify(Some("https://order.toasttab.com/my-restaurant"));
        assert_eq!(signal.platform, OrderingPlatform::Toast);
        assert_eq!(signal.confidence, Confidence::High);
    }

    #[test]
    fn test_classify_unmatched_host_is_other_low() {
        let signal = classify(Some("https://example.com"));
        assert_eq!(signal.platform, OrderingPlatform::Other);
        assert_eq!(signal.confidence, Confidence::Low);
        assert!(signal.reason.contains("example.com"));
    }

    #[test]
    fn test_classify_exact_domains() {
        assert_eq!(
            classify(Some("https://chownow.com/order")).platform,
            OrderingPlatform::ChowNow
        );
        assert_eq!(
            classify(Some("https://slicelife.com/restaurants/x")).platform,
            OrderingPlatform::Slice
        );
        assert_eq!(
            classify(Some("https://my-shop.square.site/")).platform,
            OrderingPlatform::Square
        );
        assert_eq!(
            classify(Some("https://restaurant.getbento.com/menu")).platform,
            OrderingPlatform::BentoBox
        );
        assert_eq!(
            classify(Some("https://order.popmenu.com/r/tacos")).platform,
            OrderingPlatform::Popmenu
        );
    }

    #[test]
    fn test_classify_needle_is_medium() {
        let signal = classify(Some("https://cdn.chownowcdn.net/widget.js"));
        assert_eq!(signal.platform, OrderingPlatform::ChowNow);
        assert_eq!(signal.confidence, Confidence::Medium);
    }

    #[test]
    fn test_olo_label_does_not_fire_on_substrings() {
        // "olo" must match only as a whole host label.
        assert_eq!(
            classify(Some("https://www.colorado.com")).platform,
            OrderingPlatform::Other
        );
        let signal = classify(Some("https://order.olo.example.com/menu"));
        assert_eq!(signal.platform, OrderingPlatform::Olo);
        assert_eq!(signal.confidence, Confidence::Medium);
        assert_eq!(
            classify(Some("https://www.olo.com")).confidence,
            Confidence::High
        );
    }

    #[test]
    fn test_classify_is_case_insensitive_on_host() {
        let signal = classify(Some("https://Order.ToastTab.COM/x"));
        assert_eq!(signal.platform, OrderingPlatform::Toast);
        assert_eq!(signal.confidence, Confidence::High);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let a = classify(Some("https://order.toasttab.com/x"));
        let b = classify(Some("https://order.toasttab.com/x"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_host_matches_domain_requires_dot_boundary() {
        assert!(host_matches_domain("toasttab.com", "toasttab.com"));
        assert!(host_matches_domain("order.toasttab.com", "toasttab.com"));
        // "evil-toasttab.com" must not count as a toasttab.com host.
        assert!(!host_matches_domain("evil-toasttab.com", "toasttab.com"));
    }

    #[test]
    fn test_platform_serializes_lowercase() {
        let json = serde_json::to_string(&OrderingPlatform::ChowNow).unwrap();
        assert_eq!(json, "\"chownow\"");
        let json = serde_json::to_string(&OrderingPlatform::BentoBox).unwrap();
        assert_eq!(json, "\"bentobox\"");
    }
}
