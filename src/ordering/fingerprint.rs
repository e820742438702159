//! Content fingerprinter — detect ordering platforms embedded in a page.
//!
//! Parses a downloaded HTML document and collects *evidence hits* from six
//! independent sources:
//!
//! 1. external `script[src]` references,
//! 2. `iframe[src]` references,
//! 3. `link[href]` references,
//! 4. URL-valued `meta[content]` values,
//! 5. absolute URLs inside `application/ld+json` blocks,
//! 6. marker text ("powered by X" phrases) in the rendered text.
//!
//! URL hits are resolved against the page's base URL and classified by the
//! static classifier; only hits that land on a concrete platform accumulate.
//! Each hit contributes a source-weighted boost to a per-platform score, and
//! the aggregate score — not any single hit — decides the final confidence,
//! because corroboration across sources is stronger evidence than one match.
//!
//! All entry points are **synchronous** because `scraper`'s types are
//! `!Send`; callers integrating with the async runtime should wrap calls in
//! `tokio::task::spawn_blocking`.

use crate::ordering::platform::{self, Confidence, OrderingPlatform, PlatformSignal};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use url::Url;

/// Default cap on the number of ranked signals returned.
pub const DEFAULT_MAX_SIGNALS: usize = 4;

/// Aggregate score at or above which a platform is reported `high`.
pub const HIGH_SCORE_THRESHOLD: u32 = 8;

/// Aggregate score at or above which a platform is reported `medium`.
pub const MEDIUM_SCORE_THRESHOLD: u32 = 4;

/// Ranked platform evidence for one page.
///
/// `primary` is the top-scoring platform; `signals` is the full ranked list
/// (primary included), capped at the caller's `max_signals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformFingerprint {
    pub primary: PlatformSignal,
    pub signals: Vec<PlatformSignal>,
}

// ── Evidence model ──────────────────────────────────────────────────────────

/// Where a piece of evidence was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EvidenceSource {
    Script,
    Iframe,
    Link,
    Meta,
    JsonLd,
    Text,
}

/// Fixed reporting order for reason strings.
const SOURCE_ORDER: [EvidenceSource; 6] = [
    EvidenceSource::Script,
    EvidenceSource::Iframe,
    EvidenceSource::Link,
    EvidenceSource::Meta,
    EvidenceSource::JsonLd,
    EvidenceSource::Text,
];

impl EvidenceSource {
    /// Boost each hit from this source contributes to the platform score.
    /// Script/iframe embeds are the strongest tell; plain text the weakest.
    fn weight(self) -> u32 {
        match self {
            Self::Script | Self::Iframe => 3,
            Self::Link | Self::Meta | Self::JsonLd => 2,
            Self::Text => 1,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Iframe => "iframe",
            Self::Link => "link",
            Self::Meta => "meta",
            Self::JsonLd => "jsonld",
            Self::Text => "text",
        }
    }
}

/// Map an aggregate evidence score to a confidence level.
///
/// This overrides whatever confidence the individual hits carried: three
/// medium CDN hits corroborating each other outrank one high-confidence
/// match standing alone.
pub fn confidence_for_score(score: u32) -> Confidence {
    if score >= HIGH_SCORE_THRESHOLD {
        Confidence::High
    } else if score >= MEDIUM_SCORE_THRESHOLD {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Running tally for one platform.
#[derive(Debug, Default)]
struct PlatformTally {
    score: u32,
    hits_by_source: BTreeMap<EvidenceSource, u32>,
    example_url: Option<String>,
}

impl PlatformTally {
    fn record(&mut self, source: EvidenceSource, url: Option<&str>) {
        self.score += source.weight();
        *self.hits_by_source.entry(source).or_insert(0) += 1;
        if self.example_url.is_none() {
            self.example_url = url.map(str::to_string);
        }
    }

    fn reason(&self) -> String {
        let mut parts = Vec::new();
        for source in SOURCE_ORDER {
            if let Some(count) = self.hits_by_source.get(&source) {
                let plural = if *count == 1 { "hit" } else { "hits" };
                parts.push(format!("{count} {} {plural}", source.name()));
            }
        }
        let mut reason = parts.join(", ");
        if let Some(example) = &self.example_url {
            reason.push_str(&format!("; e.g. {example}"));
        }
        reason
    }
}

// ── Marker text ─────────────────────────────────────────────────────────────

/// Literal phrases that name a platform in page text. Matched
/// case-insensitively with whitespace-tolerant gaps (HTML text collapses
/// arbitrarily).
const MARKER_PHRASES: &[(&str, OrderingPlatform)] = &[
    ("powered by toast", OrderingPlatform::Toast),
    ("powered by chownow", OrderingPlatform::ChowNow),
    ("powered by slice", OrderingPlatform::Slice),
    ("order with slice", OrderingPlatform::Slice),
    ("powered by olo", OrderingPlatform::Olo),
    ("powered by square", OrderingPlatform::Square),
    ("powered by clover", OrderingPlatform::Clover),
    ("powered by bentobox", OrderingPlatform::BentoBox),
    ("powered by popmenu", OrderingPlatform::Popmenu),
];

fn marker_patterns() -> &'static Vec<(Regex, OrderingPlatform)> {
    static PATTERNS: OnceLock<Vec<(Regex, OrderingPlatform)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        MARKER_PHRASES
            .iter()
            .map(|(phrase, platform)| {
                let pattern = phrase
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+");
                let re = Regex::new(&format!("(?i){pattern}"))
                    .unwrap_or_else(|_| Regex::new("$^").unwrap());
                (re, *platform)
            })
            .collect()
    })
}

// ── Fingerprinting ──────────────────────────────────────────────────────────

/// Fingerprint a page's HTML for embedded ordering-platform evidence.
///
/// Returns `None` only when *zero* evidence hits exist at all — callers must
/// distinguish "nothing found" from "found but low confidence", which comes
/// back as a fingerprint whose primary signal is `low`.
pub fn fingerprint(base_url: &str, html: &str, max_signals: usize) -> Option<PlatformFingerprint> {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let mut tallies: BTreeMap<OrderingPlatform, PlatformTally> = BTreeMap::new();

    let mut record_url = |source: EvidenceSource, raw: &str| {
        let resolved = resolve(base.as_ref(), raw);
        let signal = platform::classify(Some(&resolved));
        if signal.platform.is_known() {
            tallies
                .entry(signal.platform)
                .or_default()
                .record(source, Some(&resolved));
        }
    };

    collect_attr_urls(&document, "script[src]", "src", EvidenceSource::Script, &mut record_url);
    collect_attr_urls(&document, "iframe[src]", "src", EvidenceSource::Iframe, &mut record_url);
    collect_attr_urls(&document, "link[href]", "href", EvidenceSource::Link, &mut record_url);
    collect_meta_urls(&document, &mut record_url);
    collect_jsonld_urls(&document, &mut record_url);
    drop(record_url);

    collect_text_markers(&document, &mut tallies);

    if tallies.is_empty() {
        return None;
    }

    // Rank by aggregate score descending; enum order breaks exact ties so
    // repeated runs produce identical output.
    let mut ranked: Vec<(OrderingPlatform, PlatformTally)> = tallies.into_iter().collect();
    ranked.sort_by(|a, b| b.1.score.cmp(&a.1.score).then(a.0.cmp(&b.0)));

    let signals: Vec<PlatformSignal> = ranked
        .iter()
        .take(max_signals.max(1))
        .map(|(platform, tally)| {
            PlatformSignal::new(*platform, confidence_for_score(tally.score), tally.reason())
        })
        .collect();

    let primary = signals.first()?.clone();
    Some(PlatformFingerprint { primary, signals })
}

/// Resolve a raw attribute value against the page base, falling back to the
/// raw value when the base itself did not parse.
fn resolve(base: Option<&Url>, raw: &str) -> String {
    match base {
        Some(base) => base
            .join(raw)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => raw.to_string(),
    }
}

fn collect_attr_urls(
    document: &Html,
    selector: &str,
    attr: &str,
    source: EvidenceSource,
    record: &mut impl FnMut(EvidenceSource, &str),
) {
    let Ok(sel) = Selector::parse(selector) else {
        return;
    };
    for element in document.select(&sel) {
        if let Some(value) = element.value().attr(attr) {
            let value = value.trim();
            if !value.is_empty() {
                record(source, value);
            }
        }
    }
}

/// Meta tags whose `content` is URL-shaped (og:*, twitter:*, refresh targets
/// and the like). Non-URL content is ignored here — the text pass covers it.
fn collect_meta_urls(document: &Html, record: &mut impl FnMut(EvidenceSource, &str)) {
    let Ok(sel) = Selector::parse("meta[content]") else {
        return;
    };
    for element in document.select(&sel) {
        if let Some(content) = element.value().attr("content") {
            let content = content.trim();
            if content.contains("://") || content.starts_with("//") {
                record(EvidenceSource::Meta, content);
            }
        }
    }
}

/// Walk every JSON-LD block and classify each absolute URL string in it.
fn collect_jsonld_urls(document: &Html, record: &mut impl FnMut(EvidenceSource, &str)) {
    let Ok(sel) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return;
    };
    for element in document.select(&sel) {
        let text = element.inner_html();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            walk_jsonld(&value, record);
        }
    }
}

fn walk_jsonld(value: &Value, record: &mut impl FnMut(EvidenceSource, &str)) {
    match value {
        Value::String(s) => {
            if s.starts_with("http://") || s.starts_with("https://") {
                record(EvidenceSource::JsonLd, s);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_jsonld(item, record);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                walk_jsonld(item, record);
            }
        }
        _ => {}
    }
}

fn collect_text_markers(document: &Html, tallies: &mut BTreeMap<OrderingPlatform, PlatformTally>) {
    let text: String = document.root_element().text().collect::<Vec<_>>().join(" ");
    for (pattern, platform) in marker_patterns() {
        if pattern.is_match(&text) {
            tallies
                .entry(*platform)
                .or_default()
                .record(EvidenceSource::Text, None);
        }
    }
}
