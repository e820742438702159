//! Online-ordering detection: platform classification, content
//! fingerprinting, link extraction, and the browser-driven deep scan.
//!
//! Layered cheapest-first: [`platform::classify`] is a pure host lookup,
//! [`fingerprint`] and [`links`] parse already-downloaded HTML, and
//! [`deep_scan`] drives a real browser session as the last resort.

pub mod deep_scan;
pub mod fingerprint;
pub mod links;
pub mod platform;
