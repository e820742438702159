//! The discovery pipeline: request/result types and the orchestrator that
//! sequences geocoding, nearby search, filtering, and the budgeted
//! per-restaurant website/ordering steps.

pub mod orchestrator;
pub mod types;

pub use orchestrator::Discovery;
pub use types::{DiscoveredRestaurant, DiscoveryRequest, DiscoveryResult, DiscoveryStats};
