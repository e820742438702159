// Copyright 2026 Dinescout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dinescout library — restaurant and ordering-platform discovery.
//!
//! Geocodes a free-text address, finds nearby restaurants through a places
//! provider, and for a budgeted subset resolves each restaurant's website
//! and classifies its online-ordering integration. Exposed as a library so
//! integration tests (and embedders) can drive the pipeline directly.

pub mod browser;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod ordering;
pub mod providers;
