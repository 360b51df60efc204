//! Core engine behind the client facade.
//!
//! This module ties together:
//! - Configuration state with validated setters
//! - Provider registry and loaded catalogs
//! - Staleness-aware freshness tracking
//! - Hierarchy-driven model selection

mod client;
mod freshness;
mod registry;
mod selector;
mod store;
mod usage;

pub use client::RouterClient;
pub use freshness::{FreshnessState, HealthDescriptor, Phase};
pub use selector::Selection;
pub use usage::{ModelUsage, ProviderUsage, UsageHistory};
