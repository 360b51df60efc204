//! llmroute - Staleness-aware configuration and provider routing for LLM clients
//!
//! This library provides the core pieces behind an LLM router client:
//! validated configuration, provider catalog loading, freshness tracking,
//! and hierarchy-driven model selection.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod hierarchy;

pub use config::RouterConfig;
pub use engine::RouterClient;
pub use error::{Error, Result};
pub use hierarchy::{Criterion, Hierarchy};
