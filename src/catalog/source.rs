//! Catalog source trait and the in-memory implementation.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use super::types::ModelCatalog;
use crate::config::ProviderEntry;

/// Errors raised while fetching a provider's catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog endpoint returned status {status} for provider '{provider}'")]
    Status { provider: String, status: u16 },

    #[error("Could not decode catalog for provider '{provider}': {message}")]
    Decode { provider: String, message: String },

    #[error("No catalog available for provider '{provider}'")]
    Unavailable { provider: String },
}

/// Fetches the current model catalog for one provider.
///
/// Implementations must be safe to call concurrently. The client never
/// holds internal locks across a fetch, so a slow source only delays the
/// operation that triggered it.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_models(&self, provider: &ProviderEntry) -> Result<ModelCatalog, CatalogError>;
}

/// In-memory catalog source.
///
/// Catalogs are keyed by provider name. Fetch behavior stays adjustable
/// through a shared handle: an optional delay driven by the tokio clock,
/// and a per-provider failure switch. A provider with no catalog and a
/// provider switched to failing both report [`CatalogError::Unavailable`].
pub struct StaticCatalogSource {
    catalogs: DashMap<String, ModelCatalog>,
    delay: Mutex<Option<Duration>>,
    failing: Mutex<HashSet<String>>,
}

impl StaticCatalogSource {
    pub fn new() -> Self {
        Self {
            catalogs: DashMap::new(),
            delay: Mutex::new(None),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Install or replace the catalog served for a provider.
    pub fn insert(&self, provider: impl Into<String>, catalog: ModelCatalog) {
        self.catalogs.insert(provider.into(), catalog);
    }

    /// Delay every fetch by `delay`. `None` restores instant fetches.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Switch fetch failure on or off for one provider.
    pub fn set_failing(&self, provider: &str, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(provider.to_string());
        } else {
            set.remove(provider);
        }
    }
}

impl Default for StaticCatalogSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch_models(&self, provider: &ProviderEntry) -> Result<ModelCatalog, CatalogError> {
        // Copy the delay out so no guard is held across the sleep.
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().contains(&provider.name) {
            return Err(CatalogError::Unavailable {
                provider: provider.name.clone(),
            });
        }

        self.catalogs
            .get(&provider.name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CatalogError::Unavailable {
                provider: provider.name.clone(),
            })
    }
}
