//! Provider and catalog registries.

use std::collections::{HashMap, HashSet};

use crate::catalog::ModelCatalog;
use crate::config::{ApiKey, ProviderEntry};
use crate::error::{Error, Result};

/// Ordered set of configured providers, unique by name.
///
/// Order is preserved: selection walks providers in configuration order
/// and full ties keep the earliest candidate.
#[derive(Debug, Clone, Default)]
pub struct ProviderSet {
    entries: Vec<ProviderEntry>,
}

impl ProviderSet {
    pub fn new(entries: Vec<ProviderEntry>) -> Self {
        Self { entries }
    }

    /// Add a provider. Rejects empty and already-configured names.
    pub fn add(&mut self, entry: ProviderEntry) -> Result<()> {
        if entry.name.is_empty() {
            return Err(Error::InvalidArgument(
                "provider name must not be empty".to_string(),
            ));
        }
        if self.contains(&entry.name) {
            return Err(Error::DuplicateProvider { name: entry.name });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Replace the stored key for `name`. Returns whether the provider exists.
    pub fn update_key(&mut self, name: &str, api_key: Option<ApiKey>) -> bool {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.api_key = api_key;
                true
            }
            None => false,
        }
    }

    /// Remove a provider by name. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() < before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn snapshot(&self) -> Vec<ProviderEntry> {
        self.entries.clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loaded model catalogs, keyed by provider name.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    catalogs: HashMap<String, ModelCatalog>,
}

impl CatalogStore {
    /// Merge a freshly fetched batch in, replacing existing entries.
    ///
    /// With `prune_to_fetched`, catalogs for providers absent from the
    /// batch are dropped; otherwise they linger until removed explicitly.
    pub fn install(&mut self, fetched: Vec<(String, ModelCatalog)>, prune_to_fetched: bool) {
        if prune_to_fetched {
            let keep: HashSet<&String> = fetched.iter().map(|(name, _)| name).collect();
            self.catalogs.retain(|name, _| keep.contains(name));
        }
        for (name, catalog) in fetched {
            self.catalogs.insert(name, catalog);
        }
    }

    /// Drop a provider's catalog. Returns whether one was loaded.
    pub fn remove_provider(&mut self, name: &str) -> bool {
        self.catalogs.remove(name).is_some()
    }

    /// Drop one model from a provider's catalog. Returns whether it was present.
    pub fn remove_model(&mut self, provider: &str, model: &str) -> bool {
        match self.catalogs.get_mut(provider) {
            Some(catalog) => catalog.remove(model),
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelCatalog> {
        self.catalogs.get(name)
    }

    pub fn provider_count(&self) -> usize {
        self.catalogs.len()
    }

    pub fn model_count(&self) -> usize {
        self.catalogs.values().map(|c| c.len()).sum()
    }
}
