//! Catalog data as served by the analysis API.

use serde::{Deserialize, Serialize};

/// A single model row in a provider's catalog.
///
/// Prices are USD per million tokens. Metric fields default to zero when
/// the analysis API omits them, so a sparse catalog still loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Model identifier (e.g., "gpt-4o")
    pub name: String,
    /// Benchmark accuracy score, higher is better
    #[serde(default)]
    pub accuracy: f64,
    /// USD per million input tokens
    #[serde(default)]
    pub input_price: f64,
    /// USD per million output tokens
    #[serde(default)]
    pub output_price: f64,
    /// Median response latency in milliseconds
    #[serde(default)]
    pub latency_ms: f64,
    /// Whether the model produces reasoning output
    #[serde(default)]
    pub reasoning: bool,
}

/// All models one provider currently serves.
///
/// This is the wire shape of the analysis API response body, reused
/// directly as the in-memory representation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelEntry>) -> Self {
        Self { models }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m.name == model)
    }

    pub fn get(&self, model: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.name == model)
    }

    /// Removes a model by name. Returns whether it was present.
    pub fn remove(&mut self, model: &str) -> bool {
        let before = self.models.len();
        self.models.retain(|m| m.name != model);
        self.models.len() < before
    }
}
