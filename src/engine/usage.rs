//! Request usage history per provider and model.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;

/// Usage recorded against one model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelUsage {
    pub requests: u64,
    pub last_used: Option<DateTime<Utc>>,
}

/// Usage recorded against one provider, with per-model breakdown.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderUsage {
    pub requests: u64,
    pub last_used: Option<DateTime<Utc>>,
    pub models: HashMap<String, ModelUsage>,
}

/// Concurrent usage history backed by DashMap.
///
/// History outlives catalog refreshes and provider removal, so a
/// re-added provider keeps its recency standing.
#[derive(Debug, Default)]
pub struct UsageHistory {
    providers: DashMap<String, ProviderUsage>,
}

impl UsageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one routed request at both granularities.
    pub fn record(&self, provider: &str, model: &str) {
        let now = Utc::now();
        let mut entry = self.providers.entry(provider.to_string()).or_default();
        entry.requests += 1;
        entry.last_used = Some(now);

        let model_usage = entry.models.entry(model.to_string()).or_default();
        model_usage.requests += 1;
        model_usage.last_used = Some(now);
    }

    /// Snapshot of one provider's usage.
    pub fn provider(&self, provider: &str) -> Option<ProviderUsage> {
        self.providers.get(provider).map(|e| e.value().clone())
    }

    pub fn provider_last_used(&self, provider: &str) -> Option<DateTime<Utc>> {
        self.providers.get(provider).and_then(|e| e.last_used)
    }

    pub fn model_last_used(&self, provider: &str, model: &str) -> Option<DateTime<Utc>> {
        self.providers
            .get(provider)
            .and_then(|e| e.models.get(model).and_then(|m| m.last_used))
    }

    pub fn total_requests(&self) -> u64 {
        self.providers.iter().map(|e| e.requests).sum()
    }
}
