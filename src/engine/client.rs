//! The validated client facade over configuration, catalogs, and freshness.

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

use crate::catalog::{CatalogSource, HttpCatalogSource, ModelCatalog};
use crate::config::{ApiKey, ProviderEntry, RouterConfig};
use crate::error::{Error, Result};
use crate::hierarchy::Hierarchy;

use super::freshness::{FreshnessState, HealthDescriptor};
use super::registry::CatalogStore;
use super::selector::{self, Candidate, Selection};
use super::store::ConfigState;
use super::usage::{ProviderUsage, UsageHistory};

/// Loaded catalogs plus the freshness bookkeeping that describes them.
#[derive(Debug, Clone, Default)]
struct DataState {
    freshness: FreshnessState,
    catalogs: CatalogStore,
}

/// Facade tying together the configuration store, provider registry,
/// catalog data, and freshness tracking.
///
/// Every mutating operation contends on a single permit taken with
/// `try_lock`: a second mutation arriving while one runs fails fast with
/// [`Error::OperationInProgress`] instead of queueing. Read operations
/// never touch the permit and observe either the previous or the fully
/// applied state, nothing in between.
///
/// CRITICAL: the `config` and `data` guards are always dropped before any
/// `.await`. Catalog fetches run with no lock held, so readers keep
/// answering while a load is in flight.
pub struct RouterClient {
    /// Single-permit mutation gate, held across await points during loads.
    op: Mutex<()>,
    config: RwLock<ConfigState>,
    data: RwLock<DataState>,
    usage: UsageHistory,
    source: Arc<dyn CatalogSource>,
}

/// Manual impl: the `source` trait object carries no `Debug` bound, so the
/// derive is unavailable.
impl std::fmt::Debug for RouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterClient").finish_non_exhaustive()
    }
}

impl RouterClient {
    /// Build a client that fetches catalogs from the configured analysis API.
    pub fn new(config: RouterConfig) -> Result<Self> {
        let endpoint = config.analysis_api.clone().ok_or_else(|| {
            Error::InvalidArgument(
                "analysis_api must be set to build an HTTP-backed client".to_string(),
            )
        })?;
        let source = HttpCatalogSource::new(endpoint)?;
        Self::with_source(config, Arc::new(source))
    }

    /// Build a client around any catalog source.
    pub fn with_source(config: RouterConfig, source: Arc<dyn CatalogSource>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            op: Mutex::new(()),
            config: RwLock::new(ConfigState::new(config)),
            data: RwLock::new(DataState::default()),
            usage: UsageHistory::new(),
            source,
        })
    }

    /// Acquire the mutation permit without waiting.
    fn permit(&self) -> Result<tokio::sync::MutexGuard<'_, ()>> {
        self.op.try_lock().map_err(|_| Error::OperationInProgress)
    }

    // ── Loading ──────────────────────────────────────────────────────────

    /// Load every configured provider's catalog for the first time.
    ///
    /// All fetches must succeed. One failure rolls the client back to
    /// uninitialized with nothing installed, and the returned error names
    /// the provider that failed; the caller may retry.
    pub async fn initialize(&self) -> Result<()> {
        let _permit = self.permit()?;

        let (providers, stale_clean_up) = {
            let config = self.config.read().unwrap();
            (config.providers().snapshot(), config.stale_clean_up())
        };

        self.data.write().unwrap().freshness.begin_initialize()?;

        tracing::info!(providers = providers.len(), "Loading provider catalogs");

        match self.load_catalogs(&providers).await {
            Ok(fetched) => {
                let mut data = self.data.write().unwrap();
                data.catalogs.install(fetched, stale_clean_up);
                data.freshness.complete_load();
                tracing::info!(
                    providers = data.catalogs.provider_count(),
                    models = data.catalogs.model_count(),
                    "Catalogs loaded"
                );
                Ok(())
            }
            Err(err) => {
                let mut data = self.data.write().unwrap();
                data.freshness.fail_load(err.to_string());
                tracing::error!(error = %err, "Initial catalog load failed");
                Err(err)
            }
        }
    }

    /// Re-fetch every configured provider's catalog.
    ///
    /// Readers keep the previous catalogs until the whole batch lands. A
    /// failed refresh leaves loaded data untouched and only records the
    /// error.
    pub async fn refresh_data(&self) -> Result<()> {
        let _permit = self.permit()?;
        self.refresh_holding_permit().await
    }

    /// Refresh only when the loaded data has outlived the max age.
    ///
    /// Returns whether a refresh actually ran. Fresh data returns
    /// immediately without taking the permit, so this is safe to call on
    /// every request path.
    pub async fn ensure_fresh_data(&self) -> Result<bool> {
        let max_age = self.config.read().unwrap().max_age_hours();
        {
            let data = self.data.read().unwrap();
            if !data.freshness.is_initialized() {
                return Err(Error::NotInitialized);
            }
            if !data.freshness.is_stale(max_age) {
                return Ok(false);
            }
        }

        let _permit = self.permit()?;

        // Another operation may have refreshed while we waited our turn.
        let max_age = self.config.read().unwrap().max_age_hours();
        if !self.data.read().unwrap().freshness.is_stale(max_age) {
            return Ok(false);
        }

        tracing::info!("Loaded data is stale; refreshing");
        self.refresh_holding_permit().await?;
        Ok(true)
    }

    /// Refresh body shared by `refresh_data` and `ensure_fresh_data`;
    /// the caller holds the permit.
    async fn refresh_holding_permit(&self) -> Result<()> {
        let (providers, stale_clean_up) = {
            let config = self.config.read().unwrap();
            (config.providers().snapshot(), config.stale_clean_up())
        };

        self.data.write().unwrap().freshness.begin_refresh()?;

        match self.load_catalogs(&providers).await {
            Ok(fetched) => {
                let mut data = self.data.write().unwrap();
                data.catalogs.install(fetched, stale_clean_up);
                data.freshness.complete_load();
                tracing::info!(
                    providers = data.catalogs.provider_count(),
                    models = data.catalogs.model_count(),
                    "Catalogs refreshed"
                );
                Ok(())
            }
            Err(err) => {
                let mut data = self.data.write().unwrap();
                data.freshness.fail_load(err.to_string());
                tracing::warn!(error = %err, "Catalog refresh failed; keeping previous data");
                Err(err)
            }
        }
    }

    /// Fetch all providers' catalogs concurrently with no lock held.
    async fn load_catalogs(
        &self,
        providers: &[ProviderEntry],
    ) -> Result<Vec<(String, ModelCatalog)>> {
        let fetches = providers.iter().map(|provider| async move {
            match self.source.fetch_models(provider).await {
                Ok(catalog) => {
                    tracing::debug!(
                        provider = %provider.name,
                        models = catalog.len(),
                        "Fetched catalog"
                    );
                    Ok((provider.name.clone(), catalog))
                }
                Err(source) => Err(Error::Refresh {
                    provider: provider.name.clone(),
                    source,
                }),
            }
        });

        futures::future::try_join_all(fetches).await
    }

    // ── Freshness observers ──────────────────────────────────────────────

    /// Whether catalogs have been loaded at least once and are still held.
    pub fn is_initialized(&self) -> bool {
        self.data.read().unwrap().freshness.is_initialized()
    }

    /// When the last successful load completed.
    pub fn last_initialization(&self) -> Result<DateTime<Utc>> {
        self.data
            .read()
            .unwrap()
            .freshness
            .last_initialization()
            .ok_or(Error::NotInitialized)
    }

    /// Whether loaded data has outlived the configured max age.
    /// Unloaded data is always stale.
    pub fn is_data_stale(&self) -> bool {
        let max_age = self.config.read().unwrap().max_age_hours();
        self.data.read().unwrap().freshness.is_stale(max_age)
    }

    /// Snapshot of data health. Never fails, even before initialization.
    pub fn data_health(&self) -> HealthDescriptor {
        let (max_age, configured) = {
            let config = self.config.read().unwrap();
            (config.max_age_hours(), config.providers().len())
        };
        let data = self.data.read().unwrap();
        HealthDescriptor {
            state: data.freshness.phase(),
            initialized: data.freshness.is_initialized(),
            stale: data.freshness.is_stale(max_age),
            last_initialization: data.freshness.last_initialization(),
            data_age_secs: data.freshness.data_age().map(|age| age.as_secs()),
            max_age_hours: max_age,
            configured_providers: configured,
            loaded_providers: data.catalogs.provider_count(),
            loaded_models: data.catalogs.model_count(),
            recorded_requests: self.usage.total_requests(),
            last_error: data.freshness.last_error().map(str::to_string),
        }
    }

    // ── Configuration store ──────────────────────────────────────────────

    pub fn hierarchy(&self) -> Hierarchy {
        self.config.read().unwrap().hierarchy()
    }

    /// Replace the ranking hierarchy. Duplicate criteria are rejected
    /// before anything is applied.
    pub fn set_hierarchy(&self, hierarchy: Hierarchy) -> Result<()> {
        let _permit = self.permit()?;
        self.config.write().unwrap().set_hierarchy(hierarchy)
    }

    pub fn max_age(&self) -> u64 {
        self.config.read().unwrap().max_age_hours()
    }

    /// Set the staleness threshold in hours. Negative values are rejected.
    pub fn set_max_age(&self, hours: i64) -> Result<()> {
        let _permit = self.permit()?;
        self.config.write().unwrap().set_max_age(hours)
    }

    pub fn is_reasoning_enabled(&self) -> bool {
        self.config.read().unwrap().reasoning()
    }

    /// Restrict selection to reasoning-capable models.
    pub fn set_reasoning(&self, enabled: bool) -> Result<()> {
        let _permit = self.permit()?;
        self.config.write().unwrap().set_reasoning(enabled);
        Ok(())
    }

    pub fn is_stale_clean_up_enabled(&self) -> bool {
        self.config.read().unwrap().stale_clean_up()
    }

    /// Drop catalogs of de-configured providers on the next successful load.
    pub fn set_stale_clean_up(&self, enabled: bool) -> Result<()> {
        let _permit = self.permit()?;
        self.config.write().unwrap().set_stale_clean_up(enabled);
        Ok(())
    }

    // ── Provider registry ────────────────────────────────────────────────

    /// Snapshot of the configured providers, in configuration order.
    pub fn providers(&self) -> Vec<ProviderEntry> {
        self.config.read().unwrap().providers().snapshot()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.config.read().unwrap().providers().names()
    }

    /// Add a provider to the configuration.
    ///
    /// Nothing is fetched here; the catalog loads on the next
    /// initialize or refresh.
    pub fn add_provider(&self, entry: ProviderEntry) -> Result<()> {
        let _permit = self.permit()?;
        self.config.write().unwrap().providers_mut().add(entry)
    }

    /// Replace a provider's API key. Returns whether the provider exists.
    pub fn update_provider_api_key(&self, name: &str, api_key: Option<ApiKey>) -> Result<bool> {
        let _permit = self.permit()?;
        Ok(self
            .config
            .write()
            .unwrap()
            .providers_mut()
            .update_key(name, api_key))
    }

    /// Remove a provider from configuration, keeping its loaded catalog.
    ///
    /// The catalog lingers until `remove_provider` drops it or a refresh
    /// with stale clean-up prunes it.
    pub fn remove_provider_from_config(&self, name: &str) -> Result<bool> {
        let _permit = self.permit()?;
        Ok(self.config.write().unwrap().providers_mut().remove(name))
    }

    /// Drop a provider's loaded catalog, leaving its configuration entry
    /// alone. Usage history is kept so the provider retains its standing
    /// when the catalog reloads.
    pub fn remove_provider(&self, name: &str) -> Result<bool> {
        let _permit = self.permit()?;
        let had_catalog = self.data.write().unwrap().catalogs.remove_provider(name);
        if had_catalog {
            tracing::info!(provider = %name, "Removed provider catalog");
        }
        Ok(had_catalog)
    }

    /// Remove one model from a provider's loaded catalog.
    pub fn remove_model(&self, provider: &str, model: &str) -> Result<bool> {
        let _permit = self.permit()?;
        Ok(self
            .data
            .write()
            .unwrap()
            .catalogs
            .remove_model(provider, model))
    }

    /// Clone of one provider's loaded catalog, if any.
    pub fn model_catalog(&self, provider: &str) -> Option<ModelCatalog> {
        self.data.read().unwrap().catalogs.get(provider).cloned()
    }

    // ── Usage and selection ──────────────────────────────────────────────

    /// Record one routed request against a provider and model.
    ///
    /// Deliberately not permit-gated: usage is telemetry and may land
    /// while a refresh is in flight.
    pub fn record_usage(&self, provider: &str, model: &str) {
        self.usage.record(provider, model);
    }

    /// Snapshot of one provider's recorded usage.
    pub fn usage(&self, provider: &str) -> Option<ProviderUsage> {
        self.usage.provider(provider)
    }

    /// Pick the best model over the loaded catalogs.
    ///
    /// `model` restricts candidates to that model name across providers;
    /// `None` considers every loaded model. With reasoning enabled, only
    /// reasoning-capable models qualify. Only providers still in the
    /// configuration contribute candidates.
    pub fn select_model(&self, model: Option<&str>) -> Result<Selection> {
        let (hierarchy, reasoning, names) = {
            let config = self.config.read().unwrap();
            (
                config.hierarchy(),
                config.reasoning(),
                config.providers().names(),
            )
        };

        let data = self.data.read().unwrap();
        if !data.freshness.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let mut candidates = Vec::new();
        for name in &names {
            if let Some(catalog) = data.catalogs.get(name) {
                for entry in &catalog.models {
                    if let Some(wanted) = model {
                        if entry.name != wanted {
                            continue;
                        }
                    }
                    if reasoning && !entry.reasoning {
                        continue;
                    }
                    candidates.push(Candidate {
                        provider: name.clone(),
                        entry: entry.clone(),
                        last_used: self.usage.model_last_used(name, &entry.name),
                    });
                }
            }
        }

        selector::select_best(&hierarchy, candidates).ok_or_else(|| Error::NoCandidates {
            model: model.unwrap_or("any").to_string(),
        })
    }
}
