//! Integration tests for the client lifecycle: initialize, refresh,
//! staleness, and selection.
//!
//! Verifies that:
//! - initialize loads every configured catalog, or nothing at all
//! - staleness follows max_age and drives ensure_fresh_data
//! - a failed refresh keeps the previous data servable
//! - reads keep answering while a slow refresh is in flight
//! - stale clean-up prunes catalogs of de-configured providers
//! - usage history survives refreshes and provider removal
//!
//! Loads run against `StaticCatalogSource` under the paused tokio clock,
//! so staleness windows measured in hours execute instantly.

use std::sync::Arc;
use std::time::Duration;

use llmroute::catalog::{ModelCatalog, ModelEntry, StaticCatalogSource};
use llmroute::config::ProviderEntry;
use llmroute::engine::Phase;
use llmroute::{Criterion, Error, Hierarchy, RouterClient, RouterConfig};

fn model(name: &str, accuracy: f64, output_price: f64, latency_ms: f64, reasoning: bool) -> ModelEntry {
    ModelEntry {
        name: name.to_string(),
        accuracy,
        input_price: output_price / 4.0,
        output_price,
        latency_ms,
        reasoning,
    }
}

fn provider(name: &str) -> ProviderEntry {
    ProviderEntry {
        name: name.to_string(),
        api_key: None,
    }
}

/// Price-first hierarchy so metric differences decide without usage history.
fn price_first() -> Hierarchy {
    Hierarchy {
        first: Criterion::Price,
        second: Criterion::Accuracy,
        third: Criterion::Latency,
        last: Criterion::LastUsed,
    }
}

/// Client over a static source serving one `<name>-model` per provider.
fn setup_client(providers: &[&str]) -> (Arc<RouterClient>, Arc<StaticCatalogSource>) {
    let source = Arc::new(StaticCatalogSource::new());
    for name in providers {
        source.insert(
            *name,
            ModelCatalog::new(vec![model(&format!("{}-model", name), 80.0, 4.0, 300.0, false)]),
        );
    }

    let config = RouterConfig {
        providers: providers.iter().map(|n| provider(n)).collect(),
        ..RouterConfig::default()
    };
    let client = RouterClient::with_source(config, source.clone()).unwrap();
    (Arc::new(client), source)
}

/// Source with one provider serving a cheap non-reasoning model and an
/// expensive reasoning one.
fn two_model_source() -> Arc<StaticCatalogSource> {
    let source = Arc::new(StaticCatalogSource::new());
    source.insert(
        "openai",
        ModelCatalog::new(vec![
            model("fast", 85.0, 2.0, 200.0, false),
            model("thinker", 92.0, 10.0, 1500.0, true),
        ]),
    );
    source
}

// ============================================================================
// Test 1: initialize loads every configured catalog
// ============================================================================

#[tokio::test]
async fn test_initialize_loads_all_catalogs() {
    let (client, _source) = setup_client(&["openai", "anthropic"]);

    assert!(!client.is_initialized());
    client.initialize().await.unwrap();

    assert!(client.is_initialized());
    assert!(!client.is_data_stale());
    assert!(client.last_initialization().is_ok());
    assert!(client
        .model_catalog("openai")
        .unwrap()
        .contains("openai-model"));
    assert!(client
        .model_catalog("anthropic")
        .unwrap()
        .contains("anthropic-model"));

    let health = client.data_health();
    assert_eq!(health.state, Phase::Ready);
    assert_eq!(health.configured_providers, 2);
    assert_eq!(health.loaded_providers, 2);
    assert_eq!(health.loaded_models, 2);
    assert!(health.initialized);
    assert!(!health.stale);
    assert!(health.last_error.is_none());
}

// ============================================================================
// Test 2: a second initialize is rejected
// ============================================================================

#[tokio::test]
async fn test_initialize_twice_errors() {
    let (client, _source) = setup_client(&["openai"]);
    client.initialize().await.unwrap();

    let err = client.initialize().await.unwrap_err();
    assert!(matches!(err, Error::AlreadyInitialized));
    assert!(client.is_initialized(), "failed re-init must not unload data");
}

// ============================================================================
// Test 3: one failing provider rolls the whole load back
// ============================================================================

#[tokio::test]
async fn test_initialize_is_all_or_nothing() {
    let (client, source) = setup_client(&["good", "bad"]);
    source.set_failing("bad", true);

    let err = client.initialize().await.unwrap_err();
    match err {
        Error::Refresh { provider, .. } => assert_eq!(provider, "bad"),
        other => panic!("unexpected error: {}", other),
    }

    assert!(!client.is_initialized());
    assert!(client.model_catalog("good").is_none(), "no partial install");
    let health = client.data_health();
    assert_eq!(health.state, Phase::Uninitialized);
    assert_eq!(health.loaded_providers, 0);
    assert!(health.last_error.unwrap().contains("bad"));

    // The failure is retryable once the provider recovers.
    source.set_failing("bad", false);
    client.initialize().await.unwrap();
    assert!(client.is_initialized());
}

// ============================================================================
// Test 4: zero providers still reach Ready, with nothing to select
// ============================================================================

#[tokio::test]
async fn test_initialize_with_no_providers_is_ready_and_empty() {
    let source = Arc::new(StaticCatalogSource::new());
    let client = RouterClient::with_source(RouterConfig::default(), source).unwrap();

    client.initialize().await.unwrap();
    assert!(client.is_initialized());
    assert_eq!(client.data_health().loaded_models, 0);
    assert!(matches!(
        client.select_model(None),
        Err(Error::NoCandidates { .. })
    ));
}

// ============================================================================
// Test 5: staleness follows max_age and drives ensure_fresh_data
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_staleness_follows_max_age() {
    let (client, _source) = setup_client(&["openai"]);
    client.initialize().await.unwrap();

    assert!(!client.is_data_stale());
    assert!(!client.ensure_fresh_data().await.unwrap());

    // Default max age is 168 hours. Data at exactly the threshold is
    // still fresh; one second past it goes stale.
    tokio::time::advance(Duration::from_secs(168 * 3600)).await;
    assert!(!client.is_data_stale());
    assert!(!client.ensure_fresh_data().await.unwrap());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(client.is_data_stale());

    assert!(client.ensure_fresh_data().await.unwrap());
    assert!(!client.is_data_stale());
    assert_eq!(client.data_health().data_age_secs, Some(0));
}

// ============================================================================
// Test 6: shrinking max_age re-evaluates data already loaded
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_set_max_age_reshapes_staleness_window() {
    let (client, _source) = setup_client(&["openai"]);
    client.initialize().await.unwrap();

    tokio::time::advance(Duration::from_secs(2 * 3600)).await;
    assert!(!client.is_data_stale());

    client.set_max_age(1).unwrap();
    assert!(client.is_data_stale());

    client.set_max_age(24).unwrap();
    assert!(!client.is_data_stale());
}

// ============================================================================
// Test 7: a failed refresh keeps the previous data servable
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_keeps_previous_data() {
    let (client, source) = setup_client(&["openai"]);
    client.initialize().await.unwrap();

    tokio::time::advance(Duration::from_secs(3600)).await;
    source.set_failing("openai", true);

    let err = client.refresh_data().await.unwrap_err();
    assert!(matches!(err, Error::Refresh { .. }));

    assert!(client.is_initialized());
    assert!(
        client.model_catalog("openai").is_some(),
        "previous catalog still servable"
    );
    let health = client.data_health();
    assert_eq!(health.state, Phase::Ready);
    assert_eq!(
        health.data_age_secs,
        Some(3600),
        "age not reset by a failed refresh"
    );
    assert!(health.last_error.is_some());

    // The next successful refresh clears the error and resets the age.
    source.set_failing("openai", false);
    client.refresh_data().await.unwrap();
    assert_eq!(client.data_health().data_age_secs, Some(0));
    assert!(client.data_health().last_error.is_none());
}

// ============================================================================
// Test 8: refresh paths require initialization
// ============================================================================

#[tokio::test]
async fn test_refresh_requires_initialization() {
    let (client, _source) = setup_client(&["openai"]);
    assert!(matches!(
        client.refresh_data().await,
        Err(Error::NotInitialized)
    ));
    assert!(matches!(
        client.ensure_fresh_data().await,
        Err(Error::NotInitialized)
    ));
}

// ============================================================================
// Test 9: an added provider loads on the next refresh, not before
// ============================================================================

#[tokio::test]
async fn test_refresh_picks_up_added_provider() {
    let (client, source) = setup_client(&["openai"]);
    client.initialize().await.unwrap();

    source.insert(
        "anthropic",
        ModelCatalog::new(vec![model("claude", 90.0, 15.0, 600.0, true)]),
    );
    client.add_provider(provider("anthropic")).unwrap();
    assert!(
        client.model_catalog("anthropic").is_none(),
        "nothing fetched on add"
    );

    client.refresh_data().await.unwrap();
    assert!(client.model_catalog("anthropic").unwrap().contains("claude"));
    assert_eq!(client.data_health().loaded_providers, 2);
}

// ============================================================================
// Test 10: stale clean-up prunes catalogs of de-configured providers
// ============================================================================

#[tokio::test]
async fn test_stale_clean_up_prunes_dropped_providers() {
    let (client, _source) = setup_client(&["openai", "anthropic"]);
    client.initialize().await.unwrap();

    assert!(client.remove_provider_from_config("anthropic").unwrap());
    assert!(
        client.model_catalog("anthropic").is_some(),
        "catalog lingers after config-only removal"
    );

    // Without stale clean-up the orphan survives refreshes.
    client.refresh_data().await.unwrap();
    assert!(client.model_catalog("anthropic").is_some());

    client.set_stale_clean_up(true).unwrap();
    client.refresh_data().await.unwrap();
    assert!(client.model_catalog("anthropic").is_none());
    assert_eq!(client.data_health().loaded_providers, 1);
}

// ============================================================================
// Test 11: removing provider data leaves the configuration entry alone
// ============================================================================

#[tokio::test]
async fn test_remove_provider_drops_catalog_only() {
    let (client, _source) = setup_client(&["openai", "anthropic"]);
    client.initialize().await.unwrap();

    assert!(client.remove_provider("anthropic").unwrap());
    assert!(client.model_catalog("anthropic").is_none());
    assert!(
        client.provider_names().contains(&"anthropic".to_string()),
        "configuration membership untouched"
    );
    assert!(
        !client.remove_provider("anthropic").unwrap(),
        "second removal reports absence"
    );

    // The entry is still configured, so the next refresh reloads it.
    client.refresh_data().await.unwrap();
    assert!(client.model_catalog("anthropic").is_some());
}

// ============================================================================
// Test 12: a slow refresh blocks writes, never reads
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_slow_refresh_blocks_writes_not_reads() {
    let (client, source) = setup_client(&["openai"]);
    client.initialize().await.unwrap();

    // Replace the served catalog and make the next fetch take a while.
    source.insert(
        "openai",
        ModelCatalog::new(vec![model("gpt-5", 95.0, 8.0, 350.0, false)]),
    );
    source.set_delay(Some(Duration::from_secs(5)));

    let refreshing = {
        let client = client.clone();
        tokio::spawn(async move { client.refresh_data().await })
    };
    tokio::task::yield_now().await;

    // Mutations fail fast while the refresh holds the permit.
    assert!(matches!(
        client.set_max_age(24),
        Err(Error::OperationInProgress)
    ));
    assert!(matches!(
        client.add_provider(provider("x")),
        Err(Error::OperationInProgress)
    ));
    assert!(matches!(
        client.refresh_data().await,
        Err(Error::OperationInProgress)
    ));

    // Reads still answer from the previous snapshot.
    assert_eq!(client.data_health().state, Phase::Refreshing);
    assert!(client.is_initialized());
    assert!(client
        .model_catalog("openai")
        .unwrap()
        .contains("openai-model"));
    let selection = client.select_model(None).unwrap();
    assert_eq!(selection.model.name, "openai-model");

    tokio::time::advance(Duration::from_secs(5)).await;
    refreshing.await.unwrap().unwrap();

    assert!(client.model_catalog("openai").unwrap().contains("gpt-5"));
    client.set_max_age(24).unwrap();
}

// ============================================================================
// Test 13: usage history survives refreshes and provider removal
// ============================================================================

#[tokio::test]
async fn test_usage_history_survives_refresh_and_removal() {
    let (client, _source) = setup_client(&["openai"]);
    client.initialize().await.unwrap();

    client.record_usage("openai", "openai-model");
    client.refresh_data().await.unwrap();
    assert_eq!(client.usage("openai").unwrap().requests, 1);

    client.remove_provider("openai").unwrap();
    assert_eq!(
        client.usage("openai").unwrap().requests,
        1,
        "history survives catalog removal"
    );
    assert_eq!(client.data_health().recorded_requests, 1);
}

// ============================================================================
// Test 14: selection follows the hierarchy and recorded usage
// ============================================================================

#[tokio::test]
async fn test_selection_follows_hierarchy_and_usage() {
    let source = Arc::new(StaticCatalogSource::new());
    source.insert("cheap", ModelCatalog::new(vec![model("m", 70.0, 2.0, 800.0, false)]));
    source.insert("sharp", ModelCatalog::new(vec![model("m", 95.0, 12.0, 400.0, false)]));

    let config = RouterConfig {
        providers: vec![provider("cheap"), provider("sharp")],
        ..RouterConfig::default()
    };
    let client = RouterClient::with_source(config, source).unwrap();
    client.initialize().await.unwrap();

    // Nothing used yet: recency ties, accuracy decides.
    assert_eq!(client.select_model(Some("m")).unwrap().provider, "sharp");

    // Recency outranks accuracy in the default hierarchy.
    client.record_usage("cheap", "m");
    assert_eq!(client.select_model(Some("m")).unwrap().provider, "cheap");

    // Price-first ranking ignores recency.
    client.set_hierarchy(price_first()).unwrap();
    assert_eq!(client.select_model(Some("m")).unwrap().provider, "cheap");

    let accuracy_first = Hierarchy {
        first: Criterion::Accuracy,
        second: Criterion::Price,
        third: Criterion::Latency,
        last: Criterion::LastUsed,
    };
    client.set_hierarchy(accuracy_first).unwrap();
    assert_eq!(client.select_model(Some("m")).unwrap().provider, "sharp");
}

// ============================================================================
// Test 15: the reasoning flag restricts candidates
// ============================================================================

#[tokio::test]
async fn test_reasoning_filter_restricts_candidates() {
    let config = RouterConfig {
        providers: vec![provider("openai")],
        hierarchy: price_first(),
        ..RouterConfig::default()
    };
    let client = RouterClient::with_source(config, two_model_source()).unwrap();
    client.initialize().await.unwrap();

    assert_eq!(client.select_model(None).unwrap().model.name, "fast");

    client.set_reasoning(true).unwrap();
    assert_eq!(client.select_model(None).unwrap().model.name, "thinker");

    let err = client.select_model(Some("fast")).unwrap_err();
    match err {
        Error::NoCandidates { model } => assert_eq!(model, "fast"),
        other => panic!("unexpected error: {}", other),
    }
}

// ============================================================================
// Test 16: removing a model redirects selection
// ============================================================================

#[tokio::test]
async fn test_remove_model_updates_selection() {
    let config = RouterConfig {
        providers: vec![provider("openai")],
        hierarchy: price_first(),
        ..RouterConfig::default()
    };
    let client = RouterClient::with_source(config, two_model_source()).unwrap();
    client.initialize().await.unwrap();

    assert_eq!(client.select_model(None).unwrap().model.name, "fast");

    assert!(client.remove_model("openai", "fast").unwrap());
    assert_eq!(client.select_model(None).unwrap().model.name, "thinker");
    assert!(!client.remove_model("openai", "fast").unwrap());
    assert_eq!(client.data_health().loaded_models, 1);
}

// ============================================================================
// Test 17: selection skips providers no longer in the configuration
// ============================================================================

#[tokio::test]
async fn test_selection_skips_deconfigured_provider() {
    let source = Arc::new(StaticCatalogSource::new());
    source.insert("cheap", ModelCatalog::new(vec![model("m", 70.0, 2.0, 800.0, false)]));
    source.insert("sharp", ModelCatalog::new(vec![model("m", 95.0, 12.0, 400.0, false)]));

    let config = RouterConfig {
        providers: vec![provider("cheap"), provider("sharp")],
        hierarchy: price_first(),
        ..RouterConfig::default()
    };
    let client = RouterClient::with_source(config, source).unwrap();
    client.initialize().await.unwrap();

    assert_eq!(client.select_model(Some("m")).unwrap().provider, "cheap");

    // Config-only removal: the catalog lingers but stops contributing.
    client.remove_provider_from_config("cheap").unwrap();
    assert!(client.model_catalog("cheap").is_some());
    assert_eq!(client.select_model(Some("m")).unwrap().provider, "sharp");
}
