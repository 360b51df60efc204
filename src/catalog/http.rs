//! HTTP catalog source backed by the analysis API.

use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;

use super::source::{CatalogError, CatalogSource};
use super::types::ModelCatalog;
use crate::config::ProviderEntry;

/// Catalog source that queries the analysis API over HTTP.
///
/// Each provider's catalog lives at `{endpoint}/providers/{name}/models`.
/// The provider's API key, when present, is forwarded as a bearer token.
pub struct HttpCatalogSource {
    client: Client,
    endpoint: String,
}

impl HttpCatalogSource {
    /// Build a source with reasonable timeout defaults.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Build a source around an existing HTTP client.
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn models_url(&self, provider: &str) -> String {
        format!(
            "{}/providers/{}/models",
            self.endpoint.trim_end_matches('/'),
            provider
        )
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_models(&self, provider: &ProviderEntry) -> Result<ModelCatalog, CatalogError> {
        let url = self.models_url(&provider.name);

        let mut request = self.client.get(&url);
        if let Some(api_key) = &provider.api_key {
            request = request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", api_key.expose_secret()),
            );
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                provider = %provider.name,
                status = %status,
                "Catalog fetch rejected"
            );
            return Err(CatalogError::Status {
                provider: provider.name.clone(),
                status: status.as_u16(),
            });
        }

        response
            .json::<ModelCatalog>()
            .await
            .map_err(|e| CatalogError::Decode {
                provider: provider.name.clone(),
                message: e.to_string(),
            })
    }
}
