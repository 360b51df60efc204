//! Configuration parsing and validation for llmroute.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;

use crate::hierarchy::Hierarchy;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Base URL of the analysis API that serves per-provider model catalogs
    /// (e.g., "https://models.example.com/api")
    pub analysis_api: Option<String>,
    /// Hours before loaded catalog data counts as stale
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
    /// Ranking of the four selection criteria
    #[serde(default)]
    pub hierarchy: Hierarchy,
    /// Restrict selection to reasoning-capable models
    #[serde(default)]
    pub reasoning: bool,
    /// Drop catalogs of de-configured providers on refresh
    #[serde(default)]
    pub stale_clean_up: bool,
    /// Providers whose catalogs are loaded and routed over
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
}

fn default_max_age_hours() -> u64 {
    168
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            analysis_api: None,
            max_age_hours: default_max_age_hours(),
            hierarchy: Hierarchy::default(),
            reasoning: false,
            stale_clean_up: false,
            providers: Vec::new(),
        }
    }
}

/// Provider credential that never prints.
///
/// Wraps `secrecy::SecretString`, so the plaintext is wiped from memory on
/// drop. Formatting or serializing the wrapper yields a redaction marker;
/// the only route to the raw value is `expose_secret()`, which keeps every
/// reader findable with a grep.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Hand out the plaintext key.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Serialize for ApiKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> serde::Deserialize<'de> for ApiKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ApiKey(SecretString::from(raw)))
    }
}

impl From<String> for ApiKey {
    fn from(value: String) -> Self {
        ApiKey(SecretString::from(value))
    }
}

impl From<&str> for ApiKey {
    fn from(value: &str) -> Self {
        ApiKey(SecretString::from(value))
    }
}

/// Where a provider's API key came from.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    /// Written directly in the config file, with no `${VAR}` references
    Literal,
    /// Produced by expanding `${VAR}` references in the configured value
    EnvExpanded,
    /// Picked up from the convention variable named here
    Convention(String),
    /// Nothing configured and no convention variable set
    None,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Literal => f.write_str("config-literal"),
            KeySource::EnvExpanded => f.write_str("env-expanded"),
            KeySource::Convention(var) => write!(f, "convention ({})", var),
            KeySource::None => f.write_str("none"),
        }
    }
}

/// A configured provider and its credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// Unique name for this provider
    pub name: String,
    /// Optional API key sent as a bearer token on catalog fetches
    pub api_key: Option<ApiKey>,
}

impl RouterConfig {
    /// Load a config from disk without `${VAR}` expansion.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;

        Self::parse_str(&text)
    }

    /// Parse and validate a TOML config string.
    pub fn parse_str(text: &str) -> Result<Self, ConfigError> {
        let config: RouterConfig = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate hierarchy and provider entries.
    ///
    /// Catches duplicate criteria in the hierarchy and empty or repeated
    /// provider names. Programmatically built configs go through the same
    /// checks when handed to the client.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(err) = self.hierarchy.validate() {
            return Err(ConfigError::Validation(err.to_string()));
        }

        if self.providers.is_empty() {
            tracing::warn!("No providers configured - catalogs stay empty until one is added");
        }

        for (i, provider) in self.providers.iter().enumerate() {
            if provider.name.is_empty() {
                return Err(ConfigError::Validation(
                    "Provider name is empty".to_string(),
                ));
            }
            if self.providers[..i].iter().any(|p| p.name == provider.name) {
                return Err(ConfigError::Validation(format!(
                    "Provider '{}' appears more than once",
                    provider.name
                )));
            }
        }

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Environment expansion failed for provider '{provider}': {message}")]
    EnvVar {
        var: String,
        provider: String,
        message: String,
    },
}

/// Provider entry exactly as written in the file. The key stays a plain
/// `Option<String>` because it may still carry `${VAR}` references.
#[derive(Deserialize)]
pub struct RawProviderEntry {
    name: String,
    api_key: Option<String>,
}

/// Config exactly as written in the file, before key resolution.
#[derive(Deserialize)]
pub struct RawRouterConfig {
    analysis_api: Option<String>,
    #[serde(default = "default_max_age_hours")]
    max_age_hours: u64,
    #[serde(default)]
    hierarchy: Hierarchy,
    #[serde(default)]
    reasoning: bool,
    #[serde(default)]
    stale_clean_up: bool,
    #[serde(default)]
    providers: Vec<RawProviderEntry>,
}

/// Expand every `${VAR}` reference in `input` through `lookup`.
///
/// Taking the lookup as a closure keeps the engine testable without
/// mutating process env state. A value may mix literal text with several
/// references, as in `${SCHEME}://${HOST}/api`. Any missing variable
/// aborts the whole expansion, as does an unclosed `${` or an empty name.
fn expand_env_vars_with<F>(
    input: &str,
    provider_name: &str,
    lookup: F,
) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !input.contains("${") {
        return Ok(input.to_owned());
    }

    let mut expanded = String::with_capacity(input.len());
    let mut remaining = input;

    while let Some(start) = remaining.find("${") {
        expanded.push_str(&remaining[..start]);
        let tail = &remaining[start + 2..];

        let close = tail.find('}').ok_or_else(|| ConfigError::EnvVar {
            var: "<unclosed>".to_string(),
            provider: provider_name.to_string(),
            message: format!("Unclosed '${{' in value '{}'", input),
        })?;

        let var_name = &tail[..close];
        if var_name.is_empty() {
            return Err(ConfigError::EnvVar {
                var: "".to_string(),
                provider: provider_name.to_string(),
                message: "A '${}' reference has an empty variable name".to_string(),
            });
        }

        let value = lookup(var_name).ok_or_else(|| ConfigError::EnvVar {
            var: var_name.to_string(),
            provider: provider_name.to_string(),
            message: format!("Environment variable '{}' is not set", var_name),
        })?;

        expanded.push_str(&value);
        remaining = &tail[close + 1..];
    }

    expanded.push_str(remaining);
    Ok(expanded)
}

/// Expansion against the real process environment.
fn expand_env_vars(input: &str, provider_name: &str) -> Result<String, ConfigError> {
    expand_env_vars_with(input, provider_name, |name| std::env::var(name).ok())
}

/// Convention variable name for a provider's API key.
///
/// Uppercases the name and maps '-' and ' ' to '_', then wraps it as
/// `LLMROUTE_<NAME>_API_KEY`, so "provider-beta" reads from
/// `LLMROUTE_PROVIDER_BETA_API_KEY`.
pub fn convention_env_var_name(provider_name: &str) -> String {
    let upper_snake = provider_name.to_uppercase().replace(['-', ' '], "_");
    format!("LLMROUTE_{}_API_KEY", upper_snake)
}

/// Check the convention variable for a provider, returning its name and
/// value when set.
fn convention_key_lookup(provider_name: &str) -> Option<(String, String)> {
    let var_name = convention_env_var_name(provider_name);
    std::env::var(&var_name).ok().map(|value| (var_name, value))
}

impl RouterConfig {
    /// Resolve a freshly deserialized config into its final form.
    ///
    /// Each provider's key is settled here. A value holding `${VAR}` gets
    /// expanded against the environment and a plain literal is wrapped
    /// as-is; when no key is written at all, the convention variable is
    /// consulted before giving up. The per-provider `KeySource` trail
    /// comes back alongside the config so callers can report where keys
    /// were found.
    pub fn from_raw(raw: RawRouterConfig) -> Result<(Self, Vec<(String, KeySource)>), ConfigError> {
        let mut providers = Vec::with_capacity(raw.providers.len());
        let mut key_sources = Vec::with_capacity(raw.providers.len());

        for entry in raw.providers {
            let (api_key, source) = match entry.api_key {
                Some(ref value) if value.contains("${") => {
                    let expanded = expand_env_vars(value, &entry.name)?;
                    (Some(ApiKey::from(expanded)), KeySource::EnvExpanded)
                }
                Some(ref value) => (Some(ApiKey::from(value.as_str())), KeySource::Literal),
                None => match convention_key_lookup(&entry.name) {
                    Some((var_name, value)) => {
                        (Some(ApiKey::from(value)), KeySource::Convention(var_name))
                    }
                    None => (None, KeySource::None),
                },
            };

            key_sources.push((entry.name.clone(), source));
            providers.push(ProviderEntry {
                name: entry.name,
                api_key,
            });
        }

        let config = RouterConfig {
            analysis_api: raw.analysis_api,
            max_age_hours: raw.max_age_hours,
            hierarchy: raw.hierarchy,
            reasoning: raw.reasoning,
            stale_clean_up: raw.stale_clean_up,
            providers,
        };

        Ok((config, key_sources))
    }

    /// File loader with `${VAR}` expansion and convention lookup.
    ///
    /// Reads the file, parses it as `RawRouterConfig` so keys stay plain
    /// strings, resolves them through [`Self::from_raw`], and validates
    /// the result. Returns the config together with where each provider's
    /// key came from.
    pub fn from_file_with_env(
        path: impl AsRef<Path>,
    ) -> Result<(Self, Vec<(String, KeySource)>), ConfigError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;

        let raw: RawRouterConfig = toml::from_str(&text).map_err(ConfigError::Parse)?;
        let (config, key_sources) = Self::from_raw(raw)?;
        config.validate()?;

        Ok((config, key_sources))
    }
}
