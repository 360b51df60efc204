//! Error types for llmroute.

use crate::catalog::CatalogError;

/// Result type alias for llmroute operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for llmroute.
///
/// Validation errors are raised before any state mutation; a failed
/// operation never leaves partially-applied state behind. Removal
/// operations report absence through their `bool` return value instead of
/// an error variant.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Catalog source error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error("Provider '{name}' is already configured")]
    DuplicateProvider { name: String },

    #[error("Client has not been initialized")]
    NotInitialized,

    #[error("Client is already initialized")]
    AlreadyInitialized,

    #[error("Another operation is in progress")]
    OperationInProgress,

    #[error("Refresh failed for provider '{provider}': {source}")]
    Refresh {
        provider: String,
        #[source]
        source: CatalogError,
    },

    #[error("No candidate models available for '{model}'")]
    NoCandidates { model: String },
}
