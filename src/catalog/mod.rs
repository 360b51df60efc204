//! Provider model catalogs and the sources that fetch them.
//!
//! A catalog source answers one question: which models does a provider
//! currently serve, and with what measured metrics. The HTTP source asks
//! the analysis API; the static source backs tests and embedded setups.

mod http;
mod source;
mod types;

pub use http::HttpCatalogSource;
pub use source::{CatalogError, CatalogSource, StaticCatalogSource};
pub use types::{ModelCatalog, ModelEntry};
