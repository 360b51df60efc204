//! Mutable configuration state behind the client facade.

use crate::config::RouterConfig;
use crate::error::{Error, Result};
use crate::hierarchy::Hierarchy;

use super::registry::ProviderSet;

/// Validated runtime configuration.
///
/// Setters validate before assigning, so a rejected update leaves the
/// previous value fully intact.
#[derive(Debug, Clone)]
pub struct ConfigState {
    max_age_hours: u64,
    hierarchy: Hierarchy,
    reasoning: bool,
    stale_clean_up: bool,
    providers: ProviderSet,
}

impl ConfigState {
    /// Take ownership of an already-validated `RouterConfig`.
    pub fn new(config: RouterConfig) -> Self {
        Self {
            max_age_hours: config.max_age_hours,
            hierarchy: config.hierarchy,
            reasoning: config.reasoning,
            stale_clean_up: config.stale_clean_up,
            providers: ProviderSet::new(config.providers),
        }
    }

    pub fn max_age_hours(&self) -> u64 {
        self.max_age_hours
    }

    /// Set the staleness threshold in hours. Negative values are rejected;
    /// zero means loaded data is always considered stale.
    pub fn set_max_age(&mut self, hours: i64) -> Result<()> {
        if hours < 0 {
            return Err(Error::InvalidArgument(format!(
                "max age must be non-negative, got {}",
                hours
            )));
        }
        self.max_age_hours = hours as u64;
        Ok(())
    }

    pub fn hierarchy(&self) -> Hierarchy {
        self.hierarchy
    }

    /// Replace the ranking hierarchy after validating it.
    pub fn set_hierarchy(&mut self, hierarchy: Hierarchy) -> Result<()> {
        hierarchy.validate()?;
        self.hierarchy = hierarchy;
        Ok(())
    }

    pub fn reasoning(&self) -> bool {
        self.reasoning
    }

    pub fn set_reasoning(&mut self, enabled: bool) {
        self.reasoning = enabled;
    }

    pub fn stale_clean_up(&self) -> bool {
        self.stale_clean_up
    }

    pub fn set_stale_clean_up(&mut self, enabled: bool) {
        self.stale_clean_up = enabled;
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    pub fn providers_mut(&mut self) -> &mut ProviderSet {
        &mut self.providers
    }
}
