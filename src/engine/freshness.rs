//! Freshness state machine for loaded catalog data.
//!
//! Tracks the Uninitialized -> Initializing -> Ready lifecycle plus the
//! Ready -> Refreshing -> Ready loop:
//! - **Uninitialized**: nothing loaded; most read operations refuse
//! - **Initializing**: first load in flight
//! - **Ready**: catalogs loaded and servable, possibly stale
//! - **Refreshing**: re-load in flight, previous data still servable
//!
//! A failed first load falls back to Uninitialized so the caller can
//! retry; a failed refresh returns to Ready with the previous data.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::error::{Error, Result};

/// The four phases of the data lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No data loaded yet.
    Uninitialized,
    /// First load in flight.
    Initializing,
    /// Data loaded and servable.
    Ready,
    /// Re-load in flight, previous data still servable.
    Refreshing,
}

impl Phase {
    /// Lowercase string representation, matching the serde encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Initializing => "initializing",
            Phase::Ready => "ready",
            Phase::Refreshing => "refreshing",
        }
    }
}

/// Freshness bookkeeping for the loaded catalogs.
///
/// `loaded_at` drives staleness through the tokio clock so tests can
/// advance time; `last_initialization` is the wall-clock timestamp
/// reported to callers.
#[derive(Debug, Clone)]
pub struct FreshnessState {
    phase: Phase,
    loaded_at: Option<tokio::time::Instant>,
    last_initialization: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl FreshnessState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            loaded_at: None,
            last_initialization: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Enter the first load. Only valid from Uninitialized.
    pub fn begin_initialize(&mut self) -> Result<()> {
        match self.phase {
            Phase::Uninitialized => {
                self.phase = Phase::Initializing;
                Ok(())
            }
            _ => Err(Error::AlreadyInitialized),
        }
    }

    /// Enter a re-load. Only valid from Ready.
    pub fn begin_refresh(&mut self) -> Result<()> {
        match self.phase {
            Phase::Ready => {
                self.phase = Phase::Refreshing;
                Ok(())
            }
            Phase::Uninitialized => Err(Error::NotInitialized),
            Phase::Initializing | Phase::Refreshing => Err(Error::OperationInProgress),
        }
    }

    /// Mark the in-flight load successful: data is Ready and fresh.
    pub fn complete_load(&mut self) {
        self.phase = Phase::Ready;
        self.loaded_at = Some(tokio::time::Instant::now());
        self.last_initialization = Some(Utc::now());
        self.last_error = None;
    }

    /// Mark the in-flight load failed.
    ///
    /// A failed first load falls back to Uninitialized; a failed refresh
    /// returns to Ready with `loaded_at` untouched.
    pub fn fail_load(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
        self.phase = match self.phase {
            Phase::Initializing => Phase::Uninitialized,
            Phase::Refreshing => Phase::Ready,
            other => other,
        };
    }

    /// Whether data has been loaded at least once and is still held.
    pub fn is_initialized(&self) -> bool {
        matches!(self.phase, Phase::Ready | Phase::Refreshing)
    }

    /// When the last successful load completed, on the wall clock.
    pub fn last_initialization(&self) -> Option<DateTime<Utc>> {
        self.last_initialization
    }

    /// Whether loaded data has outlived `max_age_hours`.
    ///
    /// Unloaded data is always stale. Data at exactly the threshold is
    /// still fresh; staleness requires strictly exceeding it.
    pub fn is_stale(&self, max_age_hours: u64) -> bool {
        match self.loaded_at {
            None => true,
            Some(at) => at.elapsed() > Duration::from_secs(max_age_hours.saturating_mul(3600)),
        }
    }

    /// Age of the loaded data, if any.
    pub fn data_age(&self) -> Option<Duration> {
        self.loaded_at.map(|at| at.elapsed())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl Default for FreshnessState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time health summary of the loaded data.
#[derive(Debug, Clone, Serialize)]
pub struct HealthDescriptor {
    pub state: Phase,
    pub initialized: bool,
    pub stale: bool,
    pub last_initialization: Option<DateTime<Utc>>,
    pub data_age_secs: Option<u64>,
    pub max_age_hours: u64,
    pub configured_providers: usize,
    pub loaded_providers: usize,
    pub loaded_models: usize,
    pub recorded_requests: u64,
    pub last_error: Option<String>,
}
