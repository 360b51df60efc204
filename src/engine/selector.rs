//! Hierarchy-driven model selection over loaded catalogs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

use crate::catalog::ModelEntry;
use crate::hierarchy::{Criterion, Hierarchy};

/// A model eligible for selection, with its provider and recency standing.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub provider: String,
    pub entry: ModelEntry,
    pub last_used: Option<DateTime<Utc>>,
}

/// Winning candidate returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub provider: String,
    pub model: ModelEntry,
}

/// Compare two candidates on a single criterion.
///
/// `Ordering::Greater` means `a` wins the slot. Recency prefers the later
/// timestamp, with never-used always losing. Metric fields compare with
/// `total_cmp`, so a NaN from a malformed catalog cannot poison the walk.
fn compare_on(criterion: Criterion, a: &Candidate, b: &Candidate) -> Ordering {
    match criterion {
        Criterion::LastUsed => a.last_used.cmp(&b.last_used),
        Criterion::Accuracy => a.entry.accuracy.total_cmp(&b.entry.accuracy),
        Criterion::Price => b.entry.output_price.total_cmp(&a.entry.output_price),
        Criterion::Latency => b.entry.latency_ms.total_cmp(&a.entry.latency_ms),
    }
}

/// Whether `challenger` strictly beats `incumbent` under `hierarchy`.
///
/// Criteria are consulted in ranked order; the first slot that
/// distinguishes the two decides. A full tie is not a win.
fn beats(hierarchy: &Hierarchy, challenger: &Candidate, incumbent: &Candidate) -> bool {
    for criterion in hierarchy.ranked() {
        match compare_on(criterion, challenger, incumbent) {
            Ordering::Greater => return true,
            Ordering::Less => return false,
            Ordering::Equal => continue,
        }
    }
    false
}

/// Pick the best candidate under `hierarchy`.
///
/// Full ties keep the earliest candidate, so provider configuration order
/// makes the result deterministic.
pub fn select_best(hierarchy: &Hierarchy, candidates: Vec<Candidate>) -> Option<Selection> {
    let mut best: Option<Candidate> = None;
    for candidate in candidates {
        let wins = match &best {
            None => true,
            Some(incumbent) => beats(hierarchy, &candidate, incumbent),
        };
        if wins {
            best = Some(candidate);
        }
    }

    best.map(|c| Selection {
        provider: c.provider,
        model: c.entry,
    })
}
