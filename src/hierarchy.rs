//! Ranking hierarchy for model selection.
//!
//! A hierarchy assigns the four selection criteria to four ranked slots.
//! Candidates are compared slot by slot; the first criterion that
//! distinguishes two candidates decides between them. Every criterion must
//! appear exactly once, which is enforced at construction and on every
//! update.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One of the four closed selection criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Prefer the candidate used most recently (never-used loses).
    LastUsed,
    /// Prefer higher accuracy.
    Accuracy,
    /// Prefer lower price.
    Price,
    /// Prefer lower latency.
    Latency,
}

impl Criterion {
    /// All criteria, in declaration order.
    pub const ALL: [Criterion; 4] = [
        Criterion::LastUsed,
        Criterion::Accuracy,
        Criterion::Price,
        Criterion::Latency,
    ];

    /// Lowercase string representation, matching the serde encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::LastUsed => "last_used",
            Criterion::Accuracy => "accuracy",
            Criterion::Price => "price",
            Criterion::Latency => "latency",
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete ranking of the four criteria.
///
/// Deserialized hierarchies are not validated by serde; callers that accept
/// external input run [`Hierarchy::validate`] before storing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub first: Criterion,
    pub second: Criterion,
    pub third: Criterion,
    pub last: Criterion,
}

impl Hierarchy {
    /// Builds a hierarchy, rejecting any criterion that appears twice.
    pub fn new(
        first: Criterion,
        second: Criterion,
        third: Criterion,
        last: Criterion,
    ) -> Result<Self> {
        let hierarchy = Hierarchy {
            first,
            second,
            third,
            last,
        };
        hierarchy.validate()?;
        Ok(hierarchy)
    }

    /// Checks that every criterion occupies exactly one slot.
    ///
    /// Four slots and four criteria mean a single duplicate check suffices:
    /// if no criterion repeats, all four are present.
    pub fn validate(&self) -> Result<()> {
        let slots = self.ranked();
        for (i, criterion) in slots.iter().enumerate() {
            if slots[..i].contains(criterion) {
                return Err(Error::InvalidHierarchy(format!(
                    "criterion '{}' appears more than once",
                    criterion
                )));
            }
        }
        Ok(())
    }

    /// The four criteria in ranked order, highest priority first.
    pub fn ranked(&self) -> [Criterion; 4] {
        [self.first, self.second, self.third, self.last]
    }
}

impl Default for Hierarchy {
    fn default() -> Self {
        Hierarchy {
            first: Criterion::LastUsed,
            second: Criterion::Accuracy,
            third: Criterion::Price,
            last: Criterion::Latency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ranking_order() {
        let h = Hierarchy::default();
        assert_eq!(
            h.ranked(),
            [
                Criterion::LastUsed,
                Criterion::Accuracy,
                Criterion::Price,
                Criterion::Latency
            ]
        );
        assert!(h.validate().is_ok());
    }

    #[test]
    fn test_new_rejects_duplicate_criterion() {
        let err = Hierarchy::new(
            Criterion::Price,
            Criterion::Accuracy,
            Criterion::Price,
            Criterion::Latency,
        )
        .unwrap_err();
        match err {
            Error::InvalidHierarchy(msg) => assert!(msg.contains("price")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_every_permutation_of_distinct_criteria() {
        let mut count = 0;
        for &a in &Criterion::ALL {
            for &b in &Criterion::ALL {
                for &c in &Criterion::ALL {
                    for &d in &Criterion::ALL {
                        let result = Hierarchy::new(a, b, c, d);
                        let distinct =
                            a != b && a != c && a != d && b != c && b != d && c != d;
                        assert_eq!(result.is_ok(), distinct);
                        if distinct {
                            count += 1;
                        }
                    }
                }
            }
        }
        assert_eq!(count, 24);
    }

    #[test]
    fn test_serde_snake_case_encoding() {
        let h = Hierarchy {
            first: Criterion::Accuracy,
            second: Criterion::LastUsed,
            third: Criterion::Latency,
            last: Criterion::Price,
        };
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.contains("\"last_used\""));
        let back: Hierarchy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_unknown_criterion_fails_deserialization() {
        let json = r#"{"first":"speed","second":"accuracy","third":"price","last":"latency"}"#;
        assert!(serde_json::from_str::<Hierarchy>(json).is_err());
    }
}
