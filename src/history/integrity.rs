// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Structural checks for collected logs.
//!
//! A collected log must have strictly ascending indices, and every entry's
//! logical predecessor must be exactly the entry before it (or the start of
//! the log for the first entry). Violations are returned, never raised.

use serde::Serialize;

use crate::document::Operation;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IntegrityIssue {
    /// The logical predecessor is newer than the previous entry: a hole.
    MissingOperations { expected: i64, found: i64 },
    /// The logical predecessor is older than the previous entry, which
    /// should therefore have been collected.
    UncollectedOperations { expected: i64, found: i64 },
    /// The index does not grow past the previous entry's.
    UnorderedIndex { previous: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IntegrityViolation {
    pub index: u64,
    pub skip: u64,
    pub issue: IntegrityIssue,
}

impl std::fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "index {} (skip {}): ", self.index, self.skip)?;
        return match &self.issue {
            IntegrityIssue::MissingOperations { expected, found } => {
                write!(f, "missing operations, expected logical index {expected}, found {found}")
            }
            IntegrityIssue::UncollectedOperations { expected, found } => {
                write!(f, "uncollected operations, expected logical index {expected}, found {found}")
            }
            IntegrityIssue::UnorderedIndex { previous } => {
                write!(f, "index does not follow previous index {previous}")
            }
        };
    }
}

/// Check a collected log. An empty result means the log is sound.
pub fn check_cleaned_operations_integrity(operations: &[Operation]) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();
    let mut previous: Option<u64> = None;

    for operation in operations {
        let found = operation.logical_index();
        let issue = match previous {
            None if found > 0 => Some(IntegrityIssue::MissingOperations { expected: 0, found }),
            None => None,
            Some(previous) if operation.index <= previous => {
                Some(IntegrityIssue::UnorderedIndex { previous })
            }
            Some(previous) => {
                let expected = i64::try_from(previous).unwrap_or(i64::MAX).saturating_add(1);
                if found > expected {
                    Some(IntegrityIssue::MissingOperations { expected, found })
                } else if found < expected {
                    Some(IntegrityIssue::UncollectedOperations { expected, found })
                } else {
                    None
                }
            }
        };

        if let Some(issue) = issue {
            violations.push(IntegrityViolation {
                index: operation.index,
                skip: operation.skip,
                issue,
            });
        }
        previous = Some(previous.map_or(operation.index, |p| p.max(operation.index)));
    }

    return violations;
}
