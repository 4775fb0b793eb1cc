// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Error types.
//!
//! Business failures raised by a scope reducer are [`ActionError`]s. The
//! engine never propagates them: they are recorded on the operation that
//! caused them. Everything in [`Error`] is structural and does propagate.

use thiserror::Error;

use crate::document::Scope;
use crate::history::IntegrityViolation;

/// A failure raised by a business reducer while applying one action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> ActionError {
        return ActionError { message: message.into() };
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// The incoming operation's logical predecessor is past the end of the log.
    #[error("missing operations in {scope} scope: expected index {expected}, got {index} with skip {skip}")]
    MissingOperations {
        scope: Scope,
        expected: i64,
        index: u64,
        skip: u64,
    },

    /// The incoming operation does not extend the log.
    #[error("stale operation index {index} in {scope} scope: revision is already {revision}")]
    StaleIndex { scope: Scope, index: u64, revision: i64 },

    /// A replayed hash disagrees with the one stored on the operation.
    #[error("hash mismatch in {scope} scope at index {index}")]
    HashMismatch { scope: Scope, index: u64 },

    /// A rewritten log failed the integrity checker.
    #[error("log integrity violated: {}", describe(.0))]
    Integrity(Vec<IntegrityViolation>),

    #[error("cannot merge document {other} into document {target}")]
    DocumentMismatch { target: String, other: String },

    #[error("invalid {kind} input: {reason}")]
    InvalidInput { kind: String, reason: String },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn describe(violations: &[IntegrityViolation]) -> String {
    return violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ");
}
