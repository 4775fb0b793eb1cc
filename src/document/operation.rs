// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Operations: committed, indexed log entries.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::document::Action;
use crate::document::Attachment;
use crate::document::Scope;
use crate::document::kinds;
use crate::key::Hash;

/// A committed entry in a scope's log.
///
/// `index` grows strictly within a scope but may have gaps. Each gap is
/// accounted for by the `skip` of the entry right after it: the logical
/// predecessor of an entry sits at or below `index - skip - 1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    pub index: u64,
    pub skip: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub scope: Scope,
    #[serde(rename = "timestampUtc")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub input: Value,
    /// Digest of the scope state right after this operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<Hash>,
    /// Set when the business reducer rejected the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Cached JSON of the scope state right after this operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resulting_state: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Operation {
    /// Commit an action at the given position.
    pub fn from_action(action: &Action, index: u64, skip: u64) -> Operation {
        return Operation {
            id: action.id.clone(),
            index,
            skip,
            kind: action.kind.clone(),
            scope: action.scope,
            timestamp: action.timestamp,
            input: action.input.clone(),
            hash: None,
            error: None,
            resulting_state: None,
            attachments: action.attachments.clone(),
        };
    }

    /// The action this operation committed.
    pub fn to_action(&self) -> Action {
        return Action {
            id: self.id.clone(),
            kind: self.kind.clone(),
            scope: self.scope,
            timestamp: self.timestamp,
            input: self.input.clone(),
            attachments: self.attachments.clone(),
        };
    }

    /// `index - skip`: where the logical chain resumes. Saturates at the
    /// bounds of `i64`.
    pub fn logical_index(&self) -> i64 {
        let logical = i128::from(self.index) - i128::from(self.skip);
        return logical.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;
    }

    /// The highest index the logical predecessor may have. Negative when the
    /// operation supersedes the whole log before it.
    pub fn skip_until(&self) -> i64 {
        return self.logical_index().saturating_sub(1);
    }

    pub fn is_noop(&self) -> bool {
        return self.kind == kinds::NOOP;
    }
}
