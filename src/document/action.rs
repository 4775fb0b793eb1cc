// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Actions: uncommitted intents to mutate one scope of a document.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::document::Scope;
use crate::document::State;
use crate::key::Hash;

/// Action types understood by the engine itself rather than by a schema.
pub mod kinds {
    pub const SET_NAME: &str = "SET_NAME";
    pub const LOAD_STATE: &str = "LOAD_STATE";
    pub const PRUNE: &str = "PRUNE";
    pub const UNDO: &str = "UNDO";
    pub const REDO: &str = "REDO";
    pub const NOOP: &str = "NOOP";

    /// Actions applied to the document rather than to a scope's business state.
    pub fn is_document_action(kind: &str) -> bool {
        return matches!(kind, SET_NAME | LOAD_STATE | PRUNE);
    }

    /// Actions that rewrite the log and never appear in it.
    pub fn is_meta_action(kind: &str) -> bool {
        return matches!(kind, UNDO | REDO | PRUNE);
    }
}

/// A binary payload carried alongside an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub mime_type: String,
    /// Base64 or other textual encoding chosen by the schema.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl Attachment {
    /// Content address of the attachment data.
    pub fn hash(&self) -> Hash {
        return crate::key::hash(self.data.as_bytes());
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub scope: Scope,
    #[serde(rename = "timestampUtc")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub input: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Action {
    /// Create an action with a fresh id, stamped now.
    pub fn new(kind: impl Into<String>, input: Value, scope: Scope) -> Action {
        return Action {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.into(),
            scope,
            timestamp: Utc::now(),
            input,
            attachments: Vec::new(),
        };
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Action {
        self.id = id.into();
        return self;
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Action {
        self.timestamp = timestamp;
        return self;
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Action {
        self.attachments.push(attachment);
        return self;
    }
}

/// Input of a `PRUNE` action: positions in the collected global log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneInput {
    #[serde(default)]
    pub start: Option<u64>,
    #[serde(default)]
    pub end: Option<u64>,
}

/// Input of a `LOAD_STATE` action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "S: State")]
pub struct LoadStateInput<S> {
    pub name: String,
    pub state: S,
    /// How many operations this state stands in for.
    #[serde(default)]
    pub operations: u64,
}

pub fn set_name(name: impl Into<String>) -> Action {
    return Action::new(kinds::SET_NAME, Value::String(name.into()), Scope::Global);
}

pub fn undo(scope: Scope, count: u64) -> Action {
    return Action::new(kinds::UNDO, json!(count), scope);
}

pub fn redo(scope: Scope, count: u64) -> Action {
    return Action::new(kinds::REDO, json!(count), scope);
}

pub fn prune(start: Option<u64>, end: Option<u64>) -> Action {
    return Action::new(kinds::PRUNE, json!(PruneInput { start, end }), Scope::Global);
}

pub fn noop(scope: Scope) -> Action {
    return Action::new(kinds::NOOP, Value::Null, scope);
}

pub fn load_state<S: State>(
    name: impl Into<String>,
    state: &S,
    operations: u64,
) -> Result<Action, serde_json::Error> {
    let input = LoadStateInput {
        name: name.into(),
        state: state.clone(),
        operations,
    };
    return Ok(Action::new(kinds::LOAD_STATE, serde_json::to_value(input)?, Scope::Global));
}
