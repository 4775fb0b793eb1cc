// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! The document model.
//!
//! A document is a set of per-scope states plus, for each scope, the ordered
//! log of operations that produced it. The state is always a function of
//! replaying the log from the initial state; the log is the source of truth.
//!
//! Documents are values. Every engine call returns a new document and leaves
//! its input untouched.

mod action;
mod hash;
mod operation;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use action::Action;
pub use action::Attachment;
pub use action::LoadStateInput;
pub use action::PruneInput;
pub use action::kinds;
pub use action::load_state;
pub use action::noop;
pub use action::prune;
pub use action::redo;
pub use action::set_name;
pub use action::undo;
pub use hash::hash_state;
pub use operation::Operation;

/// Bounds every business state must satisfy.
///
/// States are cloned into drafts before each reduction and serialized for
/// hashing, so serialization must be deterministic: prefer `BTreeMap` over
/// `HashMap` for keyed collections.
pub trait State: Clone + std::fmt::Debug + Default + PartialEq + Serialize + DeserializeOwned {}

impl<T> State for T where T: Clone + std::fmt::Debug + Default + PartialEq + Serialize + DeserializeOwned {}

/// A named partition of a document, revisioned independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Shared between every replica.
    Global,
    /// Private to one replica.
    Local,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::Global, Scope::Local];

    pub fn as_str(&self) -> &'static str {
        return match self {
            Scope::Global => "global",
            Scope::Local => "local",
        };
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(self.as_str());
    }
}

/// One value per scope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerScope<T> {
    pub global: T,
    pub local: T,
}

impl<T> PerScope<T> {
    pub fn new(global: T, local: T) -> PerScope<T> {
        return PerScope { global, local };
    }

    pub fn get(&self, scope: Scope) -> &T {
        return match scope {
            Scope::Global => &self.global,
            Scope::Local => &self.local,
        };
    }

    pub fn get_mut(&mut self, scope: Scope) -> &mut T {
        return match scope {
            Scope::Global => &mut self.global,
            Scope::Local => &mut self.local,
        };
    }

    /// Transform both values, passing along the scope each belongs to.
    pub fn map<U>(self, mut f: impl FnMut(Scope, T) -> U) -> PerScope<U> {
        return PerScope {
            global: f(Scope::Global, self.global),
            local: f(Scope::Local, self.local),
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub id: String,
    pub name: String,
    pub document_type: String,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    /// Index of the newest operation in each scope, or -1 when empty.
    pub revision: PerScope<i64>,
}

/// The state a document's log is replayed from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(bound = "S: State")]
pub struct InitialState<S> {
    pub name: String,
    pub state: PerScope<S>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "S: State")]
pub struct Document<S> {
    pub header: Header,
    pub initial_state: InitialState<S>,
    pub state: PerScope<S>,
    pub operations: PerScope<Vec<Operation>>,
    /// Operations evicted by undo, in removal order: the last entry is the
    /// one removed most recently.
    #[serde(default)]
    pub clipboard: Vec<Operation>,
}

impl<S: State> Document<S> {
    /// Create an empty document of the given type.
    pub fn new(document_type: impl Into<String>, state: PerScope<S>) -> Document<S> {
        let now = Utc::now();
        return Document {
            header: Header {
                id: uuid::Uuid::new_v4().to_string(),
                name: String::new(),
                document_type: document_type.into(),
                created: now,
                last_modified: now,
                revision: PerScope::new(-1, -1),
            },
            initial_state: InitialState {
                name: String::new(),
                state: state.clone(),
            },
            state,
            operations: PerScope::default(),
            clipboard: Vec::new(),
        };
    }

    /// Set the document id. Replicas of one document share it.
    pub fn with_id(mut self, id: impl Into<String>) -> Document<S> {
        self.header.id = id.into();
        return self;
    }

    /// Set the initial name.
    pub fn with_name(mut self, name: impl Into<String>) -> Document<S> {
        let name = name.into();
        self.header.name = name.clone();
        self.initial_state.name = name;
        return self;
    }

    pub fn id(&self) -> &str {
        return &self.header.id;
    }

    pub fn name(&self) -> &str {
        return &self.header.name;
    }

    pub fn revision(&self, scope: Scope) -> i64 {
        return *self.header.revision.get(scope);
    }

    pub fn operations(&self, scope: Scope) -> &[Operation] {
        return self.operations.get(scope);
    }

    pub fn last_operation(&self, scope: Scope) -> Option<&Operation> {
        return self.operations.get(scope).last();
    }

    /// The same document rewound to its initial state, with empty logs.
    pub fn reset(&self) -> Document<S> {
        return Document {
            header: Header {
                name: self.initial_state.name.clone(),
                last_modified: self.header.created,
                revision: PerScope::new(-1, -1),
                ..self.header.clone()
            },
            initial_state: self.initial_state.clone(),
            state: self.initial_state.state.clone(),
            operations: PerScope::default(),
            clipboard: Vec::new(),
        };
    }
}
