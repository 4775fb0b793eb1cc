// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! The reducer: a deterministic state machine over documents.
//!
//! Every public entry point classifies its action into a [`Step`] and
//! dispatches it. Plain actions go through [`Engine::append`], the one
//! primitive that commits an operation. Undo, redo and prune rewrite the log
//! and then rebuild state through the same replay functions the public API
//! exposes, so nothing re-enters `apply`.
//!
//! Business failures never abort a call. The failed operation stays in the
//! log with its `error` set and `skip` reset to 0, and the scope state is
//! left as it was before the operation.

mod merge;
mod prune;
mod redo;
mod replay;
mod undo;

use serde_json::Value;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::config::EngineConfig;
use crate::config::ReducerOptions;
use crate::document::Action;
use crate::document::Document;
use crate::document::LoadStateInput;
use crate::document::Operation;
use crate::document::PruneInput;
use crate::document::Scope;
use crate::document::State;
use crate::document::hash_state;
use crate::document::kinds;
use crate::error::ActionError;
use crate::error::Error;
use crate::key::Hash;

pub use replay::Rebuilt;

/// The business logic of a document type.
///
/// `reduce` receives a draft copy of one scope's state. The engine keeps the
/// draft only when `reduce` returns `Ok`, so a reducer may bail out halfway.
pub trait Reducer {
    type State: State;

    fn reduce(&self, state: &mut Self::State, action: &Action) -> Result<(), ActionError>;
}

/// What an action asks the engine to do.
#[derive(Clone, Debug, PartialEq)]
enum Step {
    Apply(Action),
    Undo { scope: Scope, count: u64 },
    Redo { scope: Scope, count: u64 },
    Prune(PruneInput),
}

impl Step {
    fn from_action(action: Action) -> Result<Step, Error> {
        return match action.kind.as_str() {
            kinds::UNDO => Ok(Step::Undo {
                scope: action.scope,
                count: count_input(&action)?,
            }),
            kinds::REDO => Ok(Step::Redo {
                scope: action.scope,
                count: count_input(&action)?,
            }),
            kinds::PRUNE => {
                let input = match &action.input {
                    Value::Null => PruneInput::default(),
                    value => serde_json::from_value(value.clone()).map_err(|e| Error::InvalidInput {
                        kind: action.kind.clone(),
                        reason: e.to_string(),
                    })?,
                };
                Ok(Step::Prune(input))
            }
            _ => Ok(Step::Apply(action)),
        };
    }
}

fn count_input(action: &Action) -> Result<u64, Error> {
    return match &action.input {
        Value::Null => Ok(1),
        value => value.as_u64().ok_or_else(|| Error::InvalidInput {
            kind: action.kind.clone(),
            reason: format!("expected a non-negative count, got {value}"),
        }),
    };
}

/// Where and how an operation lands in its log.
#[derive(Clone, Debug, Default)]
struct Commit {
    /// `None` appends right after the current revision.
    index: Option<u64>,
    skip: u64,
    /// Hash carried by an already committed operation.
    hash: Option<Hash>,
}

impl Commit {
    fn next(skip: u64) -> Commit {
        return Commit { index: None, skip, hash: None };
    }

    fn of(operation: &Operation) -> Commit {
        return Commit {
            index: Some(operation.index),
            skip: operation.skip,
            hash: operation.hash,
        };
    }
}

/// Applies actions to documents of one type.
pub struct Engine<R> {
    reducer: R,
    config: EngineConfig,
}

impl<R: Reducer> Engine<R> {
    pub fn new(reducer: R) -> Engine<R> {
        return Engine::with_config(reducer, EngineConfig::default());
    }

    pub fn with_config(reducer: R, config: EngineConfig) -> Engine<R> {
        return Engine { reducer, config };
    }

    pub fn config(&self) -> &EngineConfig {
        return &self.config;
    }

    pub fn reducer(&self) -> &R {
        return &self.reducer;
    }

    /// Apply an action with the configured default options.
    pub fn apply(&self, document: &Document<R::State>, action: Action) -> Result<Document<R::State>, Error> {
        return self.apply_with(document, action, &self.config.reducer);
    }

    /// Apply an action, returning the next document.
    #[instrument(skip_all, fields(document = %document.header.id, kind = %action.kind, scope = %action.scope))]
    pub fn apply_with(
        &self,
        document: &Document<R::State>,
        action: Action,
        options: &ReducerOptions,
    ) -> Result<Document<R::State>, Error> {
        return match Step::from_action(action)? {
            Step::Undo { scope, count } => self.undo(document, scope, count, options),
            Step::Redo { scope, count } => self.redo(document, scope, count, options),
            Step::Prune(input) => self.prune(document, input.start, input.end, options),
            Step::Apply(action) => {
                let mut next = document.clone();
                self.append(&mut next, action, Commit::next(options.skip), options)?;
                next.clipboard.clear();
                Ok(next)
            }
        };
    }

    /// Append an operation committed elsewhere, at its own index.
    ///
    /// Fails with [`Error::MissingOperations`] when the operation's logical
    /// predecessor is past the end of the local log.
    #[instrument(skip_all, fields(document = %document.header.id, index = operation.index, skip = operation.skip))]
    pub fn apply_operation(
        &self,
        document: &Document<R::State>,
        operation: &Operation,
        options: &ReducerOptions,
    ) -> Result<Document<R::State>, Error> {
        if kinds::is_meta_action(&operation.kind) {
            return Err(Error::InvalidInput {
                kind: operation.kind.clone(),
                reason: "meta actions are never committed to a log".to_string(),
            });
        }
        let mut next = document.clone();
        self.append(&mut next, operation.to_action(), Commit::of(operation), options)?;
        next.clipboard.clear();
        return Ok(next);
    }

    /// Commit one action to its scope's log and advance the scope state.
    fn append(
        &self,
        document: &mut Document<R::State>,
        action: Action,
        commit: Commit,
        options: &ReducerOptions,
    ) -> Result<(), Error> {
        let scope = action.scope;
        let revision = document.revision(scope);
        let index = match commit.index {
            None => (revision + 1) as u64,
            Some(index) => {
                if index > i64::MAX as u64 {
                    return Err(Error::InvalidInput {
                        kind: action.kind.clone(),
                        reason: format!("index {index} is out of range"),
                    });
                }
                if index as i64 <= revision {
                    return Err(Error::StaleIndex { scope, index, revision });
                }
                if i128::from(index) - i128::from(commit.skip) > i128::from(revision) + 1 {
                    return Err(Error::MissingOperations {
                        scope,
                        expected: revision + 1,
                        index,
                        skip: commit.skip,
                    });
                }
                index
            }
        };

        let mut operation = Operation::from_action(&action, index, commit.skip);
        let before = document.state.get(scope).clone();

        // Rewind to the logical predecessor when the operation supersedes
        // part of the log.
        let mut base = Rebuilt {
            name: document.header.name.clone(),
            state: before.clone(),
        };
        if operation.skip > 0 && !options.ignore_skip_operations && operation.skip_until() < revision {
            base = self.state_before(document, &operation, options)?;
        }

        let mut name = base.name;
        let mut draft = base.state;
        match self.transition(&mut name, &mut draft, &action) {
            Ok(()) => {
                *document.state.get_mut(scope) = draft;
                document.header.name = name;
            }
            Err(error) => {
                warn!(index, kind = %action.kind, %error, "action failed; recorded and rolled back");
                operation.error = Some(error.message);
                // A failed operation supersedes nothing, but it still has to
                // sit right after the current head.
                operation.skip = index - (revision + 1) as u64;
                *document.state.get_mut(scope) = before;
            }
        }

        let state = document.state.get(scope);
        let stored = if options.reuse_hash && !options.check_hashes { commit.hash } else { None };
        let hash = match stored {
            Some(hash) => hash,
            None => hash_state(state)?,
        };
        if options.check_hashes {
            if let Some(expected) = commit.hash {
                if expected != hash {
                    return Err(Error::HashMismatch { scope, index });
                }
            }
        }
        operation.hash = Some(hash);
        if options.cache_resulting_state {
            operation.resulting_state = Some(serde_json::to_string(state)?);
        }

        debug!(index, skip = operation.skip, kind = %operation.kind, "appended operation");
        document.operations.get_mut(scope).push(operation);
        *document.header.revision.get_mut(scope) = index as i64;
        if action.timestamp > document.header.last_modified {
            document.header.last_modified = action.timestamp;
        }
        return Ok(());
    }

    /// Run one action against a name and a scope state.
    fn transition(&self, name: &mut String, state: &mut R::State, action: &Action) -> Result<(), ActionError> {
        if kinds::is_document_action(&action.kind) && action.scope != Scope::Global {
            return Err(ActionError::new(format!("{} must target the global scope", action.kind)));
        }
        return match action.kind.as_str() {
            kinds::NOOP => Ok(()),
            kinds::SET_NAME => match &action.input {
                Value::String(text) => {
                    *name = text.clone();
                    Ok(())
                }
                other => Err(ActionError::new(format!("SET_NAME expects a string, got {other}"))),
            },
            kinds::LOAD_STATE => {
                let input: LoadStateInput<R::State> = serde_json::from_value(action.input.clone())
                    .map_err(|e| ActionError::new(format!("invalid LOAD_STATE input: {e}")))?;
                *name = input.name;
                *state = input.state;
                Ok(())
            }
            kinds::PRUNE | kinds::UNDO | kinds::REDO => {
                Err(ActionError::new(format!("{} cannot be replayed", action.kind)))
            }
            _ => self.reducer.reduce(state, action),
        };
    }
}
