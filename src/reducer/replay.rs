// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Rebuilding state from a log.
//!
//! Two primitives live here. `replay` rebuilds a whole document, committing
//! every operation again. `state_through` only recomputes one scope's state
//! at the end of a collected log, optionally resuming from the newest cached
//! state; skip resolution, undo and prune use it.

use tracing::debug;
use tracing::instrument;
use tracing::trace;

use crate::config::ReducerOptions;
use crate::document::Document;
use crate::document::InitialState;
use crate::document::Operation;
use crate::document::PerScope;
use crate::document::Scope;
use crate::document::kinds;
use crate::error::Error;
use crate::history::collect_scopes;
use crate::history::garbage_collect;
use crate::reducer::Commit;
use crate::reducer::Engine;
use crate::reducer::Reducer;

/// A document name and one scope's state, rebuilt from a log.
#[derive(Clone, Debug, PartialEq)]
pub struct Rebuilt<S> {
    pub name: String,
    pub state: S,
}

impl<R: Reducer> Engine<R> {
    /// Rebuild `document` from its initial state by committing `operations`.
    ///
    /// Each scope log is sorted and collected first, so the replayed
    /// document's logs are collected too. The clipboard is not carried over.
    #[instrument(skip_all, fields(document = %document.header.id))]
    pub fn replay(
        &self,
        document: &Document<R::State>,
        operations: &PerScope<Vec<Operation>>,
        options: &ReducerOptions,
    ) -> Result<Document<R::State>, Error> {
        let collected = collect_scopes(operations);
        let options = ReducerOptions {
            ignore_skip_operations: true,
            ..options.clone()
        };

        let mut next = document.reset();
        for scope in Scope::ALL {
            for operation in collected.get(scope) {
                self.append(&mut next, operation.to_action(), Commit::of(operation), &options)?;
            }
        }
        debug!(
            global = next.operations.global.len(),
            local = next.operations.local.len(),
            "replayed document"
        );
        return Ok(next);
    }

    /// The name and scope state as of the logical predecessor of `operation`,
    /// which is about to be appended to `document`.
    pub(super) fn state_before(
        &self,
        document: &Document<R::State>,
        operation: &Operation,
        options: &ReducerOptions,
    ) -> Result<Rebuilt<R::State>, Error> {
        let scope = operation.scope;
        let mut log = document.operations(scope).to_vec();
        log.push(operation.clone());
        let collected = garbage_collect(&log);
        let preceding = &collected[..collected.len() - 1];
        trace!(
            superseded = log.len() - collected.len(),
            "rewinding to logical predecessor"
        );

        let mut rebuilt = self.state_through(&document.initial_state, scope, preceding, options)?;
        if scope != Scope::Global {
            rebuilt.name = document.header.name.clone();
        }
        return Ok(rebuilt);
    }

    /// Recompute the name and one scope's state at the end of a collected log.
    ///
    /// Failed operations are inert. With `reuse_operation_resulting_state`,
    /// the scope state resumes from the newest operation carrying a cache.
    pub fn state_through(
        &self,
        initial: &InitialState<R::State>,
        scope: Scope,
        operations: &[Operation],
        options: &ReducerOptions,
    ) -> Result<Rebuilt<R::State>, Error> {
        let mut state = initial.state.get(scope).clone();
        let mut start = 0;
        if options.reuse_operation_resulting_state {
            let cached = operations
                .iter()
                .enumerate()
                .rev()
                .find_map(|(position, op)| op.resulting_state.as_deref().map(|json| (position, json)));
            if let Some((position, json)) = cached {
                state = serde_json::from_str(json)?;
                start = position + 1;
                trace!(position, "resuming from cached state");
            }
        }

        let mut scratch = String::new();
        for operation in operations[start..].iter().filter(|op| op.error.is_none()) {
            let mut draft = state.clone();
            if self.transition(&mut scratch, &mut draft, &operation.to_action()).is_ok() {
                state = draft;
            }
        }

        return Ok(Rebuilt {
            name: name_through(&initial.name, operations),
            state,
        });
    }
}

/// The document name after a collected log: the last successful rename wins.
fn name_through(initial: &str, operations: &[Operation]) -> String {
    let renamed = operations
        .iter()
        .rev()
        .filter(|op| op.error.is_none() && op.scope == Scope::Global)
        .find_map(|op| match op.kind.as_str() {
            kinds::SET_NAME => op.input.as_str(),
            kinds::LOAD_STATE => op.input.get("name").and_then(|name| name.as_str()),
            _ => None,
        });
    return renamed.unwrap_or(initial).to_string();
}
