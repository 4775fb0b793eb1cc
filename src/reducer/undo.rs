// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

use smallvec::SmallVec;
use tracing::debug;

use crate::config::ReducerOptions;
use crate::document::Document;
use crate::document::Operation;
use crate::document::Scope;
use crate::error::Error;
use crate::history::garbage_collect;
use crate::reducer::Engine;
use crate::reducer::Reducer;

impl<R: Reducer> Engine<R> {
    /// Take back the last `count` operations of a scope.
    ///
    /// The scope log is collected, then surviving operations are popped from
    /// its tail and appended to the clipboard in removal order. NOOPs met on
    /// the way are dropped and do not count. State is rebuilt from what
    /// remains; the remaining operations keep their hashes.
    pub fn undo(
        &self,
        document: &Document<R::State>,
        scope: Scope,
        count: u64,
        options: &ReducerOptions,
    ) -> Result<Document<R::State>, Error> {
        let mut remaining = garbage_collect(document.operations(scope));
        let mut evicted: SmallVec<[Operation; 2]> = SmallVec::new();
        while (evicted.len() as u64) < count {
            let Some(operation) = remaining.pop() else {
                break;
            };
            if !operation.is_noop() {
                evicted.push(operation);
            }
        }
        if evicted.is_empty() {
            debug!(%scope, "nothing to undo");
            return Ok(document.clone());
        }

        let rebuilt = self.state_through(&document.initial_state, scope, &remaining, options)?;
        let mut next = document.clone();
        *next.state.get_mut(scope) = rebuilt.state;
        if scope == Scope::Global {
            next.header.name = rebuilt.name;
        }
        *next.header.revision.get_mut(scope) = remaining.last().map_or(-1, |op| op.index as i64);
        *next.operations.get_mut(scope) = remaining;
        debug!(%scope, undone = evicted.len(), revision = next.revision(scope), "undid operations");
        next.clipboard.extend(evicted);
        return Ok(next);
    }
}
