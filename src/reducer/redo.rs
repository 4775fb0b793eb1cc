// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

use tracing::debug;

use crate::config::ReducerOptions;
use crate::document::Document;
use crate::document::Scope;
use crate::error::Error;
use crate::reducer::Commit;
use crate::reducer::Engine;
use crate::reducer::Reducer;

impl<R: Reducer> Engine<R> {
    /// Re-apply the most recently undone operations of a scope.
    ///
    /// An operation whose predecessor is still the head of the log goes back
    /// at its original index and skip, so an undo/redo pair restores the log
    /// exactly. Otherwise it is appended fresh after the current revision.
    /// Clipboard entries of other scopes are left in place.
    pub fn redo(
        &self,
        document: &Document<R::State>,
        scope: Scope,
        count: u64,
        options: &ReducerOptions,
    ) -> Result<Document<R::State>, Error> {
        let mut next = document.clone();
        let mut redone = 0;
        while redone < count {
            let Some(position) = next.clipboard.iter().rposition(|op| op.scope == scope) else {
                break;
            };
            let operation = next.clipboard.remove(position);
            let commit = if operation.skip_until() == next.revision(scope) {
                Commit {
                    index: Some(operation.index),
                    skip: operation.skip,
                    hash: None,
                }
            } else {
                Commit::next(0)
            };
            let options = ReducerOptions {
                ignore_skip_operations: true,
                ..options.clone()
            };
            self.append(&mut next, operation.to_action(), commit, &options)?;
            redone += 1;
        }
        debug!(%scope, redone, left = next.clipboard.len(), "redid operations");
        return Ok(next);
    }
}
