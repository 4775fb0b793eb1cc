// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

use tracing::info_span;

use crate::config::ReducerOptions;
use crate::document::Document;
use crate::document::PerScope;
use crate::document::Scope;
use crate::error::Error;
use crate::history::TieBreak;
use crate::history::merge;
use crate::reducer::Engine;
use crate::reducer::Reducer;

impl<R: Reducer> Engine<R> {
    /// Merge another replica of the same document into `target`, using the
    /// configured tie-break and options.
    pub fn merge(&self, target: &Document<R::State>, other: &Document<R::State>) -> Result<Document<R::State>, Error> {
        return self.merge_with(target, other, self.config.tie_break, &self.config.reducer);
    }

    /// Merge the global logs of two replicas and replay the result.
    ///
    /// The local scope belongs to the target replica and is kept as is.
    /// Hashes of the shared prefix are reused; the reshuffled tail is hashed
    /// again during replay.
    pub fn merge_with(
        &self,
        target: &Document<R::State>,
        other: &Document<R::State>,
        tie_break: TieBreak,
        options: &ReducerOptions,
    ) -> Result<Document<R::State>, Error> {
        if target.id() != other.id() {
            return Err(Error::DocumentMismatch {
                target: target.id().to_string(),
                other: other.id().to_string(),
            });
        }
        let _span = info_span!("merge", document = %target.id()).entered();

        let global = merge(target.operations(Scope::Global), other.operations(Scope::Global), tie_break)?;
        let operations = PerScope::new(global, target.operations.local.clone());
        let options = ReducerOptions {
            reuse_hash: true,
            ..options.clone()
        };
        return self.replay(target, &operations, &options);
    }
}
