// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Collapsing a stretch of history into one `LOAD_STATE`.
//!
//! Positions refer to the collected global log, not to operation indices.
//! The synthetic operation takes the place of the first pruned entry; every
//! later entry is renumbered to follow it directly.

use chrono::Utc;
use tracing::debug;
use tracing::warn;

use crate::config::ReducerOptions;
use crate::document::Document;
use crate::document::Operation;
use crate::document::PerScope;
use crate::document::Scope;
use crate::document::hash_state;
use crate::document::load_state;
use crate::error::Error;
use crate::history::check_cleaned_operations_integrity;
use crate::history::garbage_collect;
use crate::key::hash;
use crate::reducer::Engine;
use crate::reducer::Reducer;

/// Id of the operation standing in for `pruned`. Pruning the same range of
/// the same log on two replicas yields the same id.
fn synthetic_id(pruned: &[Operation]) -> String {
    let mut message = Vec::new();
    for operation in pruned {
        message.extend_from_slice(operation.id.as_bytes());
        message.push(0);
    }
    return hash(&message).to_hex();
}

impl<R: Reducer> Engine<R> {
    /// Replace positions `start..end` of the collected global log with one
    /// `LOAD_STATE` carrying the name and state reached at `end`.
    ///
    /// `start` defaults to 0 and `end` to the log length; an `end` past the
    /// log is clamped. An empty range returns the document unchanged. The
    /// local scope is replayed as it is.
    pub fn prune(
        &self,
        document: &Document<R::State>,
        start: Option<u64>,
        end: Option<u64>,
        options: &ReducerOptions,
    ) -> Result<Document<R::State>, Error> {
        let log = garbage_collect(document.operations(Scope::Global));
        let end = end.map_or(log.len(), |end| (end as usize).min(log.len()));
        let start = start.map_or(0, |start| start as usize);
        if start >= end {
            debug!(start, end, "nothing to prune");
            return Ok(document.clone());
        }

        let reached = self.state_through(&document.initial_state, Scope::Global, &log[..end], options)?;
        let (kept_before, rest) = log.split_at(start);
        let (pruned, kept_after) = rest.split_at(end - start);

        let index = kept_before.last().map_or(0, |op| op.index + 1);
        let timestamp = kept_before
            .last()
            .or(kept_after.first())
            .map_or_else(Utc::now, |op| op.timestamp);
        let action = load_state(reached.name.clone(), &reached.state, pruned.len() as u64)?
            .with_id(synthetic_id(pruned))
            .with_timestamp(timestamp);
        let mut synthetic = Operation::from_action(&action, index, 0);
        synthetic.hash = Some(hash_state(&reached.state)?);

        let mut global = kept_before.to_vec();
        global.push(synthetic);
        for (offset, operation) in kept_after.iter().enumerate() {
            let mut operation = operation.clone();
            operation.index = index + 1 + offset as u64;
            operation.skip = 0;
            global.push(operation);
        }

        if self.config.verify_integrity {
            let violations = check_cleaned_operations_integrity(&global);
            if !violations.is_empty() {
                warn!(count = violations.len(), "pruned log failed integrity check");
                return Err(Error::Integrity(violations));
            }
        }

        debug!(start, end, pruned = pruned.len(), index, "pruned global log");
        let operations = PerScope::new(global, document.operations.local.clone());
        return self.replay(document, &operations, options);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LoadStateInput;
    use crate::document::kinds;
    use crate::document::prune;
    use crate::document::set_name;
    use crate::document::undo;
    use crate::testing::Counter;
    use crate::testing::add;
    use crate::testing::at;

    fn build(engine: &Engine<Counter>, amounts: &[i64]) -> Document<i64> {
        let mut doc = Document::new("counter", PerScope::new(0, 0));
        for (position, amount) in amounts.iter().enumerate() {
            doc = engine
                .apply(&doc, add(*amount).with_timestamp(at(position as i64 + 1)))
                .unwrap();
        }
        return doc;
    }

    #[test]
    fn prune_everything_leaves_one_load_state() {
        let engine = Engine::new(Counter);
        let doc = build(&engine, &[1, 2, 3]);
        let pruned = engine.apply(&doc, prune(None, None)).unwrap();
        let ops = pruned.operations(Scope::Global);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, kinds::LOAD_STATE);
        assert_eq!((ops[0].index, ops[0].skip), (0, 0));
        assert_eq!(pruned.state, doc.state);
        assert_eq!(ops[0].hash, doc.last_operation(Scope::Global).unwrap().hash);
    }

    #[test]
    fn prune_middle_renumbers_the_rest() {
        let engine = Engine::new(Counter);
        let doc = build(&engine, &[1, 2, 3, 4, 5]);
        let pruned = engine.apply(&doc, prune(Some(1), Some(3))).unwrap();
        let ops = pruned.operations(Scope::Global);
        let indices: Vec<(u64, u64)> = ops.iter().map(|op| (op.index, op.skip)).collect();
        assert_eq!(indices, vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(pruned.state.global, 15);
        assert_eq!(pruned.revision(Scope::Global), 3);

        let input: LoadStateInput<i64> = serde_json::from_value(ops[1].input.clone()).unwrap();
        assert_eq!(input.state, 6);
        assert_eq!(input.operations, 2);
        // Timestamp of the last operation kept before the range.
        assert_eq!(ops[1].timestamp, at(1));
    }

    #[test]
    fn prune_from_start_takes_timestamp_from_after() {
        let engine = Engine::new(Counter);
        let doc = build(&engine, &[1, 2, 3]);
        let pruned = engine.apply(&doc, prune(Some(0), Some(2))).unwrap();
        let ops = pruned.operations(Scope::Global);
        assert_eq!(ops[0].timestamp, at(3));
        assert_eq!(ops[1].index, 1);
        assert_eq!(pruned.state.global, 6);
    }

    #[test]
    fn empty_range_is_a_no_op() {
        let engine = Engine::new(Counter);
        let doc = build(&engine, &[1, 2]);
        assert_eq!(engine.apply(&doc, prune(Some(2), Some(2))).unwrap(), doc);
        assert_eq!(engine.apply(&doc, prune(Some(5), None)).unwrap(), doc);
    }

    #[test]
    fn end_past_the_log_is_clamped() {
        let engine = Engine::new(Counter);
        let doc = build(&engine, &[1, 2]);
        let pruned = engine.apply(&doc, prune(Some(1), Some(99))).unwrap();
        assert_eq!(pruned.operations(Scope::Global).len(), 2);
        assert_eq!(pruned.state.global, 3);
    }

    #[test]
    fn synthetic_id_is_deterministic() {
        let engine = Engine::new(Counter);
        let doc = build(&engine, &[1, 2, 3]);
        let a = engine.apply(&doc, prune(Some(0), Some(2))).unwrap();
        let b = engine.apply(&doc, prune(Some(0), Some(2))).unwrap();
        assert_eq!(a.operations.global[0].id, b.operations.global[0].id);
        let c = engine.apply(&doc, prune(Some(0), Some(3))).unwrap();
        assert_ne!(a.operations.global[0].id, c.operations.global[0].id);
    }

    #[test]
    fn prune_carries_the_name() {
        let engine = Engine::new(Counter);
        let doc = build(&engine, &[1]);
        let doc = engine.apply(&doc, set_name("kept")).unwrap();
        let pruned = engine.apply(&doc, prune(None, None)).unwrap();
        assert_eq!(pruned.name(), "kept");
    }

    #[test]
    fn prune_clears_clipboard_and_keeps_local() {
        let engine = Engine::new(Counter);
        let doc = build(&engine, &[1, 2]);
        let mut local = add(9);
        local.scope = Scope::Local;
        let doc = engine.apply(&doc, local).unwrap();
        let doc = engine.apply(&doc, undo(Scope::Global, 1)).unwrap();
        assert_eq!(doc.clipboard.len(), 1);
        let pruned = engine.apply(&doc, prune(None, None)).unwrap();
        assert!(pruned.clipboard.is_empty());
        assert_eq!(pruned.state.local, 9);
        assert_eq!(pruned.operations(Scope::Local), doc.operations(Scope::Local));
    }
}
