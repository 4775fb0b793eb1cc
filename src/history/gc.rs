// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Garbage collection of superseded operations.
//!
//! An operation with `skip > 0` declares that everything after its logical
//! predecessor and before itself is dead. Collection walks the log from the
//! tail, keeping each operation and jumping over whatever it supersedes, so a
//! chain of skips is resolved in a single backward pass.
//!
//! Complexity: O(n) for a sorted log.

use tracing::trace;

use crate::document::Operation;
use crate::document::PerScope;

/// Sort a log by index, then by skip.
pub fn sort_operations(operations: &[Operation]) -> Vec<Operation> {
    let mut sorted = operations.to_vec();
    sorted.sort_by(|a, b| a.index.cmp(&b.index).then(a.skip.cmp(&b.skip)));
    return sorted;
}

/// Remove every operation superseded by a later skip.
///
/// Expects a log sorted by index. The result keeps the input order and is a
/// fixed point: collecting it again returns it unchanged.
pub fn garbage_collect(operations: &[Operation]) -> Vec<Operation> {
    let mut kept: Vec<&Operation> = Vec::with_capacity(operations.len());
    let mut i = operations.len();
    while i > 0 {
        let operation = &operations[i - 1];
        kept.push(operation);

        // Jump over every entry newer than the logical predecessor.
        let skip_until = operation.skip_until();
        let mut j = i - 1;
        while j > 0 && i128::from(operations[j - 1].index) > i128::from(skip_until) {
            j -= 1;
        }
        i = j;
    }
    kept.reverse();

    let removed = operations.len() - kept.len();
    if removed > 0 {
        trace!(removed, kept = kept.len(), "collected superseded operations");
    }
    return kept.into_iter().cloned().collect();
}

/// Sort a log of any order, then collect it.
pub fn collect(operations: &[Operation]) -> Vec<Operation> {
    return garbage_collect(&sort_operations(operations));
}

/// Sort and collect the log of every scope.
pub fn collect_scopes(operations: &PerScope<Vec<Operation>>) -> PerScope<Vec<Operation>> {
    return PerScope {
        global: collect(&operations.global),
        local: collect(&operations.local),
    };
}
