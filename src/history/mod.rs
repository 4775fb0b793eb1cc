// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Pure functions over operation logs.
//!
//! Nothing here touches document state. The reducer uses these helpers to
//! decide what to replay; the merge engine uses them to reconcile replicas.

mod gc;
mod integrity;
mod merge;

pub use gc::collect;
pub use gc::collect_scopes;
pub use gc::garbage_collect;
pub use gc::sort_operations;
pub use integrity::IntegrityIssue;
pub use integrity::IntegrityViolation;
pub use integrity::check_cleaned_operations_integrity;
pub use merge::ReshuffleKey;
pub use merge::Split;
pub use merge::TieBreak;
pub use merge::filter_duplicated_operations;
pub use merge::merge;
pub use merge::reshuffle;
pub use merge::reshuffle_by_timestamp;
pub use merge::reshuffle_by_timestamp_and_index;
pub use merge::split;
