// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Engine configuration.
//!
//! Both structs deserialize from camelCase JSON, and every field has a
//! default, so a config file only lists what it changes.

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::history::TieBreak;

/// Per-call knobs of the reducer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReducerOptions {
    /// Skip to give a freshly appended action.
    pub skip: u64,
    /// Apply on top of the current state even when the operation has a skip.
    /// Safe only when the log has already been collected.
    pub ignore_skip_operations: bool,
    /// Trust hashes carried by committed operations instead of recomputing.
    pub reuse_hash: bool,
    /// Resume skip resolution and undo from the nearest cached state.
    pub reuse_operation_resulting_state: bool,
    /// Store the serialized resulting state on every new operation.
    pub cache_resulting_state: bool,
    /// Recompute every hash and fail on a mismatch with the stored one.
    pub check_hashes: bool,
}

impl ReducerOptions {
    pub fn with_skip(skip: u64) -> ReducerOptions {
        return ReducerOptions { skip, ..ReducerOptions::default() };
    }

    /// Options for a cache-heavy replica: states are cached on every
    /// operation and reused on every rewind.
    pub fn cached() -> ReducerOptions {
        return ReducerOptions {
            reuse_operation_resulting_state: true,
            cache_resulting_state: true,
            ..ReducerOptions::default()
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Options used when a call does not pass its own.
    pub reducer: ReducerOptions,
    /// Order used to interleave divergent tails.
    pub tie_break: TieBreak,
    /// Check rewritten logs before replaying them.
    pub verify_integrity: bool,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        return EngineConfig {
            reducer: ReducerOptions::default(),
            tie_break: TieBreak::default(),
            verify_integrity: true,
        };
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<EngineConfig, Error> {
        return Ok(serde_json::from_str(text)?);
    }
}
