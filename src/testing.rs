// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Shared fixtures for unit tests.

use chrono::TimeZone;
use chrono::Utc;
use serde_json::Value;

use crate::document::Action;
use crate::document::Operation;
use crate::document::Scope;
use crate::error::ActionError;
use crate::reducer::Reducer;

/// A bare operation at `index`, stamped `index` seconds after the epoch.
pub fn op(id: &str, index: u64, skip: u64) -> Operation {
    return op_at(id, index, skip, index as i64);
}

pub fn op_at(id: &str, index: u64, skip: u64, seconds: i64) -> Operation {
    let action = Action::new("TEST", Value::Null, Scope::Global)
        .with_id(id)
        .with_timestamp(at(seconds));
    return Operation::from_action(&action, index, skip);
}

pub fn at(seconds: i64) -> chrono::DateTime<Utc> {
    return Utc.timestamp_opt(seconds, 0).single().unwrap();
}

/// `(id, index, skip)` of every entry, for compact assertions.
pub fn shape(operations: &[Operation]) -> Vec<(&str, u64, u64)> {
    return operations
        .iter()
        .map(|op| (op.id.as_str(), op.index, op.skip))
        .collect();
}

/// A counter: `ADD` adds its input, `FAIL` always fails, `SET` overwrites.
pub struct Counter;

impl Reducer for Counter {
    type State = i64;

    fn reduce(&self, state: &mut i64, action: &Action) -> Result<(), ActionError> {
        match action.kind.as_str() {
            "ADD" => {
                let amount = action.input.as_i64().ok_or_else(|| ActionError::new("ADD needs a number"))?;
                *state += amount;
            }
            "SET" => {
                *state = action.input.as_i64().ok_or_else(|| ActionError::new("SET needs a number"))?;
            }
            "FAIL" => {
                *state += 1000;
                return Err(ActionError::new("refused"));
            }
            other => return Err(ActionError::new(format!("unknown action {other}"))),
        }
        return Ok(());
    }
}

pub fn add(amount: i64) -> Action {
    return Action::new("ADD", Value::from(amount), Scope::Global);
}
