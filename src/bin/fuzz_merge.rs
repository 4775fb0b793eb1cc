// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! AFL fuzz harness for the merge engine.
//!
//! This harness tests the properties replicas rely on:
//! 1. Convergence: replicas that exchanged everything hold the same log
//! 2. Every merged log passes the integrity checker
//! 3. Replaying a merged log reproduces the merged state
//!
//! Model: each user holds a replica of one document. They edit and undo
//! locally and periodically merge another user's replica into their own.
//! Timestamps come from one global clock, so every tie-break is decided.

use afl::fuzz;
use chrono::DateTime;
use lineage::Action;
use lineage::Document;
use lineage::Engine;
use lineage::ReducerOptions;
use lineage::Scope;
use lineage::document::PerScope;
use lineage::document::undo;
use lineage::error::ActionError;
use lineage::history::check_cleaned_operations_integrity;
use lineage::reducer::Reducer;

const NUM_USERS: usize = 3;

/// A reducer whose result depends on the order of its actions.
struct Polynomial;

impl Reducer for Polynomial {
    type State = i64;

    fn reduce(&self, state: &mut i64, action: &Action) -> Result<(), ActionError> {
        let term = action.input.as_i64().ok_or_else(|| ActionError::new("expected a number"))?;
        if term == 0 {
            return Err(ActionError::new("zero terms are refused"));
        }
        *state = state.wrapping_mul(31).wrapping_add(term);
        return Ok(());
    }
}

/// Operation types the fuzzer can generate
#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    /// User appends a term to their replica
    Push { user: u8, term: u8 },
    /// User undoes their latest operations
    Undo { user: u8, count: u8 },
    /// User A merges user B's replica into their own
    Broadcast { from: u8, to: u8 },
    /// All users sync (full mesh broadcast)
    FullSync,
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        let (kind, rest) = bytes.split_first()?;
        return match kind % 4 {
            0 if rest.len() >= 2 => Some((
                FuzzOp::Push {
                    user: rest[0] % NUM_USERS as u8,
                    term: rest[1],
                },
                &rest[2..],
            )),
            1 if rest.len() >= 2 => Some((
                FuzzOp::Undo {
                    user: rest[0] % NUM_USERS as u8,
                    count: rest[1] % 4,
                },
                &rest[2..],
            )),
            2 if rest.len() >= 2 => Some((
                FuzzOp::Broadcast {
                    from: rest[0] % NUM_USERS as u8,
                    to: rest[1] % NUM_USERS as u8,
                },
                &rest[2..],
            )),
            3 => Some((FuzzOp::FullSync, rest)),
            _ => None,
        };
    }
}

fn full_sync(engine: &Engine<Polynomial>, replicas: &mut [Document<i64>]) {
    for i in 0..NUM_USERS {
        for j in 0..NUM_USERS {
            if i != j {
                let source = replicas[j].clone();
                replicas[i] = engine.merge(&replicas[i], &source).expect("merge failed");
            }
        }
    }

    // CRITICAL INVARIANT: all replicas must converge!
    let first = &replicas[0];
    for (i, r) in replicas.iter().enumerate().skip(1) {
        let ids = |doc: &Document<i64>| -> Vec<String> {
            return doc.operations(Scope::Global).iter().map(|op| op.id.clone()).collect();
        };
        assert_eq!(ids(r), ids(first), "Convergence failure! User {} != User 0 after full sync", i);
        assert_eq!(r.state.global, first.state.global, "State divergence for user {}", i);
    }
}

fn main() {
    let engine = Engine::new(Polynomial);
    let origin: Document<i64> = Document::new("polynomial", PerScope::new(0, 0)).with_id("fuzz");

    fuzz!(|data: &[u8]| {
        let mut replicas: Vec<Document<i64>> = vec![origin.clone(); NUM_USERS];
        let mut clock: i64 = 0;
        let mut remaining = data;

        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;

            match op {
                FuzzOp::Push { user, term } => {
                    clock += 1;
                    let timestamp = DateTime::from_timestamp(clock, 0).expect("clock in range");
                    let action = Action::new("PUSH", i64::from(term).into(), Scope::Global).with_timestamp(timestamp);
                    let r = &mut replicas[user as usize];
                    *r = engine.apply(r, action).expect("apply failed");
                }

                FuzzOp::Undo { user, count } => {
                    let r = &mut replicas[user as usize];
                    *r = engine.apply(r, undo(Scope::Global, u64::from(count))).expect("undo failed");
                }

                FuzzOp::Broadcast { from, to } => {
                    if from != to {
                        let source = replicas[from as usize].clone();
                        let target = &mut replicas[to as usize];
                        *target = engine.merge(target, &source).expect("merge failed");
                        let violations = check_cleaned_operations_integrity(target.operations(Scope::Global));
                        assert!(violations.is_empty(), "Merged log is not clean: {:?}", violations);
                    }
                }

                FuzzOp::FullSync => full_sync(&engine, &mut replicas),
            }
        }

        full_sync(&engine, &mut replicas);

        // Replaying the converged log must land on the same state.
        for r in &replicas {
            let replayed = engine.replay(r, &r.operations, &ReducerOptions::default()).expect("replay failed");
            assert_eq!(replayed.state, r.state, "Replay mismatch");
        }
    });
}
