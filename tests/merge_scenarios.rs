// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Merge scenarios over hand-built logs.

use chrono::DateTime;
use chrono::Utc;
use serde_json::Value;

use lineage::Action;
use lineage::Error;
use lineage::Operation;
use lineage::Scope;
use lineage::history::IntegrityIssue;
use lineage::history::TieBreak;
use lineage::history::check_cleaned_operations_integrity;
use lineage::history::garbage_collect;
use lineage::history::merge;

// =============================================================================
// Helper functions
// =============================================================================

fn at(seconds: i64) -> DateTime<Utc> {
    return DateTime::from_timestamp(seconds, 0).unwrap();
}

fn entry(id: &str, index: u64, skip: u64, seconds: i64) -> Operation {
    let action = Action::new("TEST", Value::Null, Scope::Global)
        .with_id(id)
        .with_timestamp(at(seconds));
    return Operation::from_action(&action, index, skip);
}

fn shape(operations: &[Operation]) -> Vec<(&str, u64, u64)> {
    return operations
        .iter()
        .map(|op| (op.id.as_str(), op.index, op.skip))
        .collect();
}

// =============================================================================
// Fixture scenario
// =============================================================================

fn fixture() -> (Vec<Operation>, Vec<Operation>) {
    let target = vec![
        entry("0", 0, 0, 0),
        entry("1", 1, 0, 1),
        entry("2", 2, 0, 2),
        entry("A3", 3, 0, 3),
        entry("A4", 4, 0, 5),
        entry("A5", 5, 0, 7),
    ];
    let incoming = vec![
        entry("0", 0, 0, 0),
        entry("1", 1, 0, 1),
        entry("2", 2, 0, 2),
        entry("B3", 3, 0, 3),
        entry("B4", 4, 2, 4),
        entry("B5", 5, 0, 6),
    ];
    return (target, incoming);
}

#[test]
fn fixture_merge_shape() {
    let (target, incoming) = fixture();
    let merged = merge(&target, &incoming, TieBreak::TimestampAndIndex).unwrap();
    assert_eq!(
        shape(&merged),
        vec![
            ("0", 0, 0),
            ("1", 1, 0),
            ("2", 6, 4),
            ("A3", 7, 0),
            ("B4", 8, 0),
            ("A4", 9, 0),
            ("B5", 10, 0),
            ("A5", 11, 0),
        ]
    );
    assert!(check_cleaned_operations_integrity(&merged).is_empty());
}

#[test]
fn fixture_superseded_entries_never_come_back() {
    let (target, incoming) = fixture();
    let merged = merge(&target, &incoming, TieBreak::TimestampAndIndex).unwrap();
    // B4 superseded "2" and B3 on its own branch; "2" survives from the
    // target, B3 is gone.
    assert!(merged.iter().all(|op| op.id != "B3"));
    assert_eq!(merged.iter().filter(|op| op.id == "2").count(), 1);
}

#[test]
fn fixture_is_stable_under_both_tie_breaks() {
    let (target, incoming) = fixture();
    let by_index = merge(&target, &incoming, TieBreak::TimestampAndIndex).unwrap();
    let by_time = merge(&target, &incoming, TieBreak::Timestamp).unwrap();
    assert_eq!(shape(&by_index), shape(&by_time));
}

#[test]
fn renumbered_entries_drop_hashes() {
    let (mut target, incoming) = fixture();
    for op in target.iter_mut() {
        op.hash = Some(lineage::key::hash(op.id.as_bytes()));
    }
    let merged = merge(&target, &incoming, TieBreak::default()).unwrap();
    assert!(merged[..2].iter().all(|op| op.hash.is_some()));
    assert!(merged[2..].iter().all(|op| op.hash.is_none()));
}

// =============================================================================
// Tie-breaks
// =============================================================================

#[test]
fn equal_timestamps_fall_back_to_index() {
    let target = vec![entry("0", 0, 0, 0), entry("A", 2, 1, 5)];
    let incoming = vec![entry("0", 0, 0, 0), entry("B", 1, 0, 5)];
    let merged = merge(&target, &incoming, TieBreak::TimestampAndIndex).unwrap();
    assert_eq!(shape(&merged), vec![("0", 0, 0), ("B", 3, 2), ("A", 4, 0)]);

    // Timestamp only keeps the target first.
    let merged = merge(&target, &incoming, TieBreak::Timestamp).unwrap();
    assert_eq!(shape(&merged), vec![("0", 0, 0), ("A", 3, 2), ("B", 4, 0)]);
}

// =============================================================================
// Empty inputs and fast-forwards
// =============================================================================

#[test]
fn merging_two_empty_logs() {
    assert!(merge(&[], &[], TieBreak::default()).unwrap().is_empty());
}

#[test]
fn merging_into_an_empty_log_adopts_the_other() {
    let incoming = vec![entry("0", 0, 0, 0), entry("1", 1, 0, 1)];
    assert_eq!(merge(&[], &incoming, TieBreak::default()).unwrap(), incoming);
    assert_eq!(merge(&incoming, &[], TieBreak::default()).unwrap(), incoming);
}

#[test]
fn merging_a_prefix_keeps_indices() {
    let longer = vec![entry("0", 0, 0, 0), entry("1", 1, 0, 1), entry("2", 2, 0, 2)];
    let shorter = longer[..1].to_vec();
    assert_eq!(merge(&shorter, &longer, TieBreak::default()).unwrap(), longer);
    assert_eq!(merge(&longer, &shorter, TieBreak::default()).unwrap(), longer);
}

// =============================================================================
// Duplicates
// =============================================================================

#[test]
fn shared_operation_at_different_positions_appears_once() {
    let target = vec![entry("0", 0, 0, 0), entry("X", 1, 0, 1), entry("A", 2, 0, 2)];
    let incoming = vec![entry("0", 0, 0, 0), entry("B", 1, 0, 3), entry("X", 4, 2, 1)];
    let merged = merge(&target, &incoming, TieBreak::default()).unwrap();
    let ids: Vec<&str> = merged.iter().map(|op| op.id.as_str()).collect();
    assert_eq!(ids, vec!["0", "X", "A", "B"]);

    let common = 1;
    let incoming_collected = garbage_collect(&incoming);
    assert_eq!(merged.len(), target.len() + incoming_collected.len() - common - 1);
}

#[test]
fn merged_length_is_union_of_ids() {
    let target = vec![entry("0", 0, 0, 0), entry("1", 1, 0, 1), entry("A", 2, 0, 2), entry("C", 3, 0, 4)];
    let incoming = vec![entry("0", 0, 0, 0), entry("1", 1, 0, 1), entry("B", 2, 0, 3), entry("C", 3, 0, 4)];
    let merged = merge(&target, &incoming, TieBreak::default()).unwrap();
    // |A| + |B| - |shared ids|
    assert_eq!(merged.len(), 4 + 4 - 3);
}

// =============================================================================
// Integrity
// =============================================================================

#[test]
fn merge_rejects_logs_with_holes() {
    let target = vec![entry("0", 0, 0, 0), entry("A", 3, 0, 1)];
    let incoming = vec![entry("0", 0, 0, 0)];
    match merge(&target, &incoming, TieBreak::default()) {
        Err(Error::Integrity(violations)) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].index, 3);
            assert_eq!(violations[0].issue, IntegrityIssue::MissingOperations { expected: 1, found: 3 });
        }
        other => panic!("expected an integrity error, got {other:?}"),
    }
}
