use crate::cluster::types::{PartitionRecord, PartitionStatus};
use crate::consolidate::operation::{MergeOperation, MergeState};
use crate::consolidate::tracker::OperationTracker;

fn op(source: &str, state: MergeState) -> MergeOperation {
    let record = PartitionRecord {
        name: source.to_string(),
        status: PartitionStatus::Frozen,
        size_bytes: 1,
    };
    let mut op = MergeOperation::planned(&record, "idx-target");
    op.state = state;
    op
}

#[test]
fn records_and_fetches_by_source() {
    let mut tracker = OperationTracker::new();
    assert!(tracker.is_empty());

    tracker.record(op("idx-b", MergeState::SourceDeleted));
    assert_eq!(tracker.len(), 1);
    assert_eq!(
        tracker.get("idx-b").map(|o| o.state),
        Some(MergeState::SourceDeleted)
    );
    assert!(tracker.get("idx-unknown").is_none());
}

#[test]
fn terminal_check_covers_deleted_and_abandoned_only() {
    let mut tracker = OperationTracker::new();
    tracker.record(op("idx-done", MergeState::SourceDeleted));
    tracker.record(op("idx-gone", MergeState::Abandoned));
    tracker.record(op("idx-mid", MergeState::Verifying));

    assert!(tracker.is_terminal("idx-done"));
    assert!(tracker.is_terminal("idx-gone"));
    assert!(!tracker.is_terminal("idx-mid"));
    assert!(!tracker.is_terminal("idx-never-seen"));
}

#[test]
fn re_recording_replaces_in_place() {
    let mut tracker = OperationTracker::new();
    tracker.record(op("idx-b", MergeState::Verifying));
    tracker.record(op("idx-c", MergeState::SourceDeleted));
    tracker.record(op("idx-b", MergeState::SourceDeleted));

    assert_eq!(tracker.len(), 2);
    assert!(tracker.is_terminal("idx-b"));

    // Insertion order is preserved for the run summary
    let sources: Vec<&str> = tracker
        .operations()
        .iter()
        .map(|o| o.source.as_str())
        .collect();
    assert_eq!(sources, vec!["idx-b", "idx-c"]);
}
