use crate::cluster::types::PartitionRecord;

/// Lifecycle of one source-into-target fold. Transitions are forward-only;
/// `SourceDeleted` and `Abandoned` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    Planned,
    Copying,
    Verifying,
    SourceDeleted,
    Failed,
    Abandoned,
}

impl MergeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, MergeState::SourceDeleted | MergeState::Abandoned)
    }

    pub fn can_advance_to(self, next: MergeState) -> bool {
        use MergeState::*;
        matches!(
            (self, next),
            (Planned, Copying)
                | (Copying, Verifying)
                | (Verifying, SourceDeleted)
                | (Planned, Failed)
                | (Copying, Failed)
                | (Verifying, Failed)
                | (Planned, Abandoned)
                | (Copying, Abandoned)
                | (Verifying, Abandoned)
                | (Failed, Abandoned)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOperation {
    pub source: String,
    pub target: String,
    pub state: MergeState,
    /// Total remote attempts spent across all steps of this operation
    pub attempt: u32,
    /// Source size observed at plan time, for optimistic accounting
    pub source_bytes: u64,
    /// Why the operation ended, when it did not end in `SourceDeleted`
    pub reason: Option<String>,
}

impl MergeOperation {
    pub fn planned(source: &PartitionRecord, target: &str) -> Self {
        debug_assert_ne!(source.name, target, "a partition cannot merge into itself");
        Self {
            source: source.name.clone(),
            target: target.to_string(),
            state: MergeState::Planned,
            attempt: 0,
            source_bytes: source.size_bytes,
            reason: None,
        }
    }

    /// Forward-only transition. The executor is the sole caller; an invalid
    /// transition is a programming error, not a runtime condition.
    pub fn advance(&mut self, next: MergeState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid merge transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    pub fn abandon(&mut self, reason: impl Into<String>) {
        self.reason = Some(reason.into());
        self.advance(MergeState::Abandoned);
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
