use std::collections::HashMap;

use crate::consolidate::operation::MergeOperation;

/// In-memory ledger of merge operations for one consolidation run. The
/// planner consults it so sources already `SourceDeleted` or `Abandoned` are
/// never re-issued; the executor's results are recorded through it. Pure
/// bookkeeping, no external side effects.
#[derive(Debug, Default)]
pub struct OperationTracker {
    ops: Vec<MergeOperation>,
    by_source: HashMap<String, usize>,
}

impl OperationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an operation, replacing any earlier record for the same
    /// source. Insertion order is preserved for reporting.
    pub fn record(&mut self, op: MergeOperation) {
        match self.by_source.get(&op.source) {
            Some(&idx) => self.ops[idx] = op,
            None => {
                self.by_source.insert(op.source.clone(), self.ops.len());
                self.ops.push(op);
            }
        }
    }

    pub fn get(&self, source: &str) -> Option<&MergeOperation> {
        self.by_source.get(source).map(|&idx| &self.ops[idx])
    }

    pub fn is_terminal(&self, source: &str) -> bool {
        self.get(source).is_some_and(MergeOperation::is_terminal)
    }

    pub fn operations(&self) -> &[MergeOperation] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
