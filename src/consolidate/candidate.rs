use crate::cluster::types::PartitionRecord;

/// Filters the raw inventory down to partitions that may take part in a
/// consolidation run at all: read-eligible and strictly below the ceiling.
pub struct CandidateSelector {
    ceiling_bytes: u64,
}

impl CandidateSelector {
    pub fn new(ceiling_bytes: u64) -> Self {
        Self { ceiling_bytes }
    }

    /// Eligible candidates, oldest first by lexical name order. An empty
    /// result is a normal terminal condition, never an error.
    pub fn eligible(&self, inventory: &[PartitionRecord]) -> Vec<PartitionRecord> {
        self.eligible_by(inventory, |p| p.name.clone())
    }

    /// Same filter with a caller-supplied age key, oldest first.
    pub fn eligible_by<K: Ord>(
        &self,
        inventory: &[PartitionRecord],
        age_key: impl Fn(&PartitionRecord) -> K,
    ) -> Vec<PartitionRecord> {
        let mut candidates: Vec<PartitionRecord> = inventory
            .iter()
            .filter(|p| p.status.is_read_eligible() && p.size_bytes < self.ceiling_bytes)
            .cloned()
            .collect();
        candidates.sort_by_key(|p| age_key(p));
        candidates
    }
}
