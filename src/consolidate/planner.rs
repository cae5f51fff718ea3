use tracing::{debug, info};

use crate::cluster::types::PartitionRecord;
use crate::consolidate::tracker::OperationTracker;

const LOG_TARGET: &str = "consolidate::planner";

/// The accumulation sink for one consolidation run. `accumulated_bytes` is a
/// running estimate only; the control loop corrects it against an
/// authoritative size read before every stop decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationTarget {
    pub name: String,
    pub accumulated_bytes: u64,
}

impl ConsolidationTarget {
    pub fn new(record: &PartitionRecord) -> Self {
        Self {
            name: record.name.clone(),
            accumulated_bytes: record.size_bytes,
        }
    }

    /// Optimistic bump after a source was verified, folded in and deleted.
    pub fn absorb(&mut self, source_bytes: u64) {
        self.accumulated_bytes = self.accumulated_bytes.saturating_add(source_bytes);
    }

    /// Replace the estimate with a fresh authoritative read.
    pub fn correct(&mut self, authoritative_bytes: u64) {
        self.accumulated_bytes = authoritative_bytes;
    }
}

/// Outcome of planning the next merge step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanDecision {
    Merge(PartitionRecord),
    /// The target is full, or folding the next source would overflow it
    CeilingReached,
    /// No unmerged eligible source remains
    Exhausted,
}

pub struct Planner {
    min_size_bytes: u64,
    ceiling_bytes: u64,
}

impl Planner {
    pub fn new(min_size_bytes: u64, ceiling_bytes: u64) -> Self {
        Self {
            min_size_bytes,
            ceiling_bytes,
        }
    }

    /// Picks the oldest partition strictly below the minimum-size threshold
    /// as the accumulation sink. `None` means there is nothing small enough
    /// to consolidate, which ends the run normally. Partitions already at or
    /// above the threshold are only ever merge sources, never new targets.
    pub fn choose_target(&self, eligible: &[PartitionRecord]) -> Option<ConsolidationTarget> {
        let target = eligible
            .iter()
            .find(|p| p.size_bytes < self.min_size_bytes)
            .map(ConsolidationTarget::new)?;
        info!(
            target: LOG_TARGET,
            name = %target.name,
            seed_bytes = target.accumulated_bytes,
            "chose oldest under-threshold partition as consolidation target"
        );
        Some(target)
    }

    /// Picks the newest unmerged eligible source for the target. Newest-first
    /// drains the partitions least likely to still receive writes and makes
    /// the largest step toward the ceiling per merge. `eligible` must be
    /// oldest-first, fresh from the current iteration's inventory read.
    pub fn next_source(
        &self,
        target: &ConsolidationTarget,
        eligible: &[PartitionRecord],
        tracker: &OperationTracker,
    ) -> PlanDecision {
        if target.accumulated_bytes >= self.ceiling_bytes {
            return PlanDecision::CeilingReached;
        }

        let candidate = eligible
            .iter()
            .rev()
            .filter(|p| p.name != target.name)
            .find(|p| !tracker.is_terminal(&p.name));

        let Some(candidate) = candidate else {
            debug!(target: LOG_TARGET, target_name = %target.name, "no unmerged eligible sources remain");
            return PlanDecision::Exhausted;
        };

        let projected = target.accumulated_bytes.saturating_add(candidate.size_bytes);
        if projected > self.ceiling_bytes {
            debug!(
                target: LOG_TARGET,
                target_name = %target.name,
                source = %candidate.name,
                projected,
                ceiling = self.ceiling_bytes,
                "folding the newest source would overflow the ceiling"
            );
            return PlanDecision::CeilingReached;
        }

        PlanDecision::Merge(candidate.clone())
    }
}
