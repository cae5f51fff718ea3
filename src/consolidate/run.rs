use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use crate::cluster::client::{ClusterInventory, ClusterTransfer};
use crate::consolidate::candidate::CandidateSelector;
use crate::consolidate::errors::ConsolidateError;
use crate::consolidate::executor::MergeExecutor;
use crate::consolidate::operation::{MergeOperation, MergeState};
use crate::consolidate::planner::{PlanDecision, Planner};
use crate::consolidate::tracker::OperationTracker;
use crate::shared::config::model::ConsolidationConfig;

const LOG_TARGET: &str = "consolidate::run";

/// Why a run stopped. All of these are normal termination, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    NoTarget,
    NoMoreSources,
    CeilingReached,
    BudgetExhausted,
    Cancelled,
}

#[derive(Debug)]
pub struct RunSummary {
    pub target: Option<String>,
    pub operations: Vec<MergeOperation>,
    pub bytes_merged: u64,
    pub stop_reason: StopReason,
}

impl RunSummary {
    pub fn abandoned(&self) -> impl Iterator<Item = &MergeOperation> {
        self.operations
            .iter()
            .filter(|op| op.state == MergeState::Abandoned)
    }

    pub fn merged(&self) -> impl Iterator<Item = &MergeOperation> {
        self.operations
            .iter()
            .filter(|op| op.state == MergeState::SourceDeleted)
    }
}

/// One invocation of the consolidation control loop: pick a target once,
/// then fold sources into it one at a time against fresh inventory until a
/// terminal condition is hit. Merges into a given target are strictly
/// serialized; run independent targets on disjoint name patterns if
/// concurrency is wanted.
pub struct ConsolidationRun<'a, C>
where
    C: ClusterInventory + ClusterTransfer,
{
    cluster: &'a C,
    pattern: String,
    cfg: ConsolidationConfig,
    tracker: OperationTracker,
    cancel: watch::Receiver<bool>,
}

impl<'a, C> ConsolidationRun<'a, C>
where
    C: ClusterInventory + ClusterTransfer,
{
    pub fn new(
        cluster: &'a C,
        pattern: impl Into<String>,
        cfg: ConsolidationConfig,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            cluster,
            pattern: pattern.into(),
            cfg,
            tracker: OperationTracker::new(),
            cancel,
        }
    }

    pub async fn execute(mut self) -> Result<RunSummary, ConsolidateError> {
        let started = Instant::now();
        let selector = CandidateSelector::new(self.cfg.ceiling_bytes);
        let planner = Planner::new(self.cfg.min_size_bytes, self.cfg.ceiling_bytes);
        let executor = MergeExecutor::new(self.cluster, &self.cfg);

        let inventory = self
            .cluster
            .list_partitions(&self.pattern)
            .await
            .map_err(ConsolidateError::Inventory)?;
        let eligible = selector.eligible(&inventory);

        let Some(mut target) = planner.choose_target(&eligible) else {
            info!(
                target: LOG_TARGET,
                pattern = %self.pattern,
                "no partitions below the target threshold, nothing to consolidate"
            );
            return Ok(self.finish(None, StopReason::NoTarget, 0));
        };

        let mut iterations = 0u64;
        let mut bytes_merged = 0u64;
        let stop_reason = loop {
            if *self.cancel.borrow() {
                break StopReason::Cancelled;
            }
            if self.cfg.max_iterations != 0 && iterations >= self.cfg.max_iterations {
                break StopReason::BudgetExhausted;
            }
            if self.cfg.max_runtime_ms != 0
                && started.elapsed() >= Duration::from_millis(self.cfg.max_runtime_ms)
            {
                break StopReason::BudgetExhausted;
            }
            iterations += 1;

            // Sizes are only point-in-time correct: re-read the inventory
            // every cycle and the target's size authoritatively before any
            // stop decision.
            let inventory = self
                .cluster
                .list_partitions(&self.pattern)
                .await
                .map_err(ConsolidateError::Inventory)?;
            let eligible = selector.eligible(&inventory);

            let actual = self
                .cluster
                .get_size(&target.name)
                .await
                .map_err(ConsolidateError::Inventory)?;
            target.correct(actual);

            let source = match planner.next_source(&target, &eligible, &self.tracker) {
                PlanDecision::Merge(source) => source,
                PlanDecision::CeilingReached => break StopReason::CeilingReached,
                PlanDecision::Exhausted => break StopReason::NoMoreSources,
            };

            info!(
                target: LOG_TARGET,
                source = %source.name,
                target_name = %target.name,
                source_bytes = source.size_bytes,
                accumulated = target.accumulated_bytes,
                "merging source into target"
            );
            let op = executor.execute(MergeOperation::planned(&source, &target.name)).await;
            if op.state == MergeState::SourceDeleted {
                target.absorb(op.source_bytes);
                bytes_merged += op.source_bytes;
            } else {
                // Per-operation failures are isolated; the planner simply
                // moves on to the next candidate.
                warn!(
                    target: LOG_TARGET,
                    source = %op.source,
                    state = ?op.state,
                    reason = op.reason.as_deref().unwrap_or(""),
                    "merge did not complete"
                );
            }
            self.tracker.record(op);

            // Let the cluster's size/count reporting settle before the next
            // round of decisions.
            if self.cfg.iteration_delay_ms > 0 {
                sleep(Duration::from_millis(self.cfg.iteration_delay_ms)).await;
            }
        };

        info!(
            target: LOG_TARGET,
            target_name = %target.name,
            ?stop_reason,
            bytes_merged,
            operations = self.tracker.len(),
            "consolidation run finished"
        );
        Ok(self.finish(Some(target.name.clone()), stop_reason, bytes_merged))
    }

    fn finish(self, target: Option<String>, stop_reason: StopReason, bytes_merged: u64) -> RunSummary {
        RunSummary {
            target,
            operations: self.tracker.operations().to_vec(),
            bytes_merged,
            stop_reason,
        }
    }
}

/// Drives successive consolidation runs, each seeding a new target from the
/// then-oldest under-threshold partition, until no target remains, a run
/// makes no progress, the budget expires, or cancellation is requested.
pub async fn consolidate_all<C>(
    cluster: &C,
    pattern: &str,
    cfg: &ConsolidationConfig,
    cancel: watch::Receiver<bool>,
) -> Result<Vec<RunSummary>, ConsolidateError>
where
    C: ClusterInventory + ClusterTransfer,
{
    let mut summaries = Vec::new();
    loop {
        if *cancel.borrow() {
            break;
        }
        let run = ConsolidationRun::new(cluster, pattern, cfg.clone(), cancel.clone());
        let summary = run.execute().await?;
        let stop_reason = summary.stop_reason;
        let made_progress = summary.bytes_merged > 0;
        summaries.push(summary);

        match stop_reason {
            StopReason::NoTarget | StopReason::Cancelled | StopReason::BudgetExhausted => break,
            // A full or drained target only warrants another run if this one
            // actually moved data; otherwise the next run would replay the
            // same decision and spin.
            StopReason::CeilingReached | StopReason::NoMoreSources if !made_progress => break,
            _ => {}
        }
    }
    Ok(summaries)
}
