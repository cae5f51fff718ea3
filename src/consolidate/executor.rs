use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::cluster::client::{ClusterError, ClusterInventory, ClusterTransfer};
use crate::cluster::types::{CopyStatus, DeleteOutcome};
use crate::consolidate::operation::{MergeOperation, MergeState};
use crate::consolidate::retry::backoff_delay;
use crate::shared::config::model::ConsolidationConfig;

const LOG_TARGET: &str = "consolidate::executor";

/// Carries out one planned merge: copy the source into the target, verify
/// the target's record count grew accordingly, and only then delete the
/// source. Every remote step is retried with bounded exponential backoff;
/// retry exhaustion abandons the operation with the source left in place.
pub struct MergeExecutor<'a, C>
where
    C: ClusterInventory + ClusterTransfer,
{
    cluster: &'a C,
    max_attempts: u32,
    poll_interval: Duration,
    copy_timeout: Duration,
    backoff_base: Duration,
    count_tolerance: u64,
}

impl<'a, C> MergeExecutor<'a, C>
where
    C: ClusterInventory + ClusterTransfer,
{
    pub fn new(cluster: &'a C, cfg: &ConsolidationConfig) -> Self {
        Self {
            cluster,
            max_attempts: cfg.max_attempts_per_step.max(1),
            poll_interval: Duration::from_millis(cfg.poll_interval_ms),
            copy_timeout: Duration::from_millis(cfg.copy_timeout_ms),
            backoff_base: Duration::from_millis(cfg.backoff_base_ms),
            count_tolerance: cfg.count_tolerance,
        }
    }

    /// Runs the operation to a terminal state. Re-running an operation that
    /// is already terminal is a no-op.
    pub async fn execute(&self, mut op: MergeOperation) -> MergeOperation {
        if op.is_terminal() {
            debug!(target: LOG_TARGET, source = %op.source, state = ?op.state, "operation already terminal, nothing to do");
            return op;
        }

        let source = op.source.clone();
        let target = op.target.clone();
        let mut attempts = op.attempt;

        // Step 1: pre-copy counts anchor the verification step
        let source_count = match self
            .with_retry("source count", &mut attempts, || {
                self.cluster.get_count(&source)
            })
            .await
        {
            Ok(n) => n,
            Err(e) => {
                op.attempt = attempts;
                op.abandon(format!("source count unavailable: {e}"));
                return op;
            }
        };
        let target_before = match self
            .with_retry("target count", &mut attempts, || {
                self.cluster.get_count(&target)
            })
            .await
        {
            Ok(n) => n,
            Err(e) => {
                op.attempt = attempts;
                op.abandon(format!("target count unavailable: {e}"));
                return op;
            }
        };

        // Step 2: copy, polled to completion with a per-attempt wait bound
        op.advance(MergeState::Copying);
        if let Err(e) = self
            .with_retry("copy", &mut attempts, || {
                self.copy_attempt(&source, &target)
            })
            .await
        {
            op.attempt = attempts;
            warn!(target: LOG_TARGET, source = %source, target_name = %target, error = %e, "copy did not complete; source retained");
            op.abandon(format!("copy failed: {e}"));
            return op;
        }
        op.advance(MergeState::Verifying);

        // Step 3: verify before anything destructive happens
        let expected = target_before.saturating_add(source_count);
        let actual = match self
            .with_retry("verify count", &mut attempts, || {
                self.cluster.get_count(&target)
            })
            .await
        {
            Ok(n) => n,
            Err(e) => {
                op.attempt = attempts;
                op.advance(MergeState::Failed);
                op.abandon(format!("verification read failed: {e}"));
                return op;
            }
        };
        if actual.saturating_add(self.count_tolerance) < expected {
            // A mismatch is terminal for this operation; blindly re-copying
            // could merge partial or corrupt data.
            warn!(
                target: LOG_TARGET,
                source = %source,
                target_name = %target,
                expected,
                actual,
                "record count mismatch after copy; source retained"
            );
            op.attempt = attempts;
            op.advance(MergeState::Failed);
            op.abandon(format!(
                "verification mismatch: expected {expected} records, found {actual}"
            ));
            return op;
        }
        debug!(target: LOG_TARGET, source = %source, target_name = %target, expected, actual, "copy verified");

        // Step 4: delete the source, now that its records are safe
        match self
            .with_retry("delete source", &mut attempts, || {
                self.cluster.delete_partition(&source)
            })
            .await
        {
            Ok(outcome) => {
                if outcome == DeleteOutcome::NotFound {
                    debug!(target: LOG_TARGET, source = %source, "source already gone; delete treated as success");
                }
                op.attempt = attempts;
                op.advance(MergeState::SourceDeleted);
                info!(
                    target: LOG_TARGET,
                    source = %source,
                    target_name = %target,
                    records = source_count,
                    "source folded into target"
                );
            }
            Err(e) => {
                // The copy was verified, so the data is duplicated, not lost.
                op.attempt = attempts;
                op.abandon(format!(
                    "delete failed after verified copy; source retained duplicated: {e}"
                ));
            }
        }
        op
    }

    /// One copy attempt: submit, then poll until complete or the wait bound
    /// expires. A reported failure surfaces as a transient error so the
    /// retry ladder re-submits; records are keyed by id on the remote side
    /// and verification re-checks actual counts, so re-copying after a
    /// partial copy is tolerated.
    async fn copy_attempt(&self, source: &str, target: &str) -> Result<(), ClusterError> {
        let handle = self.cluster.submit_copy(source, target).await?;
        let deadline = Instant::now() + self.copy_timeout;
        loop {
            match self.cluster.poll_copy_status(&handle).await? {
                CopyStatus::Complete => return Ok(()),
                CopyStatus::Failed => {
                    return Err(ClusterError::Transport(format!(
                        "copy {source} -> {target} reported failure"
                    )));
                }
                CopyStatus::Pending => {}
            }
            if Instant::now() >= deadline {
                return Err(ClusterError::Timeout(format!(
                    "copy {source} -> {target} still pending after {:?}",
                    self.copy_timeout
                )));
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn with_retry<T, F, Fut>(
        &self,
        step: &str,
        attempts: &mut u32,
        mut call: F,
    ) -> Result<T, ClusterError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClusterError>>,
    {
        let mut step_attempt = 0u32;
        loop {
            *attempts += 1;
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && step_attempt + 1 < self.max_attempts => {
                    let delay = backoff_delay(step_attempt, self.backoff_base);
                    warn!(
                        target: LOG_TARGET,
                        step,
                        attempt = step_attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient cluster error, backing off"
                    );
                    sleep(delay).await;
                    step_attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
