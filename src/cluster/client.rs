use async_trait::async_trait;
use thiserror::Error;

use crate::cluster::types::{CopyHandle, CopyStatus, DeleteOutcome, PartitionRecord};

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("unexpected status {status} from {context}")]
    Status { status: u16, context: String },

    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unexpected payload: {0}")]
    Payload(String),

    #[error("partition not found: {0}")]
    NotFound(String),
}

impl ClusterError {
    /// Transient failures are retried with bounded backoff; everything else
    /// fails the current step immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            ClusterError::Transport(_) | ClusterError::Timeout(_) => true,
            ClusterError::Status { status, .. } => {
                *status == 429 || (502..=504).contains(status)
            }
            _ => false,
        }
    }
}

/// Read-only view of the cluster's partition inventory.
#[async_trait]
pub trait ClusterInventory: Send + Sync {
    async fn list_partitions(&self, pattern: &str) -> Result<Vec<PartitionRecord>, ClusterError>;

    /// Authoritative size re-read. Used before every stop decision; the
    /// running estimate kept by the planner is only a scheduling heuristic.
    async fn get_size(&self, name: &str) -> Result<u64, ClusterError>;

    /// Record count, used to verify a copy before the source is deleted.
    async fn get_count(&self, name: &str) -> Result<u64, ClusterError>;
}

/// The cluster's copy/delete surface. All mutation of the remote store is
/// funneled through these two calls so tests can substitute a fake store.
#[async_trait]
pub trait ClusterTransfer: Send + Sync {
    async fn submit_copy(&self, source: &str, target: &str) -> Result<CopyHandle, ClusterError>;

    async fn poll_copy_status(&self, handle: &CopyHandle) -> Result<CopyStatus, ClusterError>;

    /// Deleting an already-gone partition yields `NotFound`, not an error.
    async fn delete_partition(&self, name: &str) -> Result<DeleteOutcome, ClusterError>;
}
