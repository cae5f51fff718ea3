use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::cluster::client::{ClusterError, ClusterInventory, ClusterTransfer};
use crate::cluster::types::{
    CopyHandle, CopyStatus, DeleteOutcome, PartitionRecord, PartitionStatus,
};

#[derive(Debug, Clone)]
pub struct FakePartition {
    pub status: PartitionStatus,
    pub size_bytes: u64,
    pub doc_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: u32,
    pub size: u32,
    pub count: u32,
    pub submit: u32,
    pub poll: u32,
    pub delete: u32,
}

#[derive(Debug)]
struct PendingCopy {
    target: String,
    source_docs: u64,
    source_bytes: u64,
    polls_left: u32,
    report_failed: bool,
    short_docs: u64,
    applied: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    partitions: BTreeMap<String, FakePartition>,
    copies: HashMap<String, PendingCopy>,
    next_task: u64,
    fail_list_calls: u32,
    fail_count_calls: u32,
    fail_submit_calls: u32,
    fail_delete_calls: u32,
    vanish_on_failed_delete: bool,
    failed_copies: u32,
    short_copy_docs: u64,
    pending_polls: u32,
    calls: CallCounts,
}

/// In-memory stand-in for the remote store, with fault injection: transient
/// transport failures per call kind, copies that report failure, copies that
/// silently drop records (verification mismatch), copies that hang pending,
/// and deletes whose response is lost after the delete applied.
#[derive(Debug, Default)]
pub struct FakeCluster {
    state: Mutex<FakeState>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_partition(&self, name: &str, status: PartitionStatus, size_bytes: u64, doc_count: u64) {
        self.state.lock().partitions.insert(
            name.to_string(),
            FakePartition {
                status,
                size_bytes,
                doc_count,
            },
        );
    }

    pub fn frozen(&self, name: &str, size_bytes: u64, doc_count: u64) {
        self.add_partition(name, PartitionStatus::Frozen, size_bytes, doc_count);
    }

    pub fn fail_next_lists(&self, n: u32) {
        self.state.lock().fail_list_calls = n;
    }

    pub fn fail_next_counts(&self, n: u32) {
        self.state.lock().fail_count_calls = n;
    }

    pub fn fail_next_copy_submits(&self, n: u32) {
        self.state.lock().fail_submit_calls = n;
    }

    /// The next `n` submitted copies complete with a failure report.
    pub fn report_copy_failures(&self, n: u32) {
        self.state.lock().failed_copies = n;
    }

    /// The next submitted copy completes but drops `docs` records.
    pub fn short_next_copy(&self, docs: u64) {
        self.state.lock().short_copy_docs = docs;
    }

    /// Every copy stays `Pending` for this many polls before resolving.
    pub fn hold_copies_pending(&self, polls: u32) {
        self.state.lock().pending_polls = polls;
    }

    pub fn fail_next_deletes(&self, n: u32) {
        self.state.lock().fail_delete_calls = n;
    }

    /// Failed deletes still remove the partition: the delete applied on the
    /// remote side but the response was lost.
    pub fn vanish_on_failed_delete(&self) {
        self.state.lock().vanish_on_failed_delete = true;
    }

    pub fn has_partition(&self, name: &str) -> bool {
        self.state.lock().partitions.contains_key(name)
    }

    pub fn doc_count(&self, name: &str) -> Option<u64> {
        self.state.lock().partitions.get(name).map(|p| p.doc_count)
    }

    pub fn size_bytes(&self, name: &str) -> Option<u64> {
        self.state.lock().partitions.get(name).map(|p| p.size_bytes)
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls.clone()
    }

    fn matches(pattern: &str, name: &str) -> bool {
        match pattern.strip_suffix('*') {
            Some(prefix) => name.starts_with(prefix),
            None => pattern == name,
        }
    }
}

#[async_trait]
impl ClusterInventory for FakeCluster {
    async fn list_partitions(&self, pattern: &str) -> Result<Vec<PartitionRecord>, ClusterError> {
        let mut state = self.state.lock();
        state.calls.list += 1;
        if state.fail_list_calls > 0 {
            state.fail_list_calls -= 1;
            return Err(ClusterError::Transport("injected list failure".into()));
        }
        Ok(state
            .partitions
            .iter()
            .filter(|(name, _)| Self::matches(pattern, name))
            .map(|(name, p)| PartitionRecord {
                name: name.clone(),
                status: p.status,
                size_bytes: p.size_bytes,
            })
            .collect())
    }

    async fn get_size(&self, name: &str) -> Result<u64, ClusterError> {
        let mut state = self.state.lock();
        state.calls.size += 1;
        state
            .partitions
            .get(name)
            .map(|p| p.size_bytes)
            .ok_or_else(|| ClusterError::NotFound(name.to_string()))
    }

    async fn get_count(&self, name: &str) -> Result<u64, ClusterError> {
        let mut state = self.state.lock();
        state.calls.count += 1;
        if state.fail_count_calls > 0 {
            state.fail_count_calls -= 1;
            return Err(ClusterError::Transport("injected count failure".into()));
        }
        state
            .partitions
            .get(name)
            .map(|p| p.doc_count)
            .ok_or_else(|| ClusterError::NotFound(name.to_string()))
    }
}

#[async_trait]
impl ClusterTransfer for FakeCluster {
    async fn submit_copy(&self, source: &str, target: &str) -> Result<CopyHandle, ClusterError> {
        let mut state = self.state.lock();
        state.calls.submit += 1;
        if state.fail_submit_calls > 0 {
            state.fail_submit_calls -= 1;
            return Err(ClusterError::Transport("injected submit failure".into()));
        }
        let Some(src) = state.partitions.get(source).cloned() else {
            return Err(ClusterError::NotFound(source.to_string()));
        };
        // The remote copy auto-creates a missing destination
        state
            .partitions
            .entry(target.to_string())
            .or_insert(FakePartition {
                status: PartitionStatus::Open,
                size_bytes: 0,
                doc_count: 0,
            });

        let report_failed = if state.failed_copies > 0 {
            state.failed_copies -= 1;
            true
        } else {
            false
        };
        let short_docs = std::mem::take(&mut state.short_copy_docs);

        state.next_task += 1;
        let task = format!("node-1:{}", state.next_task);
        let polls_left = state.pending_polls;
        state.copies.insert(
            task.clone(),
            PendingCopy {
                target: target.to_string(),
                source_docs: src.doc_count,
                source_bytes: src.size_bytes,
                polls_left,
                report_failed,
                short_docs,
                applied: false,
            },
        );
        Ok(CopyHandle(task))
    }

    async fn poll_copy_status(&self, handle: &CopyHandle) -> Result<CopyStatus, ClusterError> {
        let mut state = self.state.lock();
        state.calls.poll += 1;
        let apply = {
            let Some(copy) = state.copies.get_mut(&handle.0) else {
                return Err(ClusterError::NotFound(handle.0.clone()));
            };
            if copy.polls_left > 0 {
                copy.polls_left -= 1;
                return Ok(CopyStatus::Pending);
            }
            if copy.report_failed {
                return Ok(CopyStatus::Failed);
            }
            if copy.applied {
                None
            } else {
                copy.applied = true;
                Some((
                    copy.target.clone(),
                    copy.source_docs.saturating_sub(copy.short_docs),
                    copy.source_bytes,
                ))
            }
        };
        if let Some((target, docs, bytes)) = apply {
            if let Some(p) = state.partitions.get_mut(&target) {
                p.doc_count += docs;
                p.size_bytes += bytes;
            }
        }
        Ok(CopyStatus::Complete)
    }

    async fn delete_partition(&self, name: &str) -> Result<DeleteOutcome, ClusterError> {
        let mut state = self.state.lock();
        state.calls.delete += 1;
        if state.fail_delete_calls > 0 {
            state.fail_delete_calls -= 1;
            if state.vanish_on_failed_delete {
                state.partitions.remove(name);
            }
            return Err(ClusterError::Transport("injected delete failure".into()));
        }
        match state.partitions.remove(name) {
            Some(_) => Ok(DeleteOutcome::Deleted),
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}
