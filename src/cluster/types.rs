/// Lifecycle status of a partition as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionStatus {
    Open,
    Closed,
    Frozen,
    Other,
}

impl PartitionStatus {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_ascii_lowercase();
        if raw.contains("frozen") {
            PartitionStatus::Frozen
        } else if raw == "open" {
            PartitionStatus::Open
        } else if raw == "close" || raw == "closed" {
            PartitionStatus::Closed
        } else {
            PartitionStatus::Other
        }
    }

    /// Frozen-tier partitions surface as plain `open` in the cat API; the
    /// configured name pattern is what scopes candidates to the cold tier.
    pub fn is_read_eligible(self) -> bool {
        matches!(self, PartitionStatus::Frozen | PartitionStatus::Open)
    }
}

/// One cold-tier partition as currently observed. Sizes are best-effort and
/// only point-in-time correct; they are re-read fresh every planning cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRecord {
    /// Unique, lexically orderable name. Names are timestamp-prefixed, so
    /// lexical order is creation order.
    pub name: String,
    pub status: PartitionStatus,
    pub size_bytes: u64,
}

/// Handle for a submitted, possibly-asynchronous copy operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyHandle(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Pending,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The partition was already gone. Treated as success by callers.
    NotFound,
}
