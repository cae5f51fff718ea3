use thiserror::Error;

use crate::cluster::client::ClusterError;

#[derive(Debug, Error)]
pub enum ConsolidateError {
    /// The inventory source is unreachable. This aborts the whole run; the
    /// loop cannot make safe decisions against stale inventory.
    #[error("inventory read failed: {0}")]
    Inventory(ClusterError),

    #[error("cluster error: {0}")]
    Cluster(#[from] ClusterError),
}
