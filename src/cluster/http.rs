use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode, header};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::cluster::client::{ClusterError, ClusterInventory, ClusterTransfer};
use crate::cluster::types::{
    CopyHandle, CopyStatus, DeleteOutcome, PartitionRecord, PartitionStatus,
};

const LOG_TARGET: &str = "cluster::http";

/// Cluster collaborator speaking an Elasticsearch-style REST API: cat
/// inventory, `_reindex` submitted with `wait_for_completion=false` and
/// polled through the tasks API, and plain index deletes.
pub struct HttpCluster {
    endpoint: String,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpCluster {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self { endpoint, client }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Bytes), ClusterError> {
        let uri = format!("{}{}", self.endpoint, path);
        let payload = match &body {
            Some(v) => Bytes::from(serde_json::to_vec(v)?),
            None => Bytes::new(),
        };

        let mut builder = Request::builder().method(method).uri(&uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(Full::new(payload))
            .map_err(|e| ClusterError::Transport(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| ClusterError::Transport(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ClusterError::Transport(e.to_string()))?
            .to_bytes();

        debug!(target: LOG_TARGET, %uri, status = status.as_u16(), "cluster request");
        Ok((status, bytes))
    }

    async fn get_json(&self, path: &str, context: &str) -> Result<Value, ClusterError> {
        let (status, bytes) = self.send(Method::GET, path, None).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(ClusterError::NotFound(context.to_string()));
        }
        if !status.is_success() {
            return Err(ClusterError::Status {
                status: status.as_u16(),
                context: context.to_string(),
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[derive(Debug, Deserialize)]
struct CatIndexRow {
    index: String,
    status: String,
    #[serde(rename = "pri.store.size", default)]
    pri_store_size: Option<String>,
    #[serde(rename = "store.size", default)]
    store_size: Option<String>,
}

/// Rows come from `_cat/indices?format=json&bytes=b`, so sizes are plain
/// byte counts in string form. Closed indices report no size at all.
pub(crate) fn parse_cat_rows(raw: &[u8]) -> Result<Vec<PartitionRecord>, ClusterError> {
    let rows: Vec<CatIndexRow> = serde_json::from_slice(raw)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let size_bytes = row
                .pri_store_size
                .as_deref()
                .or(row.store_size.as_deref())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0);
            PartitionRecord {
                name: row.index,
                status: PartitionStatus::parse(&row.status),
                size_bytes,
            }
        })
        .collect())
}

pub(crate) fn copy_status_from_task(task: &Value) -> CopyStatus {
    if task.get("error").is_some() {
        return CopyStatus::Failed;
    }
    if !task
        .get("completed")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return CopyStatus::Pending;
    }
    let has_failures = task
        .pointer("/response/failures")
        .and_then(Value::as_array)
        .is_some_and(|f| !f.is_empty());
    if has_failures {
        CopyStatus::Failed
    } else {
        CopyStatus::Complete
    }
}

#[async_trait]
impl ClusterInventory for HttpCluster {
    async fn list_partitions(&self, pattern: &str) -> Result<Vec<PartitionRecord>, ClusterError> {
        let path = format!(
            "/_cat/indices/{pattern}?format=json&bytes=b&expand_wildcards=all&h=index,status,store.size,pri.store.size"
        );
        let (status, bytes) = self.send(Method::GET, &path, None).await?;
        if !status.is_success() {
            return Err(ClusterError::Status {
                status: status.as_u16(),
                context: format!("cat indices {pattern}"),
            });
        }
        parse_cat_rows(&bytes)
    }

    async fn get_size(&self, name: &str) -> Result<u64, ClusterError> {
        let stats = self
            .get_json(&format!("/{name}/_stats/store"), name)
            .await?;
        stats
            .pointer("/_all/total/store/size_in_bytes")
            .and_then(Value::as_u64)
            .ok_or_else(|| ClusterError::Payload(format!("no store size in stats for {name}")))
    }

    async fn get_count(&self, name: &str) -> Result<u64, ClusterError> {
        let body = self.get_json(&format!("/{name}/_count"), name).await?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| ClusterError::Payload(format!("no count in response for {name}")))
    }
}

#[async_trait]
impl ClusterTransfer for HttpCluster {
    async fn submit_copy(&self, source: &str, target: &str) -> Result<CopyHandle, ClusterError> {
        let body = json!({
            "source": { "index": source },
            "dest": { "index": target }
        });
        let (status, bytes) = self
            .send(
                Method::POST,
                "/_reindex?wait_for_completion=false",
                Some(body),
            )
            .await?;
        if !status.is_success() {
            return Err(ClusterError::Status {
                status: status.as_u16(),
                context: format!("reindex {source} -> {target}"),
            });
        }
        let response: Value = serde_json::from_slice(&bytes)?;
        let task = response
            .get("task")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClusterError::Payload(format!("no task id for reindex {source} -> {target}"))
            })?;
        Ok(CopyHandle(task.to_string()))
    }

    async fn poll_copy_status(&self, handle: &CopyHandle) -> Result<CopyStatus, ClusterError> {
        let task = self
            .get_json(&format!("/_tasks/{}", handle.0), &handle.0)
            .await?;
        Ok(copy_status_from_task(&task))
    }

    async fn delete_partition(&self, name: &str) -> Result<DeleteOutcome, ClusterError> {
        let (status, _bytes) = self.send(Method::DELETE, &format!("/{name}"), None).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(DeleteOutcome::NotFound);
        }
        if !status.is_success() {
            return Err(ClusterError::Status {
                status: status.as_u16(),
                context: format!("delete {name}"),
            });
        }
        Ok(DeleteOutcome::Deleted)
    }
}
