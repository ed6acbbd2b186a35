use super::payload::{PreviewRequest, RunRequest};
use super::tracker::RunProgress;
use crate::error::DispatchError;
use crate::metadata::SourceMetadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// The boundary to the execution service. Implementations carry the actual
/// wire protocol; everything above them works with typed requests and
/// responses only, so tests can substitute an in-process fake.
#[async_trait]
pub trait ExecutionTransport: Send + Sync {
    /// Fetches schema metadata for a connection. When `table_name` is set
    /// the response may be scoped to that table's columns.
    async fn metadata(&self, request: MetadataRequest) -> Result<SourceMetadata, DispatchError>;

    /// Executes a pipeline in preview mode: a bounded row sample, nothing
    /// committed.
    async fn preview(&self, request: PreviewRequest) -> Result<PreviewResponse, DispatchError>;

    /// Starts a committing run and returns its identifier.
    async fn run(&self, request: RunRequest) -> Result<RunStarted, DispatchError>;

    /// Opens a progress stream for a started run. The stream ends when the
    /// sender side is dropped; consumers stop at the first terminal status.
    async fn subscribe(
        &self,
        run_id: &str,
    ) -> Result<mpsc::Receiver<RunProgress>, DispatchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRequest {
    pub connection_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
}

/// One preview row: column name to JSON value.
pub type PreviewRow = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    #[serde(default)]
    pub rows: Vec<PreviewRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inferred_types: Option<Vec<InferredType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation_steps: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferredType {
    pub column: String,
    pub inferred_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStarted {
    pub run_id: String,
}
