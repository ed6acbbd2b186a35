//! Dispatch: turns a resolved flow into execution-service requests, sends
//! them through an [`ExecutionTransport`], and tracks committing runs to
//! completion.

use crate::config::NodeConfig;
use crate::error::DispatchError;
use crate::graph::PipelineGraph;
use ahash::AHashSet;
use std::sync::Arc;
use tracing::debug;

mod payload;
mod tracker;
mod transport;

pub use payload::{
    BranchPayload, CleanSection, ExecutionRequest, ExtractionPayload, FilteredPayload,
    JoinConditionPair, PreviewRequest, RunEnd, RunRequest, StageSections, StarJoinPayload,
    TwoTableJoinPayload, UnionPayload,
};
pub use tracker::{RunProgress, RunStatus, RunSummary, RunTracker};
pub use transport::{
    ExecutionTransport, InferredType, MetadataRequest, PreviewResponse, PreviewRow, RunStarted,
};

/// Builds and sends execution requests for graph nodes. Previews dispatch
/// from any resolvable node; committing runs dispatch from sinks only.
pub struct Dispatcher<T: ExecutionTransport> {
    transport: Arc<T>,
}

impl<T: ExecutionTransport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn with_shared(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Previews the pipeline feeding `node_id`. Returned rows are pruned to
    /// the columns the pipeline actually selects or produces; when the
    /// upstream filter selects no columns the rows pass through untouched.
    pub async fn preview(
        &self,
        graph: &PipelineGraph,
        node_id: &str,
        limit: Option<u32>,
        infer_types: bool,
    ) -> Result<PreviewResponse, DispatchError> {
        let request = ExecutionRequest::for_node(graph, node_id)?;
        let keep = selected_columns(&request);
        debug!(node_id, limit, "dispatching preview");

        let mut response = self
            .transport
            .preview(PreviewRequest {
                request,
                infer_types: infer_types.then_some(true),
                limit,
            })
            .await?;

        if let Some(keep) = keep {
            for row in &mut response.rows {
                row.retain(|column, _| keep.contains(column));
            }
        }
        Ok(response)
    }

    /// Starts a committing run from a sink node. Anything else is rejected
    /// before the transport is touched.
    pub async fn run(
        &self,
        graph: &PipelineGraph,
        sink_id: &str,
    ) -> Result<RunStarted, DispatchError> {
        let node = graph
            .node(sink_id)
            .ok_or_else(|| crate::error::ResolveError::NodeNotFound(sink_id.to_string()))?;
        let sink = match &node.config {
            NodeConfig::Sink(config) => config,
            _ => return Err(DispatchError::NotASink(sink_id.to_string())),
        };
        if sink.target.table.is_empty() {
            return Err(DispatchError::SinkMissingTarget(sink_id.to_string()));
        }

        let request = ExecutionRequest::for_node(graph, sink_id)?;
        debug!(sink_id, target = sink.target.table.as_str(), "dispatching run");
        self.transport
            .run(RunRequest {
                request,
                end: RunEnd {
                    target: sink.target.clone(),
                    mode: sink.mode,
                },
            })
            .await
    }

    /// Subscribes to a started run and drains its progress stream, returning
    /// the final summary.
    pub async fn track_run(&self, run_id: &str) -> Result<RunSummary, DispatchError> {
        let updates = self.transport.subscribe(run_id).await?;
        Ok(RunTracker::new(run_id).track(updates).await)
    }
}

/// The columns a preview response should be narrowed to: the extraction's
/// selected columns plus every result column the stages produce. `None`
/// means the extraction selects everything, so nothing is pruned.
fn selected_columns(request: &ExecutionRequest) -> Option<AHashSet<String>> {
    let mut keep: AHashSet<String> = match &request.payload {
        ExtractionPayload::Filtered(payload) => {
            if payload.filter.columns.is_empty() {
                return None;
            }
            payload.filter.columns.iter().cloned().collect()
        }
        ExtractionPayload::TwoTableJoin(payload) => {
            let selected: AHashSet<String> = match &payload.filter {
                Some(filter) if !filter.columns.is_empty() => {
                    filter.columns.iter().cloned().collect()
                }
                _ => payload
                    .left_columns
                    .iter()
                    .chain(&payload.right_columns)
                    .cloned()
                    .collect(),
            };
            if selected.is_empty() {
                return None;
            }
            selected
        }
        ExtractionPayload::StarJoin(payload) => {
            let selected: AHashSet<String> = match &payload.filter {
                Some(filter) if !filter.columns.is_empty() => {
                    filter.columns.iter().cloned().collect()
                }
                _ => payload
                    .columns
                    .iter()
                    .chain(payload.joins.iter().flat_map(|link| &link.columns))
                    .cloned()
                    .collect(),
            };
            if selected.is_empty() {
                return None;
            }
            selected
        }
        // Both branches share one shape; the left branch defines it.
        ExtractionPayload::Union(payload) => {
            if payload.left.filter.columns.is_empty() {
                return None;
            }
            payload.left.filter.columns.iter().cloned().collect()
        }
    };

    let stages = &request.stages;
    if let Some(arithmetic) = &stages.arithmetic {
        keep.extend(arithmetic.operations.iter().map(|op| op.result_column.clone()));
    }
    if let Some(condition) = &stages.condition {
        match &condition.result_column {
            Some(shared) => {
                keep.insert(shared.clone());
            }
            None => keep.extend(condition.rules.iter().map(|rule| rule.result_column.clone())),
        }
    }
    if let Some(counts) = &stages.count {
        keep.extend(counts.iter().map(|count| count.result_column.clone()));
    }
    Some(keep)
}
