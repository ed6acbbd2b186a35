//! The upstream flow resolver: walks the graph backward from a target
//! node, identifies its terminal source (source, join or union) and
//! compiles every transformation stage along the path into one ordered,
//! dispatchable flow description.

use crate::config::{
    ArithmeticOperation, CastRule, CleanConfig, ColumnTransform, ConditionRule, CountConfig,
    DedupeSpec, FilterConfig, FilterSpec, JoinConfig, JoinType, NodeConfig,
};
use crate::error::ResolveError;
use crate::graph::{Node, NodeKind, PipelineGraph};
use ahash::AHashSet;
use serde::Serialize;
use tracing::debug;

mod columns;
mod describe;

pub use columns::{ColumnInfo, available_columns};

/// One ordered transformation stage, for consumers that need the full
/// stage sequence rather than the merged accumulators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum PipelineStage {
    Clean(CleanConfig),
    Cast(crate::config::CastConfig),
    Arithmetic(crate::config::ArithmeticConfig),
    Condition(crate::config::ConditionConfig),
}

/// The terminal source a backward walk bottomed out at.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowSource {
    /// A plain source reached through a filter.
    Table {
        connection_id: String,
        filter: FilterSpec,
    },
    /// A star-schema join, optionally post-filtered.
    Join {
        join: JoinDescriptor,
        filter: Option<FilterSpec>,
    },
    /// A union of exactly two source+filter branches.
    Union {
        left: UnionBranch,
        right: UnionBranch,
        union_all: bool,
    },
}

/// A validated join descriptor: the primary table plus every secondary
/// link, each guaranteed to carry its column pairing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinDescriptor {
    pub connection_id: String,
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
    pub joins: Vec<JoinLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinLink {
    pub connection_id: String,
    pub table: String,
    pub join_type: JoinType,
    pub primary_column: String,
    pub secondary_column: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// One resolved branch of a union.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionBranch {
    pub connection_id: String,
    pub filter: FilterSpec,
}

/// The complete resolution of a node's upstream flow: where the data comes
/// from, and every transformation between the source and the node, both as
/// merged accumulators (path order preserved) and as the generic ordered
/// stage pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFlow {
    pub source: FlowSource,
    /// Condition rules, closest-to-source first.
    pub rules: Vec<ConditionRule>,
    /// Arithmetic operations, closest-to-source first.
    pub operations: Vec<ArithmeticOperation>,
    /// Cast conversions, closest-to-source first.
    pub conversions: Vec<CastRule>,
    /// Expanded clean transforms, closest-to-source first.
    pub transforms: Vec<ColumnTransform>,
    /// Only the dedupe spec of the clean node closest to the target;
    /// earlier specs are discarded, not merged.
    pub dedupe: Option<DedupeSpec>,
    /// Count stages, closest-to-source first.
    pub counts: Vec<CountConfig>,
    /// Every clean/cast/arithmetic/condition stage in path order.
    pub pipeline: Vec<PipelineStage>,
}

/// Resolves the flow feeding `target`. The target's own configuration is
/// not part of the result; the dispatcher merges it separately.
pub fn resolve(graph: &PipelineGraph, target: &str) -> Result<ResolvedFlow, ResolveError> {
    let target_node = graph
        .node(target)
        .ok_or_else(|| ResolveError::NodeNotFound(target.to_string()))?;

    let mut visited: AHashSet<&str> = AHashSet::new();
    let mut path: Vec<&Node> = Vec::new();
    let mut filter_node: Option<&Node> = None;
    if target_node.kind == NodeKind::Filter {
        filter_node = Some(target_node);
    }

    let mut current = target_node;
    while !current.kind.is_terminal_source() {
        if !visited.insert(&current.id) {
            // A cycle upstream; report it as a missing source rather
            // than walking forever.
            return Err(ResolveError::Disconnected(target.to_string()));
        }
        let edge = graph
            .inbound(&current.id)
            .next()
            .ok_or_else(|| ResolveError::Disconnected(current.id.clone()))?;
        current = graph
            .node(&edge.from)
            .ok_or_else(|| ResolveError::NodeNotFound(edge.from.clone()))?;
        match current.kind {
            NodeKind::Filter => filter_node = Some(current),
            kind if kind.is_stage() => path.push(current),
            _ => {}
        }
    }

    // The walk collected stages target-side first.
    path.reverse();
    debug!(
        node = target,
        terminal = %current.kind,
        stages = path.len(),
        "upstream flow resolved"
    );

    let source = match current.kind {
        NodeKind::Source => {
            let connection_id = source_connection(current)?;
            let filter = filter_node.ok_or_else(|| ResolveError::MissingFilter(current.id.clone()))?;
            FlowSource::Table {
                connection_id,
                filter: filter_spec(filter)?,
            }
        }
        NodeKind::Join => FlowSource::Join {
            join: join_descriptor(current)?,
            filter: filter_node.map(filter_spec).transpose()?,
        },
        NodeKind::Union => resolve_union(graph, current)?,
        _ => unreachable!("walk only stops at terminal sources"),
    };

    let mut flow = ResolvedFlow {
        source,
        rules: Vec::new(),
        operations: Vec::new(),
        conversions: Vec::new(),
        transforms: Vec::new(),
        dedupe: None,
        counts: Vec::new(),
        pipeline: Vec::new(),
    };

    for node in path {
        accumulate(&mut flow, node);
    }
    Ok(flow)
}

/// Folds one intermediate node into the accumulators, preserving path
/// order. Iteration runs source-to-target, so a plain overwrite leaves the
/// last clean node's dedupe spec in place.
fn accumulate(flow: &mut ResolvedFlow, node: &Node) {
    match &node.config {
        NodeConfig::Condition(config) => {
            flow.rules.extend(config.rules.iter().cloned());
            flow.pipeline.push(PipelineStage::Condition(config.clone()));
        }
        NodeConfig::Arithmetic(config) => {
            flow.operations.extend(config.operations.iter().cloned());
            flow.pipeline.push(PipelineStage::Arithmetic(config.clone()));
        }
        NodeConfig::Cast(config) => {
            flow.conversions.extend(config.conversions.iter().cloned());
            flow.pipeline.push(PipelineStage::Cast(config.clone()));
        }
        NodeConfig::Clean(config) => {
            flow.transforms.extend(config.expand_transforms());
            if config.dedupe.is_some() {
                flow.dedupe = config.dedupe.clone();
            }
            flow.pipeline.push(PipelineStage::Clean(config.clone()));
        }
        NodeConfig::Count(config) => {
            flow.counts.push(config.clone());
        }
        // Filters and terminal sources are handled by the walk itself;
        // sinks and visualizations never appear upstream.
        NodeConfig::Source(_)
        | NodeConfig::Filter(_)
        | NodeConfig::Join(_)
        | NodeConfig::Union(_)
        | NodeConfig::Sink(_)
        | NodeConfig::Visualization(_) => {}
    }
}

fn source_connection(node: &Node) -> Result<String, ResolveError> {
    match &node.config {
        NodeConfig::Source(config) => config
            .connection_id
            .clone()
            .ok_or_else(|| ResolveError::SourceMissingConnection(node.id.clone())),
        _ => Err(ResolveError::SourceMissingConnection(node.id.clone())),
    }
}

fn filter_spec(node: &Node) -> Result<FilterSpec, ResolveError> {
    let config: &FilterConfig = match &node.config {
        NodeConfig::Filter(config) => config,
        _ => return Err(ResolveError::FilterMissingTable(node.id.clone())),
    };
    let table = config
        .table
        .clone()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ResolveError::FilterMissingTable(node.id.clone()))?;
    Ok(FilterSpec {
        table,
        columns: config.columns.clone(),
        conditions: config.conditions.clone(),
    })
}

fn join_descriptor(node: &Node) -> Result<JoinDescriptor, ResolveError> {
    let config: &JoinConfig = match &node.config {
        NodeConfig::Join(config) => config,
        _ => return Err(ResolveError::JoinMissingPrimary(node.id.clone())),
    };
    let connection_id = config
        .connection_id
        .clone()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ResolveError::JoinMissingPrimary(node.id.clone()))?;
    let table = config
        .table
        .clone()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ResolveError::JoinMissingPrimary(node.id.clone()))?;

    let mut joins = Vec::with_capacity(config.joins.len());
    for secondary in &config.joins {
        let pairing = secondary
            .primary_column
            .clone()
            .filter(|c| !c.is_empty())
            .zip(secondary.secondary_column.clone().filter(|c| !c.is_empty()));
        let (primary_column, secondary_column) =
            pairing.ok_or_else(|| ResolveError::JoinMissingPairing {
                node_id: node.id.clone(),
                table: secondary.secondary_table.clone(),
            })?;
        joins.push(JoinLink {
            connection_id: secondary
                .secondary_connection_id
                .clone()
                .unwrap_or_else(|| connection_id.clone()),
            table: secondary.secondary_table.clone(),
            join_type: secondary.join_type,
            primary_column,
            secondary_column,
            columns: secondary.secondary_columns.clone(),
        });
    }

    Ok(JoinDescriptor {
        connection_id,
        table,
        columns: config.columns.clone(),
        joins,
    })
}

/// Resolves a union's two inbound branches. Each must be a filter fed
/// directly by a source; anything else is a resolution failure reported
/// before any dispatch.
fn resolve_union(graph: &PipelineGraph, union: &Node) -> Result<FlowSource, ResolveError> {
    let union_all = match &union.config {
        NodeConfig::Union(config) => config.union_all,
        _ => false,
    };
    let inbound: Vec<_> = graph.inbound(&union.id).collect();
    if inbound.len() < 2 {
        return Err(ResolveError::UnionIncomplete {
            node_id: union.id.clone(),
            reason: format!("found {} inbound branch(es)", inbound.len()),
        });
    }

    let left = resolve_branch(graph, &inbound[0].from, &union.id)?;
    let right = resolve_branch(graph, &inbound[1].from, &union.id)?;
    Ok(FlowSource::Union {
        left,
        right,
        union_all,
    })
}

fn resolve_branch(
    graph: &PipelineGraph,
    head_id: &str,
    union_id: &str,
) -> Result<UnionBranch, ResolveError> {
    let incomplete = |reason: String| ResolveError::UnionIncomplete {
        node_id: union_id.to_string(),
        reason,
    };

    let head = graph
        .node(head_id)
        .ok_or_else(|| incomplete(format!("branch node '{head_id}' was not found")))?;
    if head.kind != NodeKind::Filter {
        return Err(incomplete(format!(
            "branch '{head_id}' is a {} node, expected a filter fed by a source",
            head.kind
        )));
    }
    let filter = filter_spec(head)
        .map_err(|_| incomplete(format!("branch filter '{head_id}' has no table selected")))?;

    let edge = graph
        .inbound(head_id)
        .next()
        .ok_or_else(|| incomplete(format!("branch filter '{head_id}' has no source connected")))?;
    let source = graph
        .node(&edge.from)
        .ok_or_else(|| incomplete(format!("branch source '{}' was not found", edge.from)))?;
    if source.kind != NodeKind::Source {
        return Err(incomplete(format!(
            "branch '{head_id}' is fed by a {} node, expected a source",
            source.kind
        )));
    }
    let connection_id = source_connection(source)
        .map_err(|_| incomplete(format!("branch source '{}' has no data source selected", source.id)))?;

    Ok(UnionBranch {
        connection_id,
        filter,
    })
}
