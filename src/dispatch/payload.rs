use crate::config::{
    ArithmeticConfig, CastConfig, ColumnTransform, ConditionConfig, CountConfig, DedupeSpec,
    FilterSpec, JoinType, NodeConfig, SinkTarget, WriteMode,
};
use crate::graph::PipelineGraph;
use crate::resolver::{FlowSource, JoinLink, ResolvedFlow, UnionBranch};
use serde::Serialize;

/// The extraction half of an execution request. One of four shapes,
/// selected by the resolved terminal source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionPayload {
    Filtered(FilteredPayload),
    /// Flattened shorthand used when the join has exactly one secondary.
    TwoTableJoin(TwoTableJoinPayload),
    /// The full star-schema shape for joins with more than one secondary.
    StarJoin(StarJoinPayload),
    Union(UnionPayload),
}

impl ExtractionPayload {
    pub fn from_source(source: FlowSource) -> Self {
        match source {
            FlowSource::Table {
                connection_id,
                filter,
            } => Self::Filtered(FilteredPayload {
                connection_id,
                filter,
            }),
            FlowSource::Join { join, filter } if join.joins.len() == 1 => {
                let mut joins = join.joins;
                let link = joins.remove(0);
                Self::TwoTableJoin(TwoTableJoinPayload {
                    connection_id: join.connection_id,
                    left_table: join.table,
                    right_table: link.table,
                    join_type: link.join_type,
                    join_conditions: vec![JoinConditionPair {
                        left_column: link.primary_column,
                        right_column: link.secondary_column,
                    }],
                    left_columns: join.columns,
                    right_columns: link.columns,
                    filter,
                })
            }
            FlowSource::Join { join, filter } => Self::StarJoin(StarJoinPayload {
                primary_connection_id: join.connection_id,
                primary_table: join.table,
                columns: join.columns,
                joins: join.joins,
                filter,
            }),
            FlowSource::Union {
                left,
                right,
                union_all,
            } => Self::Union(UnionPayload {
                left: BranchPayload::from(left),
                right: BranchPayload::from(right),
                union_all,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredPayload {
    pub connection_id: String,
    pub filter: FilterSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoTableJoinPayload {
    pub connection_id: String,
    pub left_table: String,
    pub right_table: String,
    pub join_type: JoinType,
    pub join_conditions: Vec<JoinConditionPair>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub left_columns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub right_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinConditionPair {
    pub left_column: String,
    pub right_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarJoinPayload {
    pub primary_connection_id: String,
    pub primary_table: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    pub joins: Vec<JoinLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionPayload {
    pub left: BranchPayload,
    pub right: BranchPayload,
    pub union_all: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPayload {
    pub connection_id: String,
    pub filter: FilterSpec,
}

impl From<UnionBranch> for BranchPayload {
    fn from(branch: UnionBranch) -> Self {
        Self {
            connection_id: branch.connection_id,
            filter: branch.filter,
        }
    }
}

/// The transformation half of an execution request: the accumulated
/// stages of the resolved flow plus the requesting node's own
/// configuration, merged in path order (the requesting node last).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSections {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean: Option<CleanSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<CastConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arithmetic: Option<ArithmeticConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<Vec<CountConfig>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanSection {
    pub transforms: Vec<ColumnTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedupe: Option<DedupeSpec>,
}

impl StageSections {
    pub fn from_flow(flow: &ResolvedFlow, own: Option<&NodeConfig>) -> Self {
        let mut transforms = flow.transforms.clone();
        let mut dedupe = flow.dedupe.clone();
        let mut conversions = flow.conversions.clone();
        let mut operations = flow.operations.clone();
        let mut rules = flow.rules.clone();
        let mut counts = flow.counts.clone();
        let mut result_column = None;
        let mut default_result_value = None;

        match own {
            Some(NodeConfig::Clean(config)) => {
                transforms.extend(config.expand_transforms());
                if config.dedupe.is_some() {
                    dedupe = config.dedupe.clone();
                }
            }
            Some(NodeConfig::Cast(config)) => {
                conversions.extend(config.conversions.iter().cloned());
            }
            Some(NodeConfig::Arithmetic(config)) => {
                operations.extend(config.operations.iter().cloned());
            }
            Some(NodeConfig::Condition(config)) => {
                rules.extend(config.rules.iter().cloned());
                result_column = config.result_column.clone();
                default_result_value = config.default_result_value.clone();
            }
            Some(NodeConfig::Count(config)) => {
                counts.push(config.clone());
            }
            _ => {}
        }

        Self {
            clean: (!transforms.is_empty() || dedupe.is_some()).then(|| CleanSection {
                transforms,
                dedupe,
            }),
            cast: (!conversions.is_empty()).then(|| CastConfig { conversions }),
            arithmetic: (!operations.is_empty()).then(|| ArithmeticConfig { operations }),
            condition: (!rules.is_empty()).then(|| ConditionConfig {
                rules,
                result_column,
                default_result_value,
            }),
            count: (!counts.is_empty()).then_some(counts),
        }
    }
}

/// A complete execution request: extraction plus transformation stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRequest {
    #[serde(flatten)]
    pub payload: ExtractionPayload,
    #[serde(flatten)]
    pub stages: StageSections,
}

impl ExecutionRequest {
    /// Builds the request for a node: its resolved upstream flow with the
    /// node's own configuration merged in as the final stage.
    pub fn for_node(
        graph: &PipelineGraph,
        node_id: &str,
    ) -> Result<Self, crate::error::ResolveError> {
        let flow = crate::resolver::resolve(graph, node_id)?;
        let own = graph.node(node_id).map(|node| &node.config);
        let stages = StageSections::from_flow(&flow, own);
        Ok(Self {
            payload: ExtractionPayload::from_source(flow.source),
            stages,
        })
    }
}

/// A read-only preview request: returns a bounded row sample without
/// committing anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    #[serde(flatten)]
    pub request: ExecutionRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infer_types: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// A committing run request: writes the pipeline output to the sink's
/// target table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(flatten)]
    pub request: ExecutionRequest,
    pub end: RunEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEnd {
    pub target: SinkTarget,
    pub mode: WriteMode,
}
