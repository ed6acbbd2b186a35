//! Per-node-kind typed configuration payloads. Each node owns exactly the
//! variant matching its kind; the editor mutates these independently of the
//! graph structure.

use crate::graph::NodeKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod cast;
pub mod clean;
pub mod compute;
pub mod filter;
pub mod join;

pub use cast::{CastConfig, CastRule, TargetType, reformat_date, token_pattern_to_chrono};
pub use clean::{
    CleanConfig, ColumnTransform, DataFix, DedupeKeep, DedupeSpec, NullAction, NullCleanup,
    TransformOp,
};
pub use compute::{
    ArithmeticConfig, ArithmeticOperation, ArithmeticOperator, Comparator, ConditionConfig,
    ConditionRule, CountConfig, Operand, OutputType,
};
pub use filter::{FilterCondition, FilterConfig, FilterOperator, FilterSpec};
pub use join::{JoinConfig, JoinType, SecondaryJoin};

/// The tagged union of node configurations. Only the variant matching the
/// node's kind is ever populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "config", rename_all = "lowercase")]
pub enum NodeConfig {
    Source(SourceConfig),
    Filter(FilterConfig),
    Cast(CastConfig),
    Clean(CleanConfig),
    Count(CountConfig),
    Arithmetic(ArithmeticConfig),
    Condition(ConditionConfig),
    Join(JoinConfig),
    Union(UnionConfig),
    Sink(SinkConfig),
    Visualization(VisualizationConfig),
}

impl NodeConfig {
    /// The node kind this configuration belongs to.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Source(_) => NodeKind::Source,
            Self::Filter(_) => NodeKind::Filter,
            Self::Cast(_) => NodeKind::Cast,
            Self::Clean(_) => NodeKind::Clean,
            Self::Count(_) => NodeKind::Count,
            Self::Arithmetic(_) => NodeKind::Arithmetic,
            Self::Condition(_) => NodeKind::Condition,
            Self::Join(_) => NodeKind::Join,
            Self::Union(_) => NodeKind::Union,
            Self::Sink(_) => NodeKind::Sink,
            Self::Visualization(_) => NodeKind::Visualization,
        }
    }

    /// The empty configuration a freshly dropped node of `kind` starts with.
    pub fn default_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Source => Self::Source(SourceConfig::default()),
            NodeKind::Filter => Self::Filter(FilterConfig::default()),
            NodeKind::Cast => Self::Cast(CastConfig::default()),
            NodeKind::Clean => Self::Clean(CleanConfig::default()),
            NodeKind::Count => Self::Count(CountConfig::default()),
            NodeKind::Arithmetic => Self::Arithmetic(ArithmeticConfig::default()),
            NodeKind::Condition => Self::Condition(ConditionConfig::default()),
            NodeKind::Join => Self::Join(JoinConfig::default()),
            NodeKind::Union => Self::Union(UnionConfig::default()),
            NodeKind::Sink => Self::Sink(SinkConfig::default()),
            NodeKind::Visualization => Self::Visualization(VisualizationConfig::default()),
        }
    }
}

/// Configuration of a source node: an opaque handle to an external data
/// source. The source's metadata lives in the shared metadata cache under
/// this id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub connection_id: Option<String>,
}

/// Configuration of a union node, combining exactly two upstream branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionConfig {
    pub union_all: bool,
}

/// Configuration of the terminal sink node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkConfig {
    pub target: SinkTarget,
    pub mode: WriteMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkTarget {
    pub table: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    #[default]
    Append,
    Replace,
}

/// Configuration of a visualization node. Chart rendering itself is outside
/// this core; the node only names the chart it feeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_kind: Option<String>,
}
