use crate::config::NodeConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of pipeline node kinds. Every consumer of a node matches
/// on this enum exhaustively, so adding a kind forces the validator, the
/// resolver and the dispatcher to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Source,
    Filter,
    Cast,
    Clean,
    Count,
    Arithmetic,
    Condition,
    Join,
    Union,
    Sink,
    Visualization,
}

impl NodeKind {
    /// Kinds at which backward resolution stops.
    pub fn is_terminal_source(self) -> bool {
        matches!(self, Self::Source | Self::Join | Self::Union)
    }

    /// Kinds that contribute a pipeline stage when encountered on the
    /// upstream walk.
    pub fn is_stage(self) -> bool {
        matches!(
            self,
            Self::Clean | Self::Cast | Self::Arithmetic | Self::Condition | Self::Count
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Source => "source",
            Self::Filter => "filter",
            Self::Cast => "cast",
            Self::Clean => "clean",
            Self::Count => "count",
            Self::Arithmetic => "arithmetic",
            Self::Condition => "condition",
            Self::Join => "join",
            Self::Union => "union",
            Self::Sink => "sink",
            Self::Visualization => "visualization",
        };
        write!(f, "{}", name)
    }
}

/// Node geometry in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

/// A single pipeline node: identity, kind, geometry and the configuration
/// payload matching its kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub rect: Rect,
    pub config: NodeConfig,
}

impl Node {
    /// Creates a node of the given kind with its default configuration.
    pub fn new(id: impl Into<String>, kind: NodeKind, rect: Rect) -> Self {
        Self {
            id: id.into(),
            kind,
            rect,
            config: NodeConfig::default_for(kind),
        }
    }

    pub fn with_config(mut self, config: NodeConfig) -> Self {
        debug_assert_eq!(config.kind(), self.kind);
        self.config = config;
        self
    }
}

/// A directed edge: the output of `from` feeds the input of `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub from: String,
    pub to: String,
}
