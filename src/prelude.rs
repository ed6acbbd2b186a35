//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types from the caudal crate. Import
//! this module to get access to the core functionality without having to
//! import each type individually.
//!
//! ```rust,no_run
//! use caudal::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let mut graph = PipelineGraph::new();
//! graph.insert_node(Node::new("src", NodeKind::Source, Rect::new(0, 0, 160, 96)));
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::graph::{Edge, EdgeOutcome, Node, NodeKind, PipelineGraph, Rect};

// Canvas geometry
pub use crate::canvas::{Canvas, DragSession, NudgeStep, Point, ResizeHandle, ResizeSession};

// Node configuration
pub use crate::config::NodeConfig;

// Flow resolution
pub use crate::resolver::{FlowSource, ResolvedFlow, available_columns, resolve};

// Dispatch
pub use crate::dispatch::{Dispatcher, ExecutionRequest, ExecutionTransport, RunStatus};

// Metadata
pub use crate::metadata::{MetadataCache, MetadataService, SourceMetadata};

// Error types
pub use crate::error::{DispatchError, GraphError, ResolveError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
