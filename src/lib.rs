//! # Caudal - Visual Data Pipeline Core
//!
//! **Caudal** is the headless core of a visual data-pipeline builder. It owns
//! the typed node/edge graph behind the editor canvas, the canvas geometry
//! itself (pan, zoom, grid-snapped drag and resize), and the compiler that
//! turns a node's upstream path into a single ordered pipeline description
//! ready to hand to an execution service.
//!
//! ## Core Workflow
//!
//! 1.  **Build the graph**: insert typed nodes ([`graph::Node`]) and connect
//!     them. Every edge is validated against the connection matrix, the
//!     single-input rule and acyclicity before it exists.
//! 2.  **Configure nodes**: each node carries a [`config::NodeConfig`]
//!     payload matching its kind (filter selections, cast rules, arithmetic
//!     operations, ...).
//! 3.  **Resolve**: [`resolver::resolve`] walks backward from any node,
//!     finds its terminal source and compiles every transformation stage on
//!     the path into one [`resolver::ResolvedFlow`].
//! 4.  **Dispatch**: a [`dispatch::Dispatcher`] turns the resolved flow into
//!     an execution request, previews it or starts a committing run through
//!     an [`dispatch::ExecutionTransport`], and tracks the run to completion.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use caudal::prelude::*;
//! use caudal::config::{FilterConfig, NodeConfig, SourceConfig};
//!
//! fn main() -> Result<()> {
//!     let mut graph = PipelineGraph::new();
//!     graph.insert_node(
//!         Node::new("src", NodeKind::Source, Rect::new(0, 0, 160, 96)).with_config(
//!             NodeConfig::Source(SourceConfig {
//!                 connection_id: Some("conn-1".into()),
//!             }),
//!         ),
//!     );
//!     graph.insert_node(
//!         Node::new("flt", NodeKind::Filter, Rect::new(240, 0, 160, 96)).with_config(
//!             NodeConfig::Filter(FilterConfig {
//!                 table: Some("PUBLIC.VENTAS".into()),
//!                 columns: vec!["fecha".into(), "monto".into()],
//!                 conditions: vec![],
//!             }),
//!         ),
//!     );
//!     graph.insert_node(Node::new("out", NodeKind::Sink, Rect::new(480, 0, 160, 96)));
//!
//!     graph.connect("src", "flt")?;
//!     graph.connect("flt", "out")?;
//!
//!     // Compile the sink's upstream path into one flow description.
//!     let flow = resolve(&graph, "out")?;
//!     for step in flow.describe() {
//!         println!("{step}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The execution side is async; pair a [`dispatch::Dispatcher`] with your
//! transport implementation and call `preview`, `run` and `track_run` from a
//! tokio runtime.

pub mod canvas;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod prelude;
pub mod resolver;
