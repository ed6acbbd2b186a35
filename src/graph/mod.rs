//! The pipeline graph: an arena of typed nodes keyed by stable ids, plus
//! the directed edges between them. All structural invariants live here;
//! edge creation goes through the connection validator.

use crate::error::GraphError;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

pub mod connect;
mod node;

pub use connect::{allowed_targets, can_connect, describe_allowed};
pub use node::{Edge, Node, NodeKind, Rect};

/// Outcome of an edge insertion. Re-adding an existing edge is a no-op,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeOutcome {
    Added(String),
    Existing(String),
}

/// The mutable graph state behind the editor canvas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineGraph {
    nodes: AHashMap<String, Node>,
    edges: Vec<Edge>,
    next_edge_id: u64,
}

impl PipelineGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, replacing any node with the same id.
    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Removes a node and every edge that touches it, and nothing else.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let removed = self.nodes.remove(id)?;
        self.edges.retain(|edge| edge.from != id && edge.to != id);
        Some(removed)
    }

    /// Edges whose `to` endpoint is the given node.
    pub fn inbound(&self, id: &str) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.to == id)
    }

    /// Edges whose `from` endpoint is the given node.
    pub fn outbound(&self, id: &str) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.from == id)
    }

    /// Connects `from` to `to`, enforcing every structural invariant:
    /// the kind matrix, single-inbound (two for unions), and acyclicity.
    /// Re-adding an existing edge returns `EdgeOutcome::Existing`.
    pub fn connect(&mut self, from: &str, to: &str) -> Result<EdgeOutcome, GraphError> {
        if from == to {
            return Err(GraphError::SelfEdge);
        }
        let from_kind = self
            .nodes
            .get(from)
            .ok_or_else(|| GraphError::NodeNotFound(from.to_string()))?
            .kind;
        let to_kind = self
            .nodes
            .get(to)
            .ok_or_else(|| GraphError::NodeNotFound(to.to_string()))?
            .kind;

        if !connect::can_connect(from_kind, to_kind) {
            return Err(GraphError::IncompatibleKinds {
                from: from_kind,
                to: to_kind,
                allowed: connect::describe_allowed(from_kind),
            });
        }

        if let Some(existing) = self
            .edges
            .iter()
            .find(|edge| edge.from == from && edge.to == to)
        {
            return Ok(EdgeOutcome::Existing(existing.id.clone()));
        }

        let inbound_count = self.inbound(to).count();
        match to_kind {
            NodeKind::Union if inbound_count >= 2 => {
                return Err(GraphError::UnionFull {
                    node_id: to.to_string(),
                });
            }
            NodeKind::Union => {}
            _ if inbound_count >= 1 => {
                return Err(GraphError::InputOccupied {
                    node_id: to.to_string(),
                });
            }
            _ => {}
        }

        // The validator only checks kind pairs; reachability is checked
        // here so a user cannot close a loop through legal pairs.
        if self.reaches(to, from) {
            return Err(GraphError::WouldCycle {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let id = format!("e{}", self.next_edge_id);
        self.next_edge_id += 1;
        self.edges.push(Edge {
            id: id.clone(),
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(EdgeOutcome::Added(id))
    }

    /// Removes an edge by id. Returns whether an edge was removed.
    pub fn disconnect(&mut self, edge_id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|edge| edge.id != edge_id);
        self.edges.len() != before
    }

    /// Depth-first reachability over the directed edge set.
    fn reaches(&self, start: &str, goal: &str) -> bool {
        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut stack: Vec<&str> = vec![start];
        while let Some(current) = stack.pop() {
            if current == goal {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            for edge in self.outbound(current) {
                stack.push(&edge.to);
            }
        }
        false
    }
}
