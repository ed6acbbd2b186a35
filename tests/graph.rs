//! Structural graph invariants: the connection matrix, input capacity,
//! idempotent edges, cascade deletion and cycle rejection.
mod common;

use caudal::error::GraphError;
use caudal::graph::{EdgeOutcome, NodeKind, PipelineGraph, allowed_targets, can_connect};
use common::{filter_node, node, sink_node, source_node};

#[test]
fn source_connects_to_filter_and_join_only() {
    assert!(can_connect(NodeKind::Source, NodeKind::Filter));
    assert!(can_connect(NodeKind::Source, NodeKind::Join));
    assert!(!can_connect(NodeKind::Source, NodeKind::Sink));
    assert!(!can_connect(NodeKind::Source, NodeKind::Arithmetic));
}

#[test]
fn sinks_and_visualizations_have_no_outputs() {
    assert!(allowed_targets(NodeKind::Sink).is_empty());
    assert!(allowed_targets(NodeKind::Visualization).is_empty());
}

#[test]
fn incompatible_edge_reports_the_allowed_targets() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(source_node("src", "conn-1"));
    graph.insert_node(sink_node("out", "T"));

    let err = graph.connect("src", "out").unwrap_err();
    match err {
        GraphError::IncompatibleKinds { from, to, allowed } => {
            assert_eq!(from, NodeKind::Source);
            assert_eq!(to, NodeKind::Sink);
            assert!(allowed.contains("filter"));
            assert!(allowed.contains("join"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(graph.edges().is_empty());
}

#[test]
fn self_edge_is_rejected() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(filter_node("flt", "T", &[]));
    assert_eq!(graph.connect("flt", "flt"), Err(GraphError::SelfEdge));
}

#[test]
fn re_adding_an_edge_is_a_noop() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(source_node("src", "conn-1"));
    graph.insert_node(filter_node("flt", "T", &[]));

    let first = graph.connect("src", "flt").unwrap();
    let EdgeOutcome::Added(id) = first else {
        panic!("expected a new edge");
    };
    assert_eq!(graph.connect("src", "flt"), Ok(EdgeOutcome::Existing(id)));
    assert_eq!(graph.edges().len(), 1);
}

#[test]
fn second_inbound_edge_is_rejected_outside_unions() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(source_node("a", "conn-1"));
    graph.insert_node(source_node("b", "conn-2"));
    graph.insert_node(filter_node("flt", "T", &[]));

    graph.connect("a", "flt").unwrap();
    let err = graph.connect("b", "flt").unwrap_err();
    assert_eq!(
        err,
        GraphError::InputOccupied {
            node_id: "flt".to_string()
        }
    );
}

#[test]
fn union_accepts_two_inbound_edges_and_no_more() {
    let mut graph = PipelineGraph::new();
    for id in ["f1", "f2", "f3"] {
        graph.insert_node(filter_node(id, "T", &[]));
    }
    graph.insert_node(node("u", NodeKind::Union));

    graph.connect("f1", "u").unwrap();
    graph.connect("f2", "u").unwrap();
    let err = graph.connect("f3", "u").unwrap_err();
    assert_eq!(
        err,
        GraphError::UnionFull {
            node_id: "u".to_string()
        }
    );
}

#[test]
fn closing_a_loop_is_rejected() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(node("a", NodeKind::Arithmetic));
    graph.insert_node(node("b", NodeKind::Condition));
    graph.insert_node(node("c", NodeKind::Cast));

    graph.connect("a", "b").unwrap();
    graph.connect("b", "c").unwrap();
    let err = graph.connect("c", "a").unwrap_err();
    assert_eq!(
        err,
        GraphError::WouldCycle {
            from: "c".to_string(),
            to: "a".to_string()
        }
    );
    assert_eq!(graph.edges().len(), 2);
}

#[test]
fn removing_a_node_cascades_its_edges() {
    let mut graph = common::sales_pipeline();
    assert_eq!(graph.edges().len(), 4);

    graph.remove_node("cst").unwrap();
    assert_eq!(graph.node_count(), 4);
    // Both edges touching the cast node are gone; the rest survive.
    assert_eq!(graph.edges().len(), 2);
    assert!(
        graph
            .edges()
            .iter()
            .all(|e| e.from != "cst" && e.to != "cst")
    );
}

#[test]
fn disconnect_removes_only_the_named_edge() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(source_node("src", "conn-1"));
    graph.insert_node(filter_node("flt", "T", &[]));
    let EdgeOutcome::Added(id) = graph.connect("src", "flt").unwrap() else {
        panic!("expected a new edge");
    };

    assert!(graph.disconnect(&id));
    assert!(!graph.disconnect(&id));
    assert!(graph.edges().is_empty());
}

#[test]
fn unknown_endpoint_is_reported() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(source_node("src", "conn-1"));
    assert_eq!(
        graph.connect("src", "ghost"),
        Err(GraphError::NodeNotFound("ghost".to_string()))
    );
}
