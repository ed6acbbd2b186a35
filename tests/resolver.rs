//! Upstream flow resolution: terminal-source discovery, stage ordering,
//! accumulator merging and the failure modes reported before dispatch.
mod common;

use caudal::config::{
    CleanConfig, DedupeKeep, DedupeSpec, JoinConfig, JoinType, NodeConfig, SecondaryJoin,
    UnionConfig,
};
use caudal::error::ResolveError;
use caudal::graph::{NodeKind, PipelineGraph};
use caudal::metadata::MetadataCache;
use caudal::resolver::{FlowSource, PipelineStage, available_columns, resolve};
use common::{filter_node, node, sink_node, source_node, ventas_metadata};

#[test]
fn sales_pipeline_resolves_to_its_source_and_stages() {
    let graph = common::sales_pipeline();
    let flow = resolve(&graph, "out").unwrap();

    match &flow.source {
        FlowSource::Table {
            connection_id,
            filter,
        } => {
            assert_eq!(connection_id, "conn-1");
            assert_eq!(filter.table, "PUBLIC.VENTAS");
            assert_eq!(filter.columns, vec!["fecha", "monto"]);
        }
        other => panic!("unexpected source: {other:?}"),
    }

    assert_eq!(flow.conversions.len(), 1);
    assert_eq!(flow.operations.len(), 1);
    assert_eq!(flow.operations[0].result_column, "total");

    // Stages run source-to-target: cast before arithmetic.
    assert!(matches!(flow.pipeline[0], PipelineStage::Cast(_)));
    assert!(matches!(flow.pipeline[1], PipelineStage::Arithmetic(_)));
    assert_eq!(flow.pipeline.len(), 2);
}

#[test]
fn resolving_from_an_intermediate_node_excludes_its_own_config() {
    let graph = common::sales_pipeline();
    let flow = resolve(&graph, "ari").unwrap();
    // The arithmetic node's own operations are merged by the dispatcher,
    // not the resolver.
    assert!(flow.operations.is_empty());
    assert_eq!(flow.pipeline.len(), 1);
    assert!(matches!(flow.pipeline[0], PipelineStage::Cast(_)));
}

#[test]
fn a_filter_target_contributes_its_own_selection() {
    let graph = common::sales_pipeline();
    let flow = resolve(&graph, "flt").unwrap();
    match &flow.source {
        FlowSource::Table { filter, .. } => assert_eq!(filter.table, "PUBLIC.VENTAS"),
        other => panic!("unexpected source: {other:?}"),
    }
    assert!(flow.pipeline.is_empty());
}

#[test]
fn disconnected_node_is_reported() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(node("lonely", NodeKind::Arithmetic));
    assert_eq!(
        resolve(&graph, "lonely"),
        Err(ResolveError::Disconnected("lonely".to_string()))
    );
}

#[test]
fn filter_without_a_table_is_reported() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(source_node("src", "conn-1"));
    graph.insert_node(node("flt", NodeKind::Filter));
    graph.insert_node(sink_node("out", "T"));
    graph.connect("src", "flt").unwrap();
    graph.connect("flt", "out").unwrap();

    assert_eq!(
        resolve(&graph, "out"),
        Err(ResolveError::FilterMissingTable("flt".to_string()))
    );
}

#[test]
fn source_without_a_connection_is_reported() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(node("src", NodeKind::Source));
    graph.insert_node(filter_node("flt", "T", &[]));
    graph.connect("src", "flt").unwrap();

    assert_eq!(
        resolve(&graph, "flt"),
        Err(ResolveError::SourceMissingConnection("src".to_string()))
    );
}

#[test]
fn later_dedupe_spec_wins_and_counts_accumulate() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(source_node("src", "conn-1"));
    graph.insert_node(filter_node("flt", "PUBLIC.VENTAS", &[]));
    graph.insert_node(
        node("cl1", NodeKind::Clean).with_config(NodeConfig::Clean(CleanConfig {
            dedupe: Some(DedupeSpec {
                key_columns: vec!["a".to_string()],
                keep: DedupeKeep::First,
            }),
            ..Default::default()
        })),
    );
    graph.insert_node(node("cnt", NodeKind::Count));
    graph.insert_node(
        node("cl2", NodeKind::Clean).with_config(NodeConfig::Clean(CleanConfig {
            dedupe: Some(DedupeSpec {
                key_columns: vec!["b".to_string()],
                keep: DedupeKeep::Last,
            }),
            ..Default::default()
        })),
    );
    graph.insert_node(sink_node("out", "T"));

    graph.connect("src", "flt").unwrap();
    graph.connect("flt", "cl1").unwrap();
    graph.connect("cl1", "cnt").unwrap();
    graph.connect("cnt", "cl2").unwrap();
    graph.connect("cl2", "out").unwrap();

    let flow = resolve(&graph, "out").unwrap();
    let dedupe = flow.dedupe.expect("a dedupe spec survives");
    assert_eq!(dedupe.key_columns, vec!["b"]);
    assert_eq!(flow.counts.len(), 1);
    assert_eq!(flow.counts[0].result_column, "count");
}

fn union_graph(union_all: bool) -> PipelineGraph {
    let mut graph = PipelineGraph::new();
    graph.insert_node(source_node("s1", "conn-1"));
    graph.insert_node(source_node("s2", "conn-2"));
    graph.insert_node(filter_node("f1", "PUBLIC.VENTAS_2023", &["fecha", "monto"]));
    graph.insert_node(filter_node("f2", "PUBLIC.VENTAS_2024", &["fecha", "monto"]));
    graph.insert_node(
        node("u", NodeKind::Union).with_config(NodeConfig::Union(UnionConfig { union_all })),
    );
    graph.insert_node(sink_node("out", "T"));

    graph.connect("s1", "f1").unwrap();
    graph.connect("s2", "f2").unwrap();
    graph.connect("f1", "u").unwrap();
    graph.connect("f2", "u").unwrap();
    graph.connect("u", "out").unwrap();
    graph
}

#[test]
fn union_resolves_both_branches_in_edge_order() {
    let flow = resolve(&union_graph(true), "out").unwrap();
    match &flow.source {
        FlowSource::Union {
            left,
            right,
            union_all,
        } => {
            assert_eq!(left.connection_id, "conn-1");
            assert_eq!(left.filter.table, "PUBLIC.VENTAS_2023");
            assert_eq!(right.connection_id, "conn-2");
            assert_eq!(right.filter.table, "PUBLIC.VENTAS_2024");
            assert!(union_all);
        }
        other => panic!("unexpected source: {other:?}"),
    }
}

#[test]
fn union_with_one_branch_is_incomplete() {
    let mut graph = union_graph(false);
    let edge_id = graph
        .edges()
        .iter()
        .find(|e| e.from == "f2")
        .unwrap()
        .id
        .clone();
    graph.disconnect(&edge_id);

    match resolve(&graph, "out") {
        Err(ResolveError::UnionIncomplete { node_id, reason }) => {
            assert_eq!(node_id, "u");
            assert!(reason.contains("1 inbound"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn union_branch_without_a_source_is_incomplete() {
    let mut graph = union_graph(false);
    let edge_id = graph
        .edges()
        .iter()
        .find(|e| e.from == "s2")
        .unwrap()
        .id
        .clone();
    graph.disconnect(&edge_id);

    assert!(matches!(
        resolve(&graph, "out"),
        Err(ResolveError::UnionIncomplete { .. })
    ));
}

#[test]
fn union_branch_without_a_table_is_incomplete() {
    let mut graph = union_graph(false);
    if let Some(filter) = graph.node_mut("f2") {
        filter.config = NodeConfig::Filter(Default::default());
    }

    match resolve(&graph, "out") {
        Err(ResolveError::UnionIncomplete { node_id, reason }) => {
            assert_eq!(node_id, "u");
            assert!(reason.contains("table"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn join_descriptor_validates_column_pairings() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(
        node("j", NodeKind::Join).with_config(NodeConfig::Join(JoinConfig {
            connection_id: Some("conn-1".to_string()),
            table: Some("PUBLIC.VENTAS".to_string()),
            columns: vec![],
            joins: vec![SecondaryJoin {
                secondary_connection_id: None,
                secondary_table: "PUBLIC.CLIENTES".to_string(),
                join_type: JoinType::Inner,
                primary_column: Some("cliente_id".to_string()),
                secondary_column: None,
                secondary_columns: vec![],
            }],
        })),
    );
    graph.insert_node(filter_node("flt", "PUBLIC.VENTAS", &[]));
    graph.connect("j", "flt").unwrap();

    match resolve(&graph, "flt") {
        Err(ResolveError::JoinMissingPairing { node_id, table }) => {
            assert_eq!(node_id, "j");
            assert_eq!(table, "PUBLIC.CLIENTES");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn join_secondary_inherits_the_primary_connection() {
    let mut graph = PipelineGraph::new();
    graph.insert_node(
        node("j", NodeKind::Join).with_config(NodeConfig::Join(JoinConfig {
            connection_id: Some("conn-1".to_string()),
            table: Some("PUBLIC.VENTAS".to_string()),
            columns: vec!["monto".to_string()],
            joins: vec![SecondaryJoin {
                secondary_connection_id: None,
                secondary_table: "PUBLIC.CLIENTES".to_string(),
                join_type: JoinType::Left,
                primary_column: Some("cliente_id".to_string()),
                secondary_column: Some("id".to_string()),
                secondary_columns: vec!["nombre".to_string()],
            }],
        })),
    );
    graph.insert_node(sink_node("out", "T"));
    graph.connect("j", "out").unwrap();

    let flow = resolve(&graph, "out").unwrap();
    match &flow.source {
        FlowSource::Join { join, filter } => {
            assert!(filter.is_none());
            assert_eq!(join.joins[0].connection_id, "conn-1");
            assert_eq!(join.joins[0].join_type, JoinType::Left);
        }
        other => panic!("unexpected source: {other:?}"),
    }
}

#[test]
fn available_columns_follow_casts_and_results() {
    let graph = common::sales_pipeline();
    let mut cache = MetadataCache::new();
    cache.set("conn-1", ventas_metadata());

    let columns = available_columns(&graph, &cache, "out").unwrap();
    let lookup = |name: &str| {
        columns
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("missing column {name}"))
    };

    assert_eq!(lookup("fecha").data_type, "date");
    // Cast narrows monto from its stored string type.
    assert_eq!(lookup("monto").data_type, "number");
    // The arithmetic result appears even though no table has it.
    assert_eq!(lookup("total").data_type, "number");
    assert!(columns.iter().all(|c| c.name != "cliente"));
}

#[test]
fn describe_lists_extraction_and_each_stage() {
    let graph = common::sales_pipeline();
    let flow = resolve(&graph, "out").unwrap();
    let steps = flow.describe();

    assert_eq!(steps.len(), 3);
    assert!(steps[0].contains("PUBLIC.VENTAS"));
    assert!(steps[1].starts_with("Cast"));
    assert!(steps[2].contains("total"));
}
