//! Common test utilities for building pipeline graphs and metadata.
use caudal::config::{
    ArithmeticConfig, ArithmeticOperation, ArithmeticOperator, CastConfig, CastRule, FilterConfig,
    NodeConfig, Operand, SinkConfig, SinkTarget, SourceConfig, TargetType, WriteMode,
};
use caudal::graph::{Node, NodeKind, PipelineGraph, Rect};
use caudal::metadata::{ColumnMetadata, SourceMetadata, TableMetadata};

#[allow(dead_code)]
pub fn node(id: &str, kind: NodeKind) -> Node {
    Node::new(id, kind, Rect::new(0, 0, 160, 96))
}

#[allow(dead_code)]
pub fn source_node(id: &str, connection_id: &str) -> Node {
    node(id, NodeKind::Source).with_config(NodeConfig::Source(SourceConfig {
        connection_id: Some(connection_id.to_string()),
    }))
}

#[allow(dead_code)]
pub fn filter_node(id: &str, table: &str, columns: &[&str]) -> Node {
    node(id, NodeKind::Filter).with_config(NodeConfig::Filter(FilterConfig {
        table: Some(table.to_string()),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        conditions: vec![],
    }))
}

#[allow(dead_code)]
pub fn sink_node(id: &str, target_table: &str) -> Node {
    node(id, NodeKind::Sink).with_config(NodeConfig::Sink(SinkConfig {
        target: SinkTarget {
            table: target_table.to_string(),
        },
        mode: WriteMode::Append,
        last_run: None,
    }))
}

/// Builds the canonical sales pipeline:
/// source -> filter(PUBLIC.VENTAS: fecha, monto) -> cast(monto: number)
/// -> arithmetic(total = monto * 1.21) -> sink(PUBLIC.VENTAS_NETAS).
#[allow(dead_code)]
pub fn sales_pipeline() -> PipelineGraph {
    let mut graph = PipelineGraph::new();
    graph.insert_node(source_node("src", "conn-1"));
    graph.insert_node(filter_node("flt", "PUBLIC.VENTAS", &["fecha", "monto"]));
    graph.insert_node(
        node("cst", NodeKind::Cast).with_config(NodeConfig::Cast(CastConfig {
            conversions: vec![CastRule::new("monto", TargetType::Number)],
        })),
    );
    graph.insert_node(
        node("ari", NodeKind::Arithmetic).with_config(NodeConfig::Arithmetic(ArithmeticConfig {
            operations: vec![ArithmeticOperation {
                left_operand: Operand::Column("monto".to_string()),
                operator: ArithmeticOperator::Multiply,
                right_operand: Operand::Constant("1.21".to_string()),
                result_column: "total".to_string(),
            }],
        })),
    );
    graph.insert_node(sink_node("out", "PUBLIC.VENTAS_NETAS"));

    graph.connect("src", "flt").unwrap();
    graph.connect("flt", "cst").unwrap();
    graph.connect("cst", "ari").unwrap();
    graph.connect("ari", "out").unwrap();
    graph
}

/// Metadata for `conn-1` with the `PUBLIC.VENTAS` table.
#[allow(dead_code)]
pub fn ventas_metadata() -> SourceMetadata {
    SourceMetadata {
        db_version: Some("15.2".to_string()),
        schemas: vec!["PUBLIC".to_string()],
        tables: vec![TableMetadata {
            schema: "PUBLIC".to_string(),
            name: "VENTAS".to_string(),
            columns: vec![
                column("id", "integer"),
                column("fecha", "date"),
                column("monto", "string"),
                column("cliente", "string"),
            ],
        }],
    }
}

#[allow(dead_code)]
pub fn column(name: &str, data_type: &str) -> ColumnMetadata {
    ColumnMetadata {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable: true,
        default_value: None,
        is_primary_key: None,
    }
}
