use super::{FlowSource, PipelineStage, resolve};
use crate::config::OutputType;
use crate::error::ResolveError;
use crate::graph::PipelineGraph;
use crate::metadata::MetadataCache;

/// A column a node can select from, with the data type it carries at that
/// point of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// The columns available to `node_id`: the upstream filter's selection (or
/// every column of its table when none is selected) plus every result
/// column produced by arithmetic, condition and count stages earlier in
/// the path, with types narrowed by any preceding cast. Recomputed from
/// graph plus cache on every call.
pub fn available_columns(
    graph: &PipelineGraph,
    cache: &MetadataCache,
    node_id: &str,
) -> Result<Vec<ColumnInfo>, ResolveError> {
    let flow = resolve(graph, node_id)?;

    let mut columns = match &flow.source {
        FlowSource::Table {
            connection_id,
            filter,
        } => table_columns(cache, connection_id, &filter.table, &filter.columns),
        FlowSource::Join { join, filter } => {
            if let Some(filter) = filter {
                table_columns(cache, &join.connection_id, &filter.table, &filter.columns)
            } else {
                let mut base =
                    table_columns(cache, &join.connection_id, &join.table, &join.columns);
                for link in &join.joins {
                    for column in
                        table_columns(cache, &link.connection_id, &link.table, &link.columns)
                    {
                        upsert(&mut base, column);
                    }
                }
                base
            }
        }
        // Both branches of a union share one shape; the left branch
        // defines it.
        FlowSource::Union { left, .. } => table_columns(
            cache,
            &left.connection_id,
            &left.filter.table,
            &left.filter.columns,
        ),
    };

    for stage in &flow.pipeline {
        match stage {
            PipelineStage::Cast(config) => {
                for rule in &config.conversions {
                    if let Some(column) = columns.iter_mut().find(|c| c.name == rule.column) {
                        column.data_type = rule.target_type.data_type_name().to_string();
                    }
                }
            }
            PipelineStage::Arithmetic(config) => {
                for op in &config.operations {
                    upsert(
                        &mut columns,
                        ColumnInfo {
                            name: op.result_column.clone(),
                            data_type: "number".to_string(),
                        },
                    );
                }
            }
            PipelineStage::Condition(config) => {
                if let Some(shared) = &config.result_column {
                    let data_type = config
                        .rules
                        .first()
                        .map(|rule| output_type_name(rule.output_type))
                        .unwrap_or("string");
                    upsert(
                        &mut columns,
                        ColumnInfo {
                            name: shared.clone(),
                            data_type: data_type.to_string(),
                        },
                    );
                } else {
                    for rule in &config.rules {
                        upsert(
                            &mut columns,
                            ColumnInfo {
                                name: rule.result_column.clone(),
                                data_type: output_type_name(rule.output_type).to_string(),
                            },
                        );
                    }
                }
            }
            PipelineStage::Clean(_) => {}
        }
    }

    for count in &flow.counts {
        upsert(
            &mut columns,
            ColumnInfo {
                name: count.result_column.clone(),
                data_type: "integer".to_string(),
            },
        );
    }

    Ok(columns)
}

/// The filter's selected columns with their cached types, or the table's
/// full column list when the selection is empty. A cache miss degrades to
/// the bare selection with the default type.
fn table_columns(
    cache: &MetadataCache,
    connection_id: &str,
    table: &str,
    selection: &[String],
) -> Vec<ColumnInfo> {
    let metadata = cache.get(connection_id);
    let table_meta = metadata.as_deref().and_then(|m| m.table(table));

    if selection.is_empty() {
        return table_meta
            .map(|t| {
                t.columns
                    .iter()
                    .map(|c| ColumnInfo {
                        name: c.name.clone(),
                        data_type: c.data_type.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
    }

    selection
        .iter()
        .map(|name| ColumnInfo {
            name: name.clone(),
            data_type: table_meta
                .and_then(|t| t.columns.iter().find(|c| &c.name == name))
                .map(|c| c.data_type.clone())
                .unwrap_or_else(|| "string".to_string()),
        })
        .collect()
}

fn upsert(columns: &mut Vec<ColumnInfo>, column: ColumnInfo) {
    if let Some(existing) = columns.iter_mut().find(|c| c.name == column.name) {
        *existing = column;
    } else {
        columns.push(column);
    }
}

fn output_type_name(output: OutputType) -> &'static str {
    match output {
        OutputType::Boolean => "boolean",
        OutputType::String => "string",
        OutputType::Number => "number",
    }
}
