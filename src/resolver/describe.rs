use super::{FlowSource, PipelineStage, ResolvedFlow};
use crate::config::Operand;
use itertools::Itertools;

impl ResolvedFlow {
    /// Renders the resolved flow as an ordered list of human-readable
    /// steps: one for the extraction and one per transformation stage.
    /// Mirrors the step descriptions the execution service returns with a
    /// preview, so callers can show "what will run" without a round trip.
    pub fn describe(&self) -> Vec<String> {
        let mut steps = vec![self.describe_source()];
        for stage in &self.pipeline {
            steps.push(describe_stage(stage));
        }
        for count in &self.counts {
            steps.push(format!(
                "Count occurrences of {} into '{}'",
                count.attribute.as_deref().unwrap_or("each row"),
                count.result_column
            ));
        }
        steps
    }

    fn describe_source(&self) -> String {
        match &self.source {
            FlowSource::Table {
                connection_id,
                filter,
            } => {
                let columns = if filter.columns.is_empty() {
                    "all columns".to_string()
                } else {
                    filter.columns.join(", ")
                };
                format!(
                    "Extract {} from {} (source {}), {} condition(s)",
                    columns,
                    filter.table,
                    connection_id,
                    filter.conditions.len()
                )
            }
            FlowSource::Join { join, .. } => format!(
                "Join {} with {}",
                join.table,
                join.joins.iter().map(|link| link.table.as_str()).join(", ")
            ),
            FlowSource::Union {
                left,
                right,
                union_all,
            } => format!(
                "Union {} of {} and {}",
                if *union_all { "(all)" } else { "(distinct)" },
                left.filter.table,
                right.filter.table
            ),
        }
    }
}

fn describe_stage(stage: &PipelineStage) -> String {
    match stage {
        PipelineStage::Clean(config) => {
            let transforms = config.expand_transforms();
            let columns: Vec<&str> = transforms
                .iter()
                .map(|t| t.column.as_str())
                .unique()
                .collect();
            format!("Clean {} column(s): {}", columns.len(), columns.join(", "))
        }
        PipelineStage::Cast(config) => format!(
            "Cast {}",
            config
                .conversions
                .iter()
                .map(|rule| format!("{} to {}", rule.column, rule.target_type.data_type_name()))
                .join(", ")
        ),
        PipelineStage::Arithmetic(config) => format!(
            "Compute {}",
            config
                .operations
                .iter()
                .map(|op| {
                    format!(
                        "{} = {} {} {}",
                        op.result_column,
                        describe_operand(&op.left_operand),
                        operator_symbol(op),
                        describe_operand(&op.right_operand)
                    )
                })
                .join(", ")
        ),
        PipelineStage::Condition(config) => format!(
            "Apply {} conditional rule(s){}",
            config.rules.len(),
            config
                .result_column
                .as_deref()
                .map(|column| format!(" into shared column '{column}'"))
                .unwrap_or_default()
        ),
    }
}

fn describe_operand(operand: &Operand) -> String {
    match operand {
        Operand::Column(name) => format!("[{name}]"),
        Operand::Constant(value) => value.clone(),
    }
}

fn operator_symbol(op: &crate::config::ArithmeticOperation) -> &'static str {
    use crate::config::ArithmeticOperator::*;
    match op.operator {
        Add => "+",
        Subtract => "-",
        Multiply => "*",
        Divide => "/",
        Modulo => "%",
        Power => "^",
        PctOf => "pct_of",
        PctOff => "pct_off",
    }
}
