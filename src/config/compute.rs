use serde::{Deserialize, Serialize};

/// Configuration of a count node: tallies occurrences of an attribute's
/// values into a result column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountConfig {
    pub attribute: Option<String>,
    pub result_column: String,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            attribute: None,
            result_column: "count".to_string(),
        }
    }
}

/// One side of a binary operation: either a column reference or a literal
/// constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Operand {
    Column(String),
    Constant(String),
}

/// Configuration of an arithmetic node: an ordered list of binary
/// operations, each producing a named result column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArithmeticConfig {
    #[serde(default)]
    pub operations: Vec<ArithmeticOperation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArithmeticOperation {
    pub left_operand: Operand,
    pub operator: ArithmeticOperator,
    pub right_operand: Operand,
    pub result_column: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOperator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "%")]
    Modulo,
    #[serde(rename = "^")]
    Power,
    #[serde(rename = "pct_of")]
    PctOf,
    #[serde(rename = "pct_off")]
    PctOff,
}

impl ArithmeticOperator {
    /// Applies the operator to two numeric operands. `pct_of` computes
    /// `a * b / 100` and `pct_off` computes `a * (1 - b)`.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Divide => a / b,
            Self::Modulo => a % b,
            Self::Power => a.powf(b),
            Self::PctOf => a * b / 100.0,
            Self::PctOff => a * (1.0 - b),
        }
    }
}

/// Configuration of a condition node. Two modes coexist:
///
/// - per-rule independent output: each rule writes its own `result_column`
///   with `then_value`/`else_value` of its `output_type`;
/// - shared-column sequential evaluation: when the node-level
///   `result_column` is set, the first matching rule wins and
///   `default_result_value` is used when none match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionConfig {
    #[serde(default)]
    pub rules: Vec<ConditionRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_result_value: Option<String>,
}

impl ConditionConfig {
    /// Whether the node evaluates in shared-column sequential mode.
    pub fn is_sequential(&self) -> bool {
        self.result_column.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRule {
    pub left_operand: Operand,
    pub comparator: Comparator,
    pub right_operand: Operand,
    pub result_column: String,
    pub output_type: OutputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub else_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_filter: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Boolean,
    String,
    Number,
}
