use serde::{Deserialize, Serialize};

/// Configuration of a join node: one primary table joined independently to
/// N secondary tables (a star-schema topology; every secondary joins only
/// to the primary).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinConfig {
    pub connection_id: Option<String>,
    pub table: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub joins: Vec<SecondaryJoin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryJoin {
    /// Falls back to the primary connection when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_connection_id: Option<String>,
    pub secondary_table: String,
    pub join_type: JoinType,
    pub primary_column: Option<String>,
    pub secondary_column: Option<String>,
    #[serde(default)]
    pub secondary_columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl Default for JoinType {
    fn default() -> Self {
        Self::Inner
    }
}
