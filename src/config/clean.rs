use serde::{Deserialize, Serialize};

/// Configuration of a clean node: an optional null-normalization pass, an
/// ordered list of per-column text transforms, exact-match value fixes and
/// an optional dedupe specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_cleanup: Option<NullCleanup>,
    #[serde(default)]
    pub transforms: Vec<ColumnTransform>,
    #[serde(default)]
    pub data_fixes: Vec<DataFix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedupe: Option<DedupeSpec>,
}

impl CleanConfig {
    /// Expands the configuration into one flat transform list: null
    /// normalization becomes one synthetic transform per affected column,
    /// followed by the ordinary transforms, followed by each data fix as a
    /// value replacement.
    pub fn expand_transforms(&self) -> Vec<ColumnTransform> {
        let mut out = Vec::new();
        if let Some(cleanup) = &self.null_cleanup {
            for column in &cleanup.columns {
                out.push(ColumnTransform {
                    column: column.clone(),
                    op: TransformOp::NullNormalize {
                        patterns: cleanup.patterns.clone(),
                        replacement: match cleanup.action {
                            NullAction::Null => None,
                            NullAction::Replace => cleanup.replacement.clone(),
                        },
                    },
                });
            }
        }
        out.extend(self.transforms.iter().cloned());
        for fix in &self.data_fixes {
            out.push(ColumnTransform {
                column: fix.column.clone(),
                op: TransformOp::Replace {
                    find: fix.find.clone(),
                    replace_with: fix.replace_with.clone(),
                },
            });
        }
        out
    }
}

/// Normalizes values matching any of `patterns` in the listed columns,
/// either to null or to a replacement value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NullCleanup {
    pub patterns: Vec<String>,
    pub action: NullAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullAction {
    Null,
    Replace,
}

/// One text transform applied to a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnTransform {
    pub column: String,
    #[serde(flatten)]
    pub op: TransformOp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformOp {
    Trim,
    Upper,
    Lower,
    NormalizeSpaces,
    StripInvisible,
    Utf8Normalize,
    CastNumber,
    CastDate,
    Replace {
        find: String,
        #[serde(rename = "replaceWith")]
        replace_with: String,
    },
    /// Synthetic transform produced by expanding a null-normalization
    /// section; not written directly by the editor.
    NullNormalize {
        patterns: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        replacement: Option<String>,
    },
}

/// Exact-match value fix on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFix {
    pub column: String,
    pub find: String,
    pub replace_with: String,
}

/// Row de-duplication over a set of key columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupeSpec {
    pub key_columns: Vec<String>,
    pub keep: DedupeKeep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupeKeep {
    First,
    Last,
}
