use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Configuration of a cast node: an ordered list of column conversions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastConfig {
    #[serde(default)]
    pub conversions: Vec<CastRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastRule {
    pub column: String,
    pub target_type: TargetType,
    /// Date-pattern the source values are parsed with; tokens per
    /// [`token_pattern_to_chrono`]. Absent, a locale-free ISO parse is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_format: Option<String>,
    /// Date-pattern the values are reformatted into. Absent, ISO 8601.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

impl CastRule {
    pub fn new(column: impl Into<String>, target_type: TargetType) -> Self {
        Self {
            column: column.into(),
            target_type,
            input_format: None,
            output_format: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    String,
    Integer,
    Number,
    Decimal,
    Boolean,
    Date,
    Datetime,
}

impl TargetType {
    /// The data-type name this cast narrows a column to, as reported by
    /// the metadata boundary.
    pub fn data_type_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
        }
    }
}

/// Translates the UI date-token pattern language into a chrono format
/// string. Tokens: `dd`/`d` (day), `MM`/`M` (month number), `MMM`/`MMMM`
/// (month name), `yyyy` (year), `EEEE` (weekday name). Segments quoted with
/// single quotes pass through literally.
pub fn token_pattern_to_chrono(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\'' {
            // Literal segment up to the closing quote.
            i += 1;
            while i < chars.len() && chars[i] != '\'' {
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }
        let rest: String = chars[i..].iter().collect();
        let (fmt, consumed) = if rest.starts_with("MMMM") {
            ("%B", 4)
        } else if rest.starts_with("MMM") {
            ("%b", 3)
        } else if rest.starts_with("MM") {
            ("%m", 2)
        } else if rest.starts_with('M') {
            ("%-m", 1)
        } else if rest.starts_with("dd") {
            ("%d", 2)
        } else if rest.starts_with('d') {
            ("%-d", 1)
        } else if rest.starts_with("yyyy") {
            ("%Y", 4)
        } else if rest.starts_with("EEEE") {
            ("%A", 4)
        } else {
            push_literal(&mut out, chars[i]);
            i += 1;
            continue;
        };
        out.push_str(fmt);
        i += consumed;
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Parses a date value with the given token pattern (or a locale-free ISO
/// parse when absent) and reformats it with the output pattern (or ISO 8601
/// when absent). Returns `None` when the value does not parse.
pub fn reformat_date(value: &str, input: Option<&str>, output: Option<&str>) -> Option<String> {
    let date = match input {
        Some(pattern) => {
            let fmt = token_pattern_to_chrono(pattern);
            NaiveDate::parse_from_str(value, &fmt).ok()?
        }
        None => value
            .parse::<NaiveDate>()
            .ok()
            .or_else(|| value.parse::<NaiveDateTime>().ok().map(|dt| dt.date()))?,
    };
    let rendered = match output {
        Some(pattern) => date.format(&token_pattern_to_chrono(pattern)).to_string(),
        None => date.format("%Y-%m-%d").to_string(),
    };
    Some(rendered)
}
