//! Text parsing helpers shared by parsers and structure operations.

use chrono::{NaiveDate, NaiveDateTime};

use crate::constants::structure::{DATE_FORMATS, TIMESTAMP_FORMATS};
use crate::structure::{Label, Value};

/// Parse a timestamp or bare date. Dates are anchored at midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(stamp);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Infer a typed cell value from delimited text.
///
/// Tries, in order: empty (null), integer, float, timestamp, then falls back
/// to text. Float parsing accepts `inf`, `-Infinity` and `NaN` spellings.
pub fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Int(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        return Value::Float(float);
    }
    if let Some(stamp) = parse_timestamp(trimmed) {
        return Value::DateTime(stamp);
    }
    Value::Text(trimmed.to_string())
}

/// Infer an index label from delimited text.
pub fn parse_label(raw: &str) -> Label {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Label::Int(int);
    }
    if let Some(stamp) = parse_timestamp(trimmed) {
        return Label::DateTime(stamp);
    }
    Label::Text(trimmed.to_string())
}
