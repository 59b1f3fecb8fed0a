// ABOUTME: Scalar values read from result rows and their SQL literal encoding
// ABOUTME: Escapes text, hex-encodes non-UTF-8 binary, and formats timestamps

use chrono::NaiveDateTime;
use std::fmt;

/// One scalar read from a result row.
///
/// The executor adapter produces these so the encoder works over a closed set
/// of cases instead of inspecting arbitrary runtime types.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bytes(Vec<u8>),
    Text(String),
    Timestamp(NaiveDateTime),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Anything else, already rendered as text. Always emitted quoted.
    Other(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Text view of the value, used when a metadata column is read as a name
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            SqlValue::Text(s) | SqlValue::Other(s) => Some(s.clone()),
            SqlValue::Timestamp(ts) => Some(ts.format(TIMESTAMP_FORMAT).to_string()),
            SqlValue::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            SqlValue::Int(i) => Some(i.to_string()),
            SqlValue::UInt(u) => Some(u.to_string()),
            SqlValue::Float(f) => Some(f.to_string()),
        }
    }

    /// Integer view of the value; text holding digits is parsed
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            SqlValue::UInt(u) => i64::try_from(*u).ok(),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            SqlValue::Bytes(_) | SqlValue::Text(_) | SqlValue::Other(_) => {
                self.as_text().and_then(|s| s.trim().parse().ok())
            }
            _ => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_value(self))
    }
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Escape a string for use inside a single-quoted MySQL literal
///
/// Backslash, single quote, newline, carriage return, tab and NUL become
/// their two-character escapes. Every other character is left alone.
///
/// # Examples
///
/// ```
/// # use mysql_dump_migrator::migration::value::escape_sql_string;
/// assert_eq!(escape_sql_string("O'Brien"), "O\\'Brien");
/// assert_eq!(escape_sql_string("a\nb"), "a\\nb");
/// ```
pub fn escape_sql_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out
}

fn quoted(s: &str) -> String {
    format!("'{}'", escape_sql_string(s))
}

/// Encode one value as SQL literal text
///
/// NULL short-circuits first, then binary payloads are checked for UTF-8
/// before any generic rendering:
/// - valid UTF-8 bytes and text → quoted, escaped string
/// - other bytes → `0x` plus lowercase hex
/// - timestamps → `'YYYY-MM-DD HH:MM:SS'`
/// - booleans → `1` / `0`
/// - integers and floats → unquoted decimal text
/// - anything else → quoted, escaped string
///
/// # Examples
///
/// ```
/// # use mysql_dump_migrator::migration::value::{encode_value, SqlValue};
/// assert_eq!(encode_value(&SqlValue::Null), "NULL");
/// assert_eq!(encode_value(&SqlValue::Bytes(vec![0xff, 0x00])), "0xff00");
/// assert_eq!(encode_value(&SqlValue::Int(-42)), "-42");
/// ```
pub fn encode_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => quoted(text),
            Err(_) => format!("0x{}", hex::encode(bytes)),
        },
        SqlValue::Text(text) => quoted(text),
        SqlValue::Timestamp(ts) => format!("'{}'", ts.format(TIMESTAMP_FORMAT)),
        SqlValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::UInt(u) => u.to_string(),
        SqlValue::Float(f) => f.to_string(),
        SqlValue::Other(text) => quoted(text),
    }
}
