// ABOUTME: Conversion between mysql_async values and the engine's SqlValue
// ABOUTME: Maps dates, times, floats and binary data without losing precision

use crate::migration::value::SqlValue;
use chrono::NaiveDate;
use mysql_async::{Params, Row, Value};

/// Convert a driver value into a `SqlValue`
///
/// - Integers keep their signedness
/// - FLOAT keeps its shortest decimal form instead of the widened f64 digits
/// - Valid DATE/DATETIME values become timestamps; zero dates stay as text
/// - TIME values become `[-]HHH:MM:SS[.ffffff]` text
/// - Byte payloads are moved, never shared with the driver's row buffer
///
/// # Examples
///
/// ```
/// # use mysql_async::Value;
/// # use mysql_dump_migrator::mysql::converter::mysql_value_to_sql;
/// # use mysql_dump_migrator::migration::value::SqlValue;
/// assert_eq!(mysql_value_to_sql(Value::Int(42)), SqlValue::Int(42));
/// assert_eq!(mysql_value_to_sql(Value::NULL), SqlValue::Null);
/// ```
pub fn mysql_value_to_sql(value: Value) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Bytes(bytes) => SqlValue::Bytes(bytes),
        Value::Int(i) => SqlValue::Int(i),
        Value::UInt(u) => SqlValue::UInt(u),
        Value::Float(f) => SqlValue::Float(f.to_string().parse().unwrap_or(f as f64)),
        Value::Double(d) => SqlValue::Float(d),
        Value::Date(year, month, day, hour, minute, second, micro) => {
            NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .and_then(|date| {
                    date.and_hms_micro_opt(
                        u32::from(hour),
                        u32::from(minute),
                        u32::from(second),
                        micro,
                    )
                })
                .map(SqlValue::Timestamp)
                .unwrap_or_else(|| {
                    SqlValue::Other(format!(
                        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                        year, month, day, hour, minute, second
                    ))
                })
        }
        Value::Time(is_negative, days, hours, minutes, seconds, micros) => {
            let sign = if is_negative { "-" } else { "" };
            let total_hours = u64::from(days) * 24 + u64::from(hours);
            let mut text = format!("{}{:02}:{:02}:{:02}", sign, total_hours, minutes, seconds);
            if micros > 0 {
                text.push_str(&format!(".{:06}", micros));
            }
            SqlValue::Other(text)
        }
    }
}

/// Convert a whole driver row, preserving column order
pub fn mysql_row_to_values(mut row: Row) -> Vec<SqlValue> {
    (0..row.len())
        .map(|idx| {
            row.take::<Value, _>(idx)
                .map(mysql_value_to_sql)
                .unwrap_or(SqlValue::Null)
        })
        .collect()
}

/// Convert a `SqlValue` into a bound statement parameter
pub fn sql_to_mysql_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Bytes(bytes) => Value::Bytes(bytes.clone()),
        SqlValue::Text(text) | SqlValue::Other(text) => Value::Bytes(text.as_bytes().to_vec()),
        SqlValue::Timestamp(ts) => Value::Bytes(ts.format("%Y-%m-%d %H:%M:%S").to_string().into_bytes()),
        SqlValue::Bool(b) => Value::Int(i64::from(*b)),
        SqlValue::Int(i) => Value::Int(*i),
        SqlValue::UInt(u) => Value::UInt(*u),
        SqlValue::Float(f) => Value::Double(*f),
    }
}

/// Build driver parameters; an empty slice means no placeholders
pub fn to_params(values: &[SqlValue]) -> Params {
    if values.is_empty() {
        Params::Empty
    } else {
        Params::Positional(values.iter().map(sql_to_mysql_value).collect())
    }
}
