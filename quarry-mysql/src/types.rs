//! Conversions between Quarry values and `mysql_async` values.

use mysql_async::{Params, Row, Value};
use serde_json::Value as JsonValue;

use quarry_query::value::QueryValue;

use crate::driver::Record;

/// Convert a bound argument into a MySQL value.
pub fn to_mysql_value(value: &QueryValue) -> Value {
    match value {
        QueryValue::Null => Value::NULL,
        QueryValue::Bool(b) => Value::from(*b),
        QueryValue::Int(i) => Value::Int(*i),
        QueryValue::UInt(u) => Value::UInt(*u),
        QueryValue::Float(f) => Value::Double(*f),
        QueryValue::String(s) => Value::from(s.as_str()),
        QueryValue::Bytes(b) => Value::Bytes(b.clone()),
        QueryValue::Json(j) => Value::from(j.to_string()),
    }
}

/// Build positional parameters; no arguments become `Params::Empty`.
pub fn to_params(args: &[QueryValue]) -> Params {
    if args.is_empty() {
        Params::Empty
    } else {
        Params::Positional(args.iter().map(to_mysql_value).collect())
    }
}

/// Convert a MySQL value into JSON.
///
/// Text is kept as a string; bytes that are not UTF-8 become an array of
/// numbers so they deserialize into `Vec<u8>`.
pub fn from_mysql_value(value: Value) -> JsonValue {
    match value {
        Value::NULL => JsonValue::Null,
        Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => JsonValue::String(s),
            Err(e) => JsonValue::Array(
                e.into_bytes()
                    .into_iter()
                    .map(|b| JsonValue::Number(b.into()))
                    .collect(),
            ),
        },
        Value::Int(i) => JsonValue::Number(i.into()),
        Value::UInt(u) => JsonValue::Number(u.into()),
        Value::Float(f) => serde_json::Number::from_f64(f64::from(f))
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Double(d) => serde_json::Number::from_f64(d)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Date(year, month, day, hour, minute, second, micro) => {
            if hour == 0 && minute == 0 && second == 0 && micro == 0 {
                JsonValue::String(format!("{:04}-{:02}-{:02}", year, month, day))
            } else if micro == 0 {
                JsonValue::String(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    year, month, day, hour, minute, second
                ))
            } else {
                JsonValue::String(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
                    year, month, day, hour, minute, second, micro
                ))
            }
        }
        Value::Time(is_neg, days, hours, minutes, seconds, micro) => {
            let sign = if is_neg { "-" } else { "" };
            let hours = days * 24 + u32::from(hours);
            if micro == 0 {
                JsonValue::String(format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds))
            } else {
                JsonValue::String(format!(
                    "{}{:02}:{:02}:{:02}.{:06}",
                    sign, hours, minutes, seconds, micro
                ))
            }
        }
    }
}

/// Convert a driver row into a [`Record`] keyed by column name.
pub fn row_to_record(row: Row) -> Record {
    let columns = row.columns();
    let values = row.unwrap_raw();

    columns
        .iter()
        .zip(values)
        .map(|(column, value)| {
            let value = value.map(from_mysql_value).unwrap_or(JsonValue::Null);
            (column.name_str().into_owned(), value)
        })
        .collect()
}
