use crate::errors::{Result, SqlmyError};
use crate::time_zone::{self, utc};
use crate::value::Value;
use chrono::{TimeZone, Utc};
use std::fmt;

// Bounds of the f64 values that fit in an i64 without saturating.
const I64_MIN_F64: f64 = -9_223_372_036_854_775_808.0;
const I64_MAX_F64_EXCLUSIVE: f64 = 9_223_372_036_854_775_808.0;

/// Column type of a `Frame`, named after the dataframe dtype it mirrors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int64,
    Float64,
    DateTime,
    Object,
}

impl ColumnType {
    /// Map a SQL type name to a column type
    ///
    /// Matching ignores case and any length suffix, so `varchar(255)` maps
    /// like `VARCHAR`.
    ///
    /// # Errors
    ///
    /// `UnsupportedSqlType` for any name other than `INTEGER`, `FLOAT`,
    /// `DATETIME` and `VARCHAR`.
    pub fn from_sql_type(sql_type: &str) -> Result<Self> {
        let base = sql_type
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_uppercase();
        match base.as_str() {
            "INTEGER" => Ok(ColumnType::Int64),
            "FLOAT" => Ok(ColumnType::Float64),
            "DATETIME" => Ok(ColumnType::DateTime),
            "VARCHAR" => Ok(ColumnType::Object),
            _ => Err(SqlmyError::UnsupportedSqlType {
                sql_type: sql_type.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int64 => "Int64",
            ColumnType::Float64 => "float64",
            ColumnType::DateTime => "datetime64",
            ColumnType::Object => "object",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert one value to `target`, or `None` if it has no such representation
///
/// `Null` converts to `Null` for every target.
pub fn coerce_value(value: &Value, target: ColumnType) -> Option<Value> {
    if value.is_null() {
        return Some(Value::Null);
    }
    match target {
        ColumnType::Int64 => to_int(value).map(Value::Integer),
        ColumnType::Float64 => to_float(value).map(Value::Real),
        ColumnType::DateTime => to_timestamp(value),
        ColumnType::Object => Some(value.clone()),
    }
}

fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(v) => Some(*v),
        Value::Real(v) => integral(*v),
        Value::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    let fits = v.is_finite()
        && v.fract() == 0.0
        && (I64_MIN_F64..I64_MAX_F64_EXCLUSIVE).contains(&v);
    fits.then_some(v as i64)
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(v) => Some(*v as f64),
        Value::Real(v) => Some(*v),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn to_timestamp(value: &Value) -> Option<Value> {
    match value {
        Value::Timestamp(_) => Some(value.clone()),
        Value::Integer(secs) => Utc
            .timestamp_opt(*secs, 0)
            .single()
            .map(|dt| Value::Timestamp(dt.with_timezone(&utc()))),
        Value::Text(s) => time_zone::parse_timestamp(s, utc())
            .ok()
            .map(Value::Timestamp),
        _ => None,
    }
}
