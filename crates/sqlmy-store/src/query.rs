//! Query parameters and results
//!
//! Parameters are named and bound to `:name` placeholders. Results come back
//! in one of three shapes, chosen by the statement: rows for statements that
//! produce a result set, the new row id for `INSERT`, and the number of
//! affected rows for everything else.

use crate::errors::{from_core, Result};
use rusqlite::types::{Value as SqlValue, ValueRef};
use sqlmy_core::errors::{ExError, ExErrorKind};
use sqlmy_core::{Frame, Value};
use std::collections::BTreeMap;
use std::ops::Index;
use std::sync::Arc;

/// Named parameter bindings for a query
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params {
    values: BTreeMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value; a leading `:` on the name is optional
    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        let name = name.strip_prefix(':').unwrap_or(name);
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(":name", value)` pairs ready for binding
    pub(crate) fn to_bindings(&self) -> Vec<(String, SqlValue)> {
        self.values
            .iter()
            .map(|(name, value)| (format!(":{}", name), to_sql_value(value)))
            .collect()
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name.as_ref(), value);
        }
        params
    }
}

/// One row of a result set
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of the named column
    pub fn get_named(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Index<usize> for Row {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

/// Outcome of `Database::execute_query`
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Rows { columns: Vec<String>, rows: Vec<Row> },
    LastInsertId(i64),
    RowsAffected(usize),
}

impl QueryResult {
    /// The rows of a result set
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the statement did not produce a result set.
    pub fn into_rows(self) -> Result<Vec<Row>> {
        match self {
            QueryResult::Rows { rows, .. } => Ok(rows),
            other => Err(unexpected_shape("rows", &other)),
        }
    }

    /// The id of the row an `INSERT` created
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the statement was not an `INSERT`.
    pub fn last_insert_id(&self) -> Result<i64> {
        match self {
            QueryResult::LastInsertId(id) => Ok(*id),
            other => Err(unexpected_shape("last insert id", other)),
        }
    }

    /// The number of rows an `UPDATE`/`DELETE` touched
    ///
    /// # Errors
    ///
    /// `InvalidInput` for any other shape.
    pub fn rows_affected(&self) -> Result<usize> {
        match self {
            QueryResult::RowsAffected(n) => Ok(*n),
            other => Err(unexpected_shape("affected row count", other)),
        }
    }

    /// Convert a result set into a `Frame`
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the statement did not produce a result set, or
    /// `DuplicateColumn` if the result set repeats a column name.
    pub fn into_frame(self) -> Result<Frame> {
        match self {
            QueryResult::Rows { columns, rows } => {
                let rows = rows.into_iter().map(Row::into_values).collect();
                Frame::from_rows(columns, rows).map_err(from_core)
            }
            other => Err(unexpected_shape("rows", &other)),
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            QueryResult::Rows { .. } => "rows",
            QueryResult::LastInsertId(_) => "last insert id",
            QueryResult::RowsAffected(_) => "affected row count",
        }
    }
}

fn unexpected_shape(expected: &str, actual: &QueryResult) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("query_result")
        .with_message(format!(
            "Expected {} but the statement returned {}",
            expected,
            actual.shape()
        ))
}

/// Convert a cell value for binding; timestamps bind as RFC 3339 text
pub(crate) fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Real(v) => SqlValue::Real(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Blob(v) => SqlValue::Blob(v.clone()),
        Value::Timestamp(v) => SqlValue::Text(v.to_rfc3339()),
    }
}

pub(crate) fn from_sql_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Blob(v.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_params_strip_colon() {
        let params = Params::new().with_value(":name", "Test").with_value("id", 1);
        assert_eq!(params.get("name"), Some(&Value::from("Test")));
        let bindings = params.to_bindings();
        assert_eq!(bindings[0].0, ":id");
        assert_eq!(bindings[1].0, ":name");
    }

    #[test]
    fn test_params_from_iter() {
        let params: Params = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_timestamp_binds_as_text() {
        let ts = DateTime::parse_from_rfc3339("2024-01-01T09:00:00+09:00").unwrap();
        assert_eq!(
            to_sql_value(&Value::Timestamp(ts)),
            SqlValue::Text("2024-01-01T09:00:00+09:00".to_string())
        );
    }

    #[test]
    fn test_row_lookup() {
        let columns: Arc<[String]> = vec!["id".to_string(), "name".to_string()].into();
        let row = Row::new(columns, vec![Value::Integer(1), Value::from("Test1")]);
        assert_eq!(row[1], Value::from("Test1"));
        assert_eq!(row.get_named("id"), Some(&Value::Integer(1)));
        assert_eq!(row.get_named("missing"), None);
    }

    #[test]
    fn test_shape_mismatch_is_invalid_input() {
        let err = QueryResult::RowsAffected(3).into_rows().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert_eq!(QueryResult::RowsAffected(3).rows_affected().unwrap(), 3);
    }
}
