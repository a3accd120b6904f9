use super::sql_type::{coerce_value, ColumnType};
use crate::errors::{Result, SqlmyError};
use crate::time_zone;
use crate::value::Value;
use chrono::FixedOffset;
use std::collections::{BTreeMap, HashSet};

/// An in-memory table: ordered, unique column names plus rows of values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    /// An empty frame with the given columns
    ///
    /// # Errors
    ///
    /// `DuplicateColumn` if a name appears twice.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        check_unique(&columns)?;
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// A frame with the given columns and rows
    ///
    /// # Errors
    ///
    /// `DuplicateColumn` for repeated names, `RowWidthMismatch` for a row
    /// whose length differs from the column count.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut frame = Self::new(columns)?;
        for row in rows {
            frame.push_row(row)?;
        }
        Ok(frame)
    }

    /// Append a row
    ///
    /// # Errors
    ///
    /// `RowWidthMismatch` if the row length differs from the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(SqlmyError::RowWidthMismatch {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom
    ///
    /// # Errors
    ///
    /// `ColumnNotFound` if there is no such column.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let index = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Rename columns; keys that name no column are ignored
    ///
    /// # Errors
    ///
    /// `DuplicateColumn` if the renamed columns are not unique.
    pub fn rename_columns(&self, mapping: &BTreeMap<String, String>) -> Result<Self> {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| mapping.get(c).cloned().unwrap_or_else(|| c.clone()))
            .collect();
        check_unique(&columns)?;
        Ok(Self {
            columns,
            rows: self.rows.clone(),
        })
    }

    /// Keep only `names`, in that order
    ///
    /// # Errors
    ///
    /// `ColumnNotFound` for an unknown name, `DuplicateColumn` for a repeated one.
    pub fn select_columns(&self, names: &[&str]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>>>()?;
        let columns: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        check_unique(&columns)?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Self { columns, rows })
    }

    /// Convert every value of one column to `target`
    ///
    /// # Errors
    ///
    /// `ColumnNotFound`, or `CoercionFailed` naming the first value that
    /// cannot be converted.
    pub fn coerce_column(&self, name: &str, target: ColumnType) -> Result<Self> {
        let index = self.require_column(name)?;
        let mut out = self.clone();
        for (row_index, row) in out.rows.iter_mut().enumerate() {
            let coerced =
                coerce_value(&row[index], target).ok_or_else(|| SqlmyError::CoercionFailed {
                    column: name.to_string(),
                    row: row_index,
                    value: row[index].to_string(),
                    target: target.to_string(),
                })?;
            row[index] = coerced;
        }
        Ok(out)
    }

    /// Apply `coerce_column` for each `(column, type)` pair in order
    ///
    /// # Errors
    ///
    /// The first error of any single coercion.
    pub fn coerce_columns(&self, types: &[(&str, ColumnType)]) -> Result<Self> {
        let mut out = self.clone();
        for (name, target) in types {
            out = out.coerce_column(name, *target)?;
        }
        Ok(out)
    }

    /// Coerce columns given SQL type names such as `INTEGER` or `VARCHAR`
    ///
    /// # Errors
    ///
    /// `UnsupportedSqlType` before any data is touched, then the errors of
    /// `coerce_columns`.
    pub fn coerce_sql_types(&self, sql_types: &[(&str, &str)]) -> Result<Self> {
        let types = sql_types
            .iter()
            .map(|(name, sql_type)| Ok((*name, ColumnType::from_sql_type(sql_type)?)))
            .collect::<Result<Vec<_>>>()?;
        self.coerce_columns(&types)
    }

    /// Shift a timestamp column to `offset`, keeping each instant
    ///
    /// Text cells are parsed first; naive text is read as UTC.
    ///
    /// # Errors
    ///
    /// `ColumnNotFound`, or `CoercionFailed` for a cell that is not a timestamp.
    pub fn convert_timezone(&self, name: &str, offset: FixedOffset) -> Result<Self> {
        let mut out = self.coerce_column(name, ColumnType::DateTime)?;
        let index = self.require_column(name)?;
        for row in &mut out.rows {
            if let Value::Timestamp(dt) = &row[index] {
                row[index] = Value::Timestamp(time_zone::convert(dt, offset));
            }
        }
        Ok(out)
    }

    fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| SqlmyError::ColumnNotFound {
                column: name.to_string(),
            })
    }
}

fn check_unique(columns: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(SqlmyError::DuplicateColumn {
                column: column.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_zone::jst;

    fn prices() -> Frame {
        Frame::from_rows(
            ["code", "close", "traded_at"],
            vec![
                vec![Value::from("7203"), Value::from("2500.5"), Value::from("2024-04-01 06:00:00")],
                vec![Value::from("6758"), Value::Integer(13000), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_duplicate_columns() {
        let err = Frame::new(["a", "b", "a"]).unwrap_err();
        assert_eq!(err, SqlmyError::DuplicateColumn { column: "a".into() });
    }

    #[test]
    fn test_push_row_checks_width() {
        let mut frame = Frame::new(["a", "b"]).unwrap();
        let err = frame.push_row(vec![Value::Integer(1)]).unwrap_err();
        assert!(matches!(err, SqlmyError::RowWidthMismatch { row: 0, expected: 2, actual: 1 }));
    }

    #[test]
    fn test_rename_ignores_unknown_keys() {
        let mapping = BTreeMap::from([
            ("close".to_string(), "close_price".to_string()),
            ("missing".to_string(), "whatever".to_string()),
        ]);
        let renamed = prices().rename_columns(&mapping).unwrap();
        assert_eq!(renamed.columns(), ["code", "close_price", "traded_at"]);
        assert_eq!(renamed.rows(), prices().rows());
    }

    #[test]
    fn test_rename_to_existing_name_fails() {
        let mapping = BTreeMap::from([("close".to_string(), "code".to_string())]);
        let err = prices().rename_columns(&mapping).unwrap_err();
        assert!(matches!(err, SqlmyError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_select_columns_reorders() {
        let selected = prices().select_columns(&["close", "code"]).unwrap();
        assert_eq!(selected.columns(), ["close", "code"]);
        assert_eq!(selected.rows()[1][1], Value::from("6758"));

        let err = prices().select_columns(&["nope"]).unwrap_err();
        assert_eq!(err, SqlmyError::ColumnNotFound { column: "nope".into() });
    }

    #[test]
    fn test_coerce_sql_types() {
        let coerced = prices()
            .coerce_sql_types(&[("code", "INTEGER"), ("close", "FLOAT"), ("traded_at", "DATETIME")])
            .unwrap();
        assert_eq!(coerced.rows()[0][0], Value::Integer(7203));
        assert_eq!(coerced.rows()[1][1], Value::Real(13000.0));
        assert!(coerced.rows()[0][2].as_timestamp().is_some());
        assert!(coerced.rows()[1][2].is_null());
    }

    #[test]
    fn test_coerce_failure_names_cell() {
        let err = prices().coerce_column("close", ColumnType::Int64).unwrap_err();
        match err {
            SqlmyError::CoercionFailed { column, row, value, target } => {
                assert_eq!(column, "close");
                assert_eq!(row, 0);
                assert_eq!(value, "'2500.5'");
                assert_eq!(target, "Int64");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_sql_type_fails_before_coercion() {
        let err = prices().coerce_sql_types(&[("code", "BLOB")]).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported sql type: BLOB");
    }

    #[test]
    fn test_convert_timezone_to_jst() {
        let converted = prices().convert_timezone("traded_at", jst()).unwrap();
        let ts = converted.rows()[0][2].as_timestamp().unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-04-01T15:00:00+09:00");
        assert!(converted.rows()[1][2].is_null());
        assert_eq!(converted.len(), 2);
    }
}
