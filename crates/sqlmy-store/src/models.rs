//! Application table models
//!
//! `stock_data` holds one price record per company, source and day; `logs`
//! holds application log records written by the database log layer.

use crate::errors::{bad_column, Result};
use crate::query::{Params, Row};
use crate::schema::{Column, MetaData, SqlType, Table};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlmy_core::errors::ExError;
use sqlmy_core::time_zone::{self, jst};
use sqlmy_core::Value;

pub const STOCK_DATA_TABLE: &str = "stock_data";
pub const LOGS_TABLE: &str = "logs";

pub fn stock_data_table() -> Table {
    Table::new(STOCK_DATA_TABLE)
        .column(Column::new("id", SqlType::Integer).primary_key().index())
        .column(Column::new("company_id", SqlType::Integer).not_null())
        .column(Column::new("source", SqlType::Varchar(Some(255))).not_null())
        .column(Column::new("date", SqlType::Date).not_null())
        .column(Column::new("open_price", SqlType::Float).not_null())
        .column(Column::new("close_price", SqlType::Float).not_null())
        .column(Column::new("high_price", SqlType::Float).not_null())
        .column(Column::new("low_price", SqlType::Float).not_null())
        .column(Column::new("volume", SqlType::Float).not_null())
        .column(Column::new("adjusted_close_price", SqlType::Float).not_null())
        .column(Column::new("dividend", SqlType::Float).not_null())
        .column(Column::new("split_coefficient", SqlType::Float).not_null())
        .column(Column::new("created_at", SqlType::DateTime { timezone: false }).not_null())
}

pub fn logs_table() -> Table {
    Table::new(LOGS_TABLE)
        .column(Column::new("id", SqlType::Integer).primary_key())
        .column(Column::new("timestamp", SqlType::DateTime { timezone: true }))
        .column(Column::new("log_level", SqlType::Varchar(Some(50))))
        .column(Column::new("message", SqlType::Text))
        .column(Column::new("source", SqlType::Varchar(Some(100))))
        .column(Column::new("thread_id", SqlType::Varchar(Some(50))))
        .column(Column::new("process_id", SqlType::Varchar(Some(50))))
        .column(Column::new("user_id", SqlType::Varchar(Some(100))))
        .column(Column::new("session_id", SqlType::Varchar(Some(100))))
        .column(Column::new("logger_name", SqlType::Varchar(Some(100))))
        .column(Column::new("stack_trace", SqlType::Text))
        .column(Column::new("ip_address", SqlType::Varchar(Some(50))))
        .column(Column::new("user_agent", SqlType::Varchar(Some(300))))
        .column(Column::new("environment", SqlType::Varchar(Some(50))))
        .column(Column::new("tags", SqlType::Varchar(Some(100))))
        .column(Column::new("additional_data", SqlType::Text))
}

/// Metadata holding `stock_data` and `logs`
pub fn metadata() -> MetaData {
    MetaData::new().table(stock_data_table()).table(logs_table())
}

/// One day of prices for one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockData {
    /// Assigned by the database on insert
    pub id: Option<i64>,
    pub company_id: i64,
    pub source: String,
    pub date: NaiveDate,
    pub open_price: f64,
    pub close_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub volume: f64,
    pub adjusted_close_price: f64,
    pub dividend: f64,
    pub split_coefficient: f64,
    pub created_at: DateTime<FixedOffset>,
}

impl StockData {
    pub(crate) fn to_params(&self) -> Params {
        Params::new()
            .with_value("company_id", self.company_id)
            .with_value("source", self.source.as_str())
            .with_value("date", self.date)
            .with_value("open_price", self.open_price)
            .with_value("close_price", self.close_price)
            .with_value("high_price", self.high_price)
            .with_value("low_price", self.low_price)
            .with_value("volume", self.volume)
            .with_value("adjusted_close_price", self.adjusted_close_price)
            .with_value("dividend", self.dividend)
            .with_value("split_coefficient", self.split_coefficient)
            .with_value("created_at", time_zone::to_jst(&self.created_at))
    }

    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        let read = RowReader::new(STOCK_DATA_TABLE, row);
        Ok(Self {
            id: Some(read.int("id")?),
            company_id: read.int("company_id")?,
            source: read.text("source")?,
            date: read.date("date")?,
            open_price: read.float("open_price")?,
            close_price: read.float("close_price")?,
            high_price: read.float("high_price")?,
            low_price: read.float("low_price")?,
            volume: read.float("volume")?,
            adjusted_close_price: read.float("adjusted_close_price")?,
            dividend: read.float("dividend")?,
            split_coefficient: read.float("split_coefficient")?,
            created_at: read.timestamp("created_at")?,
        })
    }
}

/// One application log record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Assigned by the database on insert
    pub id: Option<i64>,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub log_level: Option<String>,
    pub message: Option<String>,
    pub source: Option<String>,
    pub thread_id: Option<String>,
    pub process_id: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub logger_name: Option<String>,
    pub stack_trace: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub environment: Option<String>,
    pub tags: Option<String>,
    pub additional_data: Option<String>,
}

impl LogEntry {
    /// An entry stamped with the current time in Japan
    pub fn new(log_level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Some(time_zone::current_japan_time()),
            log_level: Some(log_level.into()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    // Timestamps are stored as RFC 3339 text in JST so they sort by time.
    pub(crate) fn to_params(&self) -> Params {
        // An unset timestamp defaults to now, as the column default would.
        let timestamp = self
            .timestamp
            .map(|ts| time_zone::to_jst(&ts))
            .unwrap_or_else(time_zone::current_japan_time);
        Params::new()
            .with_value("timestamp", timestamp)
            .with_value("log_level", self.log_level.clone())
            .with_value("message", self.message.clone())
            .with_value("source", self.source.clone())
            .with_value("thread_id", self.thread_id.clone())
            .with_value("process_id", self.process_id.clone())
            .with_value("user_id", self.user_id.clone())
            .with_value("session_id", self.session_id.clone())
            .with_value("logger_name", self.logger_name.clone())
            .with_value("stack_trace", self.stack_trace.clone())
            .with_value("ip_address", self.ip_address.clone())
            .with_value("user_agent", self.user_agent.clone())
            .with_value("environment", self.environment.clone())
            .with_value("tags", self.tags.clone())
            .with_value("additional_data", self.additional_data.clone())
    }

    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        let read = RowReader::new(LOGS_TABLE, row);
        Ok(Self {
            id: Some(read.int("id")?),
            timestamp: read.optional_timestamp("timestamp")?,
            log_level: read.optional_text("log_level")?,
            message: read.optional_text("message")?,
            source: read.optional_text("source")?,
            thread_id: read.optional_text("thread_id")?,
            process_id: read.optional_text("process_id")?,
            user_id: read.optional_text("user_id")?,
            session_id: read.optional_text("session_id")?,
            logger_name: read.optional_text("logger_name")?,
            stack_trace: read.optional_text("stack_trace")?,
            ip_address: read.optional_text("ip_address")?,
            user_agent: read.optional_text("user_agent")?,
            environment: read.optional_text("environment")?,
            tags: read.optional_text("tags")?,
            additional_data: read.optional_text("additional_data")?,
        })
    }
}

/// Typed access to the named columns of a row
struct RowReader<'a> {
    table: &'static str,
    row: &'a Row,
}

impl<'a> RowReader<'a> {
    fn new(table: &'static str, row: &'a Row) -> Self {
        Self { table, row }
    }

    fn value(&self, column: &str) -> Result<&'a Value> {
        self.row
            .get_named(column)
            .ok_or_else(|| bad_column(self.table, column, "column missing from result"))
    }

    fn mismatch(&self, column: &str, expected: &str, found: &Value) -> ExError {
        bad_column(
            self.table,
            column,
            format!("expected {}, found {}", expected, found.type_name()),
        )
    }

    fn int(&self, column: &str) -> Result<i64> {
        let value = self.value(column)?;
        value
            .as_i64()
            .ok_or_else(|| self.mismatch(column, "integer", value))
    }

    fn float(&self, column: &str) -> Result<f64> {
        let value = self.value(column)?;
        value
            .as_f64()
            .ok_or_else(|| self.mismatch(column, "real", value))
    }

    fn text(&self, column: &str) -> Result<String> {
        let value = self.value(column)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.mismatch(column, "text", value))
    }

    fn optional_text(&self, column: &str) -> Result<Option<String>> {
        match self.value(column)? {
            Value::Null => Ok(None),
            _ => self.text(column).map(Some),
        }
    }

    fn date(&self, column: &str) -> Result<NaiveDate> {
        let text = self.text(column)?;
        NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map_err(|e| bad_column(self.table, column, e.to_string()))
    }

    fn timestamp(&self, column: &str) -> Result<DateTime<FixedOffset>> {
        let text = self.text(column)?;
        time_zone::parse_timestamp(&text, jst())
            .map_err(|e| bad_column(self.table, column, e.to_string()))
    }

    fn optional_timestamp(&self, column: &str) -> Result<Option<DateTime<FixedOffset>>> {
        match self.value(column)? {
            Value::Null => Ok(None),
            _ => self.timestamp(column).map(Some),
        }
    }
}
