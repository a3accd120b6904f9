use crate::database::Database;
use crate::errors::Result;
use crate::models::{logs_table, LogEntry};
use crate::query::Params;
use crate::schema::Table;
use crate::shared::{lock, SharedDatabase};

const INSERT_SQL: &str = "INSERT INTO logs (
        timestamp, log_level, message, source, thread_id, process_id, user_id,
        session_id, logger_name, stack_trace, ip_address, user_agent, environment,
        tags, additional_data
    ) VALUES (
        :timestamp, :log_level, :message, :source, :thread_id, :process_id, :user_id,
        :session_id, :logger_name, :stack_trace, :ip_address, :user_agent, :environment,
        :tags, :additional_data
    )";

const SELECT_COLUMNS: &str = "SELECT id, timestamp, log_level, message, source, thread_id,
        process_id, user_id, session_id, logger_name, stack_trace, ip_address, user_agent,
        environment, tags, additional_data FROM logs";

/// Write one entry on an already locked handle
pub(crate) fn insert_entry(db: &mut Database, entry: &LogEntry) -> Result<i64> {
    db.connect()?;
    db.run_in_transaction(|db| {
        db.execute_query(INSERT_SQL, &entry.to_params())?
            .last_insert_id()
    })
}

/// Repository over the `logs` table
#[derive(Debug, Clone)]
pub struct LogDataRepository {
    database: SharedDatabase,
    table: Table,
}

impl LogDataRepository {
    pub fn new(database: SharedDatabase) -> Self {
        Self {
            database,
            table: logs_table(),
        }
    }

    pub fn database(&self) -> &SharedDatabase {
        &self.database
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Insert one entry and return its id
    ///
    /// # Errors
    ///
    /// `Persistence` when the insert fails.
    pub fn insert(&self, entry: &LogEntry) -> Result<i64> {
        let mut db = lock(&self.database)?;
        insert_entry(&mut db, entry)
    }

    /// The `limit` most recent entries, newest first
    ///
    /// # Errors
    ///
    /// `Persistence` when the query fails, `Conversion` for malformed rows.
    pub fn recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let sql = format!("{} ORDER BY timestamp DESC, id DESC LIMIT :limit", SELECT_COLUMNS);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.select(&sql, &Params::new().with_value("limit", limit))
    }

    /// Entries at `level` (`INFO`, `ERROR`, ...), oldest first
    ///
    /// # Errors
    ///
    /// As for `recent`.
    pub fn find_by_level(&self, level: &str) -> Result<Vec<LogEntry>> {
        let sql = format!("{} WHERE log_level = :level ORDER BY timestamp, id", SELECT_COLUMNS);
        self.select(&sql, &Params::new().with_value("level", level))
    }

    /// Entries whose message contains `fragment`, oldest first
    ///
    /// # Errors
    ///
    /// As for `recent`.
    pub fn find_by_message(&self, fragment: &str) -> Result<Vec<LogEntry>> {
        let sql = format!(
            "{} WHERE instr(message, :fragment) > 0 ORDER BY timestamp, id",
            SELECT_COLUMNS
        );
        self.select(&sql, &Params::new().with_value("fragment", fragment))
    }

    fn select(&self, sql: &str, params: &Params) -> Result<Vec<LogEntry>> {
        let mut db = lock(&self.database)?;
        db.connect()?;
        db.execute_query(sql, params)?
            .into_rows()?
            .iter()
            .map(LogEntry::from_row)
            .collect()
    }
}
