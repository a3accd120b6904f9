//! Database handle
//!
//! A `Database` owns an engine (the source of connections for one engine
//! URL), at most one checked-out connection, and a stack of open
//! transactions. The bottom of the stack is a root `BEGIN` transaction;
//! every frame above it is a savepoint named `sp_{depth}`.
//!
//! The engine keeps the connection when the handle disconnects, so an
//! in-memory database outlives `disconnect`/`connect`. Work left uncommitted
//! at disconnect is rolled back.
//!
//! ## Logging
//!
//! Lifecycle operations (`connect`, `disconnect`, `create_database`,
//! `create_tables`, `drop_table`) log start/end boundaries; transactions and
//! queries log at debug level.

use crate::db;
use crate::errors::{
    from_core, from_rusqlite, io_error, not_connected, table_missing, transaction_not_started,
    Result,
};
use crate::query::{from_sql_ref, Params, QueryResult, Row};
use crate::schema::{quote_identifier, MetaData};
use rusqlite::types::ToSql;
use rusqlite::Connection;
use sqlmy_core::errors::SqlmyError;
use sqlmy_core::{log_op_end, log_op_error, log_op_start};
use sqlmy_core::{ConnectionConfig, EngineUrl, Frame, SqliteTarget};
use std::sync::Arc;
use std::time::Instant;

/// Connection source for one engine URL, holding at most one idle connection
#[derive(Debug)]
struct Engine {
    target: SqliteTarget,
    idle: Option<Connection>,
}

impl Engine {
    fn new(url: &EngineUrl) -> Result<Self> {
        let target = url.sqlite_target().ok_or_else(|| {
            from_core(SqlmyError::UnsupportedDialect {
                dialect: url.dialect().to_string(),
            })
        })?;
        Ok(Self { target, idle: None })
    }

    fn checkout(&mut self) -> Result<Connection> {
        match self.idle.take() {
            Some(conn) => Ok(conn),
            None => db::open_target(&self.target),
        }
    }

    fn checkin(&mut self, conn: Connection) {
        self.idle = Some(conn);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TransactionFrame {
    Root,
    Savepoint(String),
}

impl TransactionFrame {
    fn begin_sql(&self) -> String {
        match self {
            TransactionFrame::Root => "BEGIN".to_string(),
            TransactionFrame::Savepoint(name) => format!("SAVEPOINT {}", name),
        }
    }

    fn commit_sql(&self) -> String {
        match self {
            TransactionFrame::Root => "COMMIT".to_string(),
            TransactionFrame::Savepoint(name) => format!("RELEASE SAVEPOINT {}", name),
        }
    }

    // A savepoint stays on SQLite's stack after ROLLBACK TO, so release it too.
    fn rollback_sql(&self) -> String {
        match self {
            TransactionFrame::Root => "ROLLBACK".to_string(),
            TransactionFrame::Savepoint(name) => {
                format!("ROLLBACK TO SAVEPOINT {0}; RELEASE SAVEPOINT {0}", name)
            }
        }
    }
}

/// A database handle
#[derive(Debug)]
pub struct Database {
    metadata: MetaData,
    url: EngineUrl,
    engine: Engine,
    connection: Option<Connection>,
    transactions: Vec<TransactionFrame>,
}

impl Database {
    /// Create a handle for `engine_url` without connecting
    ///
    /// # Errors
    ///
    /// `InvalidUrl` for a malformed URL, `UnsupportedDialect` for a dialect
    /// with no backing driver.
    pub fn new(metadata: MetaData, engine_url: &str) -> Result<Self> {
        let url = EngineUrl::parse(engine_url).map_err(from_core)?;
        Self::with_url(metadata, url)
    }

    /// Create a handle from configuration values without connecting
    ///
    /// # Errors
    ///
    /// As for `new`.
    pub fn from_config(metadata: MetaData, config: &ConnectionConfig) -> Result<Self> {
        let url = config.engine_url().map_err(from_core)?;
        Self::with_url(metadata, url)
    }

    /// Create a handle for an already parsed URL without connecting
    ///
    /// # Errors
    ///
    /// `UnsupportedDialect` for a dialect with no backing driver.
    pub fn with_url(metadata: MetaData, url: EngineUrl) -> Result<Self> {
        let engine = Engine::new(&url)?;
        tracing::debug!(url = %url, "created database engine");
        Ok(Self {
            metadata,
            url,
            engine,
            connection: None,
            transactions: Vec::new(),
        })
    }

    /// Create a handle and connect it
    ///
    /// # Errors
    ///
    /// As for `new`, plus `Persistence` when the database cannot be opened.
    pub fn open(metadata: MetaData, engine_url: &str) -> Result<Self> {
        let mut database = Self::new(metadata, engine_url)?;
        database.connect()?;
        Ok(database)
    }

    pub fn metadata(&self) -> &MetaData {
        &self.metadata
    }

    pub fn url(&self) -> &EngineUrl {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Number of open transactions, the root included
    pub fn transaction_depth(&self) -> usize {
        self.transactions.len()
    }

    pub fn in_transaction(&self) -> bool {
        !self.transactions.is_empty()
    }

    /// Check a connection out of the engine; no-op if already connected
    ///
    /// # Errors
    ///
    /// `Persistence` when the database cannot be opened.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        self.with_boundary("connect", |db| {
            let conn = db.engine.checkout()?;
            db.connection = Some(conn);
            Ok(())
        })
    }

    /// Return the connection to the engine, rolling back open transactions
    ///
    /// No-op if not connected.
    ///
    /// # Errors
    ///
    /// `Persistence` when the rollback fails; the connection is discarded.
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }
        self.with_boundary("disconnect", |db| {
            let Some(conn) = db.connection.take() else {
                return Ok(());
            };
            db.transactions.clear();
            if !conn.is_autocommit() {
                tracing::debug!("rolling back uncommitted work on disconnect");
                conn.execute_batch("ROLLBACK").map_err(from_rusqlite)?;
            }
            db.engine.checkin(conn);
            Ok(())
        })
    }

    /// Ensure the database exists, then connect
    ///
    /// For a file-backed database this creates the parent directory.
    ///
    /// # Errors
    ///
    /// `Io` when the directory cannot be created, `Persistence` when the
    /// database cannot be opened.
    pub fn create_database(&mut self) -> Result<()> {
        self.with_boundary("create_database", |db| {
            if let SqliteTarget::File(path) = &db.engine.target {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| io_error("create_database", e))?;
                }
            }
            db.connect()
        })
    }

    /// Create every table and index in the metadata that does not exist yet
    ///
    /// # Errors
    ///
    /// `Persistence` when a statement fails.
    pub fn create_tables(&mut self) -> Result<()> {
        self.with_boundary("create_tables", |db| {
            db.connect()?;
            let conn = db.conn("create_tables")?;
            for statement in db.metadata.create_all_sql() {
                conn.execute_batch(&statement).map_err(from_rusqlite)?;
            }
            tracing::debug!(tables = db.metadata.tables().len(), "created tables");
            Ok(())
        })
    }

    /// Whether a table named `name` exists; connects if needed
    ///
    /// # Errors
    ///
    /// `Persistence` when the catalogue cannot be read.
    pub fn exists_table(&mut self, name: &str) -> Result<bool> {
        self.connect()?;
        let count: i64 = self
            .conn("exists_table")?
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;
        Ok(count > 0)
    }

    /// Drop an existing table
    ///
    /// # Errors
    ///
    /// `NotFound` ("Table {name} does not exist.") if there is no such table.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        self.with_boundary("drop_table", |db| {
            if !db.exists_table(name)? {
                return Err(table_missing(name));
            }
            db.conn("drop_table")?
                .execute_batch(&format!("DROP TABLE {}", quote_identifier(name)))
                .map_err(|e| from_rusqlite(e).with_table(name))
        })
    }

    /// Begin a root transaction; no-op if one is already open
    ///
    /// # Errors
    ///
    /// `Persistence` when connecting or `BEGIN` fails.
    pub fn start_transaction(&mut self) -> Result<()> {
        self.connect()?;
        if self.in_transaction() {
            return Ok(());
        }
        self.begin("start_transaction", TransactionFrame::Root)
    }

    /// Open a savepoint inside the current transaction
    ///
    /// # Errors
    ///
    /// `ConnectionNotInitialized` without a connection,
    /// `TransactionNotStarted` without an open transaction.
    pub fn start_nested_transaction(&mut self) -> Result<()> {
        self.conn("start_nested_transaction")?;
        if !self.in_transaction() {
            return Err(transaction_not_started("start_nested_transaction"));
        }
        let name = format!("sp_{}", self.transactions.len());
        self.begin("start_nested_transaction", TransactionFrame::Savepoint(name))
    }

    /// Commit the innermost transaction
    ///
    /// If `COMMIT` fails and SQLite keeps the transaction open (a deferred
    /// foreign key violation, `SQLITE_BUSY`), the frame stays open too and
    /// can still be rolled back.
    ///
    /// # Errors
    ///
    /// `TransactionNotStarted` when none is open, `Persistence` when the
    /// statement fails.
    pub fn commit_transaction(&mut self) -> Result<()> {
        self.end_transaction("commit_transaction", TransactionFrame::commit_sql)
    }

    /// Roll back the innermost transaction
    ///
    /// # Errors
    ///
    /// `TransactionNotStarted` when none is open, `Persistence` when the
    /// statement fails.
    pub fn rollback_transaction(&mut self) -> Result<()> {
        self.end_transaction("rollback_transaction", TransactionFrame::rollback_sql)
    }

    /// Run `f` in a transaction, nested if one is already open
    ///
    /// Commits when `f` returns `Ok` and rolls back when it returns `Err`.
    ///
    /// # Errors
    ///
    /// The error of `f`, or of opening/committing the transaction.
    pub fn run_in_transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if self.in_transaction() {
            self.start_nested_transaction()?;
        } else {
            self.start_transaction()?;
        }
        let depth = self.transactions.len();

        match f(self) {
            Ok(value) => {
                if self.transactions.len() != depth {
                    return Ok(value);
                }
                match self.commit_transaction() {
                    Ok(()) => Ok(value),
                    Err(commit_err) => {
                        if self.transactions.len() == depth {
                            if let Err(rollback_err) = self.rollback_transaction() {
                                tracing::warn!(error = %rollback_err, "rollback after failed commit failed");
                            }
                        }
                        Err(commit_err)
                    }
                }
            }
            Err(err) => {
                // A failed query has already rolled this frame back.
                if self.transactions.len() == depth {
                    if let Err(rollback_err) = self.rollback_transaction() {
                        tracing::warn!(error = %rollback_err, "rollback after failure failed");
                    }
                }
                Err(err)
            }
        }
    }

    /// Execute one statement with named parameters (`:name`)
    ///
    /// On failure the innermost open transaction is rolled back before the
    /// error is returned. Every parameter must appear in the statement.
    ///
    /// # Errors
    ///
    /// `ConnectionNotInitialized` without a connection, `Persistence` for
    /// any error raised by SQLite.
    pub fn execute_query(&mut self, sql: &str, params: &Params) -> Result<QueryResult> {
        let conn = self.conn("execute_query")?;
        tracing::debug!(sql = %sql, params = params.len(), "execute query");

        match run_statement(conn, sql, params) {
            Ok(result) => Ok(result),
            Err(err) => {
                tracing::debug!(error = %err, "query failed");
                if self.in_transaction() {
                    if let Err(rollback_err) = self.rollback_transaction() {
                        tracing::warn!(error = %rollback_err, "rollback after failed query failed");
                    }
                }
                Err(err.with_op("execute_query"))
            }
        }
    }

    /// Insert every row of `frame` into `table` in one transaction
    ///
    /// Frame columns are matched to table columns by name.
    ///
    /// # Errors
    ///
    /// As for `execute_query`; no rows are kept when any row fails.
    pub fn insert_frame(&mut self, table: &str, frame: &Frame) -> Result<usize> {
        let columns: Vec<String> = frame.columns().iter().map(|c| quote_identifier(c)).collect();
        let placeholders: Vec<String> = (0..columns.len()).map(|i| format!(":p{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            columns.join(", "),
            placeholders.join(", ")
        );

        self.run_in_transaction(|db| {
            for row in frame.rows() {
                let params: Params = placeholders.iter().zip(row.iter().cloned()).collect();
                db.execute_query(&sql, &params)?;
            }
            Ok(frame.len())
        })
        .map_err(|e| e.with_table(table))
    }

    /// Run a query and collect its result set into a `Frame`
    ///
    /// # Errors
    ///
    /// As for `execute_query`, plus `InvalidInput` if the statement
    /// returns no result set.
    pub fn read_frame(&mut self, sql: &str, params: &Params) -> Result<Frame> {
        self.execute_query(sql, params)?.into_frame()
    }

    fn conn(&self, operation: &str) -> Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| not_connected(operation))
    }

    fn begin(&mut self, op: &'static str, frame: TransactionFrame) -> Result<()> {
        tracing::debug!(depth = self.transactions.len() + 1, "begin transaction");
        self.conn(op)?
            .execute_batch(&frame.begin_sql())
            .map_err(|e| from_rusqlite(e).with_op(op))?;
        self.transactions.push(frame);
        Ok(())
    }

    // The frame is popped once SQLite has ended it, never before.
    fn end_transaction(
        &mut self,
        op: &'static str,
        sql: fn(&TransactionFrame) -> String,
    ) -> Result<()> {
        let frame = self
            .transactions
            .last()
            .cloned()
            .ok_or_else(|| transaction_not_started(op))?;
        tracing::debug!(depth = self.transactions.len(), "end transaction");
        let conn = self.conn(op)?;
        let outcome = conn.execute_batch(&sql(&frame));
        let ended = outcome.is_ok() || (frame == TransactionFrame::Root && conn.is_autocommit());
        if ended {
            self.transactions.pop();
        }
        outcome.map_err(|e| from_rusqlite(e).with_op(op))
    }

    fn with_boundary<T, F>(&mut self, op: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        log_op_start!(op);
        let start = Instant::now();

        let result = f(self).map_err(|e| {
            let e = e.with_op(op);
            log_op_error!(op, e.clone(), duration_ms = start.elapsed().as_millis() as u64);
            e
        })?;

        log_op_end!(op, duration_ms = start.elapsed().as_millis() as u64);
        Ok(result)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(err) = self.disconnect() {
            tracing::warn!(error = %err, "disconnect on drop failed");
        }
    }
}

fn run_statement(conn: &Connection, sql: &str, params: &Params) -> Result<QueryResult> {
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    let bindings = params.to_bindings();
    let bound: Vec<(&str, &dyn ToSql)> = bindings
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect();

    if stmt.column_count() > 0 {
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let shared: Arc<[String]> = columns.clone().into();
        let mut rows = stmt.query(bound.as_slice()).map_err(from_rusqlite)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(from_rusqlite)? {
            let values = (0..shared.len())
                .map(|i| row.get_ref(i).map(from_sql_ref))
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(from_rusqlite)?;
            out.push(Row::new(shared.clone(), values));
        }
        return Ok(QueryResult::Rows { columns, rows: out });
    }

    let changed = stmt.execute(bound.as_slice()).map_err(from_rusqlite)?;
    if is_insert(sql) {
        Ok(QueryResult::LastInsertId(conn.last_insert_rowid()))
    } else {
        Ok(QueryResult::RowsAffected(changed))
    }
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case("INSERT"))
}
