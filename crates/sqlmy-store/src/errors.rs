//! Error handling for sqlmy-store
//!
//! Wraps sqlmy-core ExError with store-specific helpers

use sqlmy_core::errors::{ExError, ExErrorKind, SqlmyError};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Convert an error raised by a sqlmy-core helper
pub fn from_core(err: SqlmyError) -> ExError {
    err.into()
}

/// The handle has no open connection
pub fn not_connected(operation: &str) -> ExError {
    ExError::new(ExErrorKind::ConnectionNotInitialized)
        .with_op(operation.to_string())
        .with_message("Connection is not initialized.")
}

/// A commit or rollback was requested with no open transaction
pub fn transaction_not_started(operation: &str) -> ExError {
    ExError::new(ExErrorKind::TransactionNotStarted)
        .with_op(operation.to_string())
        .with_message("Transaction is not started.")
}

pub fn table_missing(table: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("drop_table")
        .with_table(table.to_string())
        .with_message(format!("Table {} does not exist.", table))
}

pub fn no_repository(table: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("get_repository")
        .with_table(table.to_string())
        .with_message(format!("No repository found for table: {}", table))
}

/// A thread panicked while holding the shared handle
pub fn lock_poisoned(operation: &str) -> ExError {
    ExError::new(ExErrorKind::Concurrency)
        .with_op(operation.to_string())
        .with_message("Database lock poisoned by a panicked thread")
}

/// A stored value does not have the shape a model expects
pub fn bad_column(table: &str, column: &str, reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Conversion)
        .with_op("from_row")
        .with_table(table.to_string())
        .with_column(column.to_string())
        .with_message(reason)
}
