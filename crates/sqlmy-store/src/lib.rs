//! sqlmy Store - SQLite-backed database handle and repositories
//!
//! Provides:
//! - `Database`: connection lifecycle, nested transactions and query execution
//! - Table metadata with DDL rendering, and the application table models
//! - A process-wide shared handle
//! - Repositories for the `stock_data` and `logs` tables
//! - A tracing layer that writes log events into the `logs` table

pub mod database;
pub mod db;
pub mod errors;
pub mod log_handler;
pub mod models;
pub mod query;
pub mod repo;
pub mod schema;
pub mod shared;

// Re-export key types
pub use database::Database;
pub use errors::Result;
pub use query::{Params, QueryResult, Row};
pub use schema::{Column, MetaData, SqlType, Table};
pub use shared::{share, shared_database, SharedDatabase};
