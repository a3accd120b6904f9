//! sqlmy Core - helpers and ambient facilities
//!
//! This crate provides everything in sqlmy that does not touch a database
//! connection:
//! - Structured error facility (`ExError`, `ExErrorKind`, `SqlmyError`)
//! - Structured logging facility with boundary macros and test capture
//! - Layered configuration (`Settings`, `ConnectionConfig`)
//! - Engine URL parsing
//! - Time zone conversion centred on JST
//! - Tabular data conversion (`Frame`, `ColumnType`)
//! - A thread-safe one-time `Singleton` cell

pub mod config;
pub mod convert;
pub mod engine_url;
pub mod errors;
pub mod logging_facility;
pub mod singleton;
pub mod time_zone;
pub mod value;

pub use sqlmy_core_types::schema;

// Re-export commonly used types
pub use config::{ConnectionConfig, LoggingSettings, Settings};
pub use convert::{ColumnType, Frame};
pub use engine_url::{EngineUrl, SqliteTarget};
pub use errors::{ExError, ExErrorKind, Result, SqlmyError};
pub use singleton::Singleton;
pub use value::Value;
