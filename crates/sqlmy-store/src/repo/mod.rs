//! Repositories over the application tables
//!
//! Each repository is bound to a shared database handle and locks it for
//! the duration of one call.

pub mod factory;
pub mod log_data;
pub mod stock_data;

pub use factory::RepositoryFactory;
pub use log_data::LogDataRepository;
pub use stock_data::StockDataRepository;

use crate::schema::Table;
use crate::shared::SharedDatabase;

/// A repository returned by `RepositoryFactory`
#[derive(Debug, Clone)]
pub enum TableRepository {
    StockData(StockDataRepository),
    LogData(LogDataRepository),
}

impl TableRepository {
    pub fn table(&self) -> &Table {
        match self {
            TableRepository::StockData(repo) => repo.table(),
            TableRepository::LogData(repo) => repo.table(),
        }
    }

    pub fn database(&self) -> &SharedDatabase {
        match self {
            TableRepository::StockData(repo) => repo.database(),
            TableRepository::LogData(repo) => repo.database(),
        }
    }

    pub fn as_stock_data(&self) -> Option<&StockDataRepository> {
        match self {
            TableRepository::StockData(repo) => Some(repo),
            TableRepository::LogData(_) => None,
        }
    }

    pub fn as_log_data(&self) -> Option<&LogDataRepository> {
        match self {
            TableRepository::LogData(repo) => Some(repo),
            TableRepository::StockData(_) => None,
        }
    }
}
