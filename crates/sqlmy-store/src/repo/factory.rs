use super::{LogDataRepository, StockDataRepository, TableRepository};
use crate::errors::{no_repository, Result};
use crate::shared::SharedDatabase;

/// Hands out the repository registered for a table name
///
/// | name         | repository            |
/// |--------------|-----------------------|
/// | `stock_data` | `StockDataRepository` |
/// | `log_data`   | `LogDataRepository`   |
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    stock_data: StockDataRepository,
    log_data: LogDataRepository,
}

impl RepositoryFactory {
    pub fn new(database: SharedDatabase) -> Self {
        Self {
            stock_data: StockDataRepository::new(database.clone()),
            log_data: LogDataRepository::new(database),
        }
    }

    /// The repository for `table_name`
    ///
    /// # Errors
    ///
    /// `NotFound` ("No repository found for table: {name}") for an
    /// unregistered name.
    pub fn get_repository(&self, table_name: &str) -> Result<TableRepository> {
        match table_name {
            "stock_data" => Ok(TableRepository::StockData(self.stock_data.clone())),
            "log_data" => Ok(TableRepository::LogData(self.log_data.clone())),
            other => Err(no_repository(other)),
        }
    }
}
