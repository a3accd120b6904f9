use crate::errors::Result;
use crate::models::{stock_data_table, StockData};
use crate::query::Params;
use crate::schema::Table;
use crate::shared::{lock, SharedDatabase};
use chrono::NaiveDate;

const INSERT_SQL: &str = "INSERT INTO stock_data (
        company_id, source, date, open_price, close_price, high_price, low_price,
        volume, adjusted_close_price, dividend, split_coefficient, created_at
    ) VALUES (
        :company_id, :source, :date, :open_price, :close_price, :high_price, :low_price,
        :volume, :adjusted_close_price, :dividend, :split_coefficient, :created_at
    )";

const SELECT_COLUMNS: &str = "SELECT id, company_id, source, date, open_price, close_price,
        high_price, low_price, volume, adjusted_close_price, dividend, split_coefficient,
        created_at FROM stock_data";

/// Repository over the `stock_data` table
#[derive(Debug, Clone)]
pub struct StockDataRepository {
    database: SharedDatabase,
    table: Table,
}

impl StockDataRepository {
    pub fn new(database: SharedDatabase) -> Self {
        Self {
            database,
            table: stock_data_table(),
        }
    }

    pub fn database(&self) -> &SharedDatabase {
        &self.database
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Insert one record and return its id
    ///
    /// # Errors
    ///
    /// `Persistence` when the insert fails.
    pub fn insert(&self, record: &StockData) -> Result<i64> {
        let mut db = lock(&self.database)?;
        db.connect()?;
        db.run_in_transaction(|db| {
            db.execute_query(INSERT_SQL, &record.to_params())?
                .last_insert_id()
        })
    }

    /// All records of a company, oldest first
    ///
    /// # Errors
    ///
    /// `Persistence` when the query fails, `Conversion` for malformed rows.
    pub fn find_by_company(&self, company_id: i64) -> Result<Vec<StockData>> {
        let sql = format!("{} WHERE company_id = :company_id ORDER BY date, id", SELECT_COLUMNS);
        self.select(&sql, &Params::new().with_value("company_id", company_id))
    }

    /// Records of a company dated within `[start, end]`, oldest first
    ///
    /// # Errors
    ///
    /// As for `find_by_company`.
    pub fn find_by_company_between(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StockData>> {
        let sql = format!(
            "{} WHERE company_id = :company_id AND date BETWEEN :start AND :end ORDER BY date, id",
            SELECT_COLUMNS
        );
        let params = Params::new()
            .with_value("company_id", company_id)
            .with_value("start", start)
            .with_value("end", end);
        self.select(&sql, &params)
    }

    fn select(&self, sql: &str, params: &Params) -> Result<Vec<StockData>> {
        let mut db = lock(&self.database)?;
        db.connect()?;
        db.execute_query(sql, params)?
            .into_rows()?
            .iter()
            .map(StockData::from_row)
            .collect()
    }
}
