//! Table metadata and DDL rendering
//!
//! `MetaData` is the set of tables a `Database` can create. Rendering always
//! uses `IF NOT EXISTS`, so creating tables is safe to repeat.

use std::fmt::Write as _;

/// Column type as declared in DDL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Float,
    Varchar(Option<u32>),
    Text,
    Date,
    DateTime { timezone: bool },
}

impl SqlType {
    /// Base type name, without a length
    pub fn name(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Float => "FLOAT",
            SqlType::Varchar(_) => "VARCHAR",
            SqlType::Text => "TEXT",
            SqlType::Date => "DATE",
            SqlType::DateTime { .. } => "DATETIME",
        }
    }

    /// Type name understood by `Frame::coerce_sql_types`
    ///
    /// Text and dates are kept as strings.
    pub fn frame_type_name(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Float => "FLOAT",
            SqlType::Varchar(_) | SqlType::Text | SqlType::Date => "VARCHAR",
            SqlType::DateTime { .. } => "DATETIME",
        }
    }

    pub fn is_timezone_aware(&self) -> bool {
        matches!(self, SqlType::DateTime { timezone: true })
    }

    // SQLite has no zone-aware type; aware timestamps are stored as RFC 3339 text.
    fn ddl(&self) -> String {
        match self {
            SqlType::Varchar(Some(length)) => format!("VARCHAR({})", length),
            other => other.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    sql_type: SqlType,
    primary_key: bool,
    nullable: bool,
    index: bool,
}

impl Column {
    /// A nullable, unindexed column
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            primary_key: false,
            nullable: true,
            index: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_indexed(&self) -> bool {
        self.index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// `(column, type name)` pairs, the input `Frame::coerce_sql_types` takes
    pub fn sql_types(&self) -> Vec<(&str, &'static str)> {
        self.columns
            .iter()
            .map(|c| (c.name(), c.sql_type.frame_type_name()))
            .collect()
    }

    /// `CREATE TABLE IF NOT EXISTS` statement
    pub fn create_sql(&self) -> String {
        let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (", quote_identifier(&self.name));
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push(',');
            }
            let _ = write!(
                sql,
                "\n  {} {}",
                quote_identifier(&column.name),
                column.sql_type.ddl()
            );
            if !column.nullable {
                sql.push_str(" NOT NULL");
            }
        }
        let keys: Vec<String> = self
            .columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| quote_identifier(&c.name))
            .collect();
        if !keys.is_empty() {
            let _ = write!(sql, ",\n  PRIMARY KEY ({})", keys.join(", "));
        }
        sql.push_str("\n)");
        sql
    }

    /// One `CREATE INDEX IF NOT EXISTS` statement per indexed column
    pub fn index_sql(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.index)
            .map(|c| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                    quote_identifier(&format!("ix_{}_{}", self.name, c.name)),
                    quote_identifier(&self.name),
                    quote_identifier(&c.name)
                )
            })
            .collect()
    }
}

/// The set of tables a database handle manages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaData {
    tables: Vec<Table>,
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any table of the same name
    pub fn table(mut self, table: Table) -> Self {
        self.tables.retain(|t| t.name != table.name);
        self.tables.push(table);
        self
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Every table and index statement, in declaration order
    pub fn create_all_sql(&self) -> Vec<String> {
        self.tables
            .iter()
            .flat_map(|t| std::iter::once(t.create_sql()).chain(t.index_sql()))
            .collect()
    }
}

/// Quote an identifier for SQLite
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
