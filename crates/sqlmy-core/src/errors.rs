use thiserror::Error;

/// Result type alias using SqlmyError
pub type Result<T> = std::result::Result<T, SqlmyError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers and tests can match on
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    InvalidInput,
    InvalidUrl,
    InvalidTimestamp,
    UnsupportedDialect,
    UnsupportedType,

    // Data conversion
    Conversion,
    DuplicateColumn,
    NotFound,

    // Handle lifecycle
    ConnectionNotInitialized,
    TransactionNotStarted,

    // Integration/IO
    Config,
    Persistence,
    Io,
    Concurrency,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidUrl => "ERR_INVALID_URL",
            ExErrorKind::InvalidTimestamp => "ERR_INVALID_TIMESTAMP",
            ExErrorKind::UnsupportedDialect => "ERR_UNSUPPORTED_DIALECT",
            ExErrorKind::UnsupportedType => "ERR_UNSUPPORTED_TYPE",
            ExErrorKind::Conversion => "ERR_CONVERSION",
            ExErrorKind::DuplicateColumn => "ERR_DUPLICATE_COLUMN",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ConnectionNotInitialized => "ERR_CONNECTION_NOT_INITIALIZED",
            ExErrorKind::TransactionNotStarted => "ERR_TRANSACTION_NOT_STARTED",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification plus optional context (operation, table, column,
/// row) for debugging. Messages from the underlying toolkit are kept verbatim.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    table: Option<String>,
    column: Option<String>,
    row: Option<usize>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            table: None,
            column: None,
            row: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add column context
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Add row index context
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn row(&self) -> Option<usize> {
        self.row
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(column) = &self.column {
            write!(f, " (column: {})", column)?;
        }
        if let Some(row) = self.row {
            write!(f, " (row: {})", row)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Errors raised by the helpers in this crate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SqlmyError {
    #[error("Unsupported sql type: {sql_type}")]
    UnsupportedSqlType { sql_type: String },

    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    #[error("Duplicate column: {column}")]
    DuplicateColumn { column: String },

    #[error("Row {row} has {actual} values, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot convert {value} in column '{column}' (row {row}) to {target}")]
    CoercionFailed {
        column: String,
        row: usize,
        value: String,
        target: String,
    },

    #[error("Invalid timestamp '{input}': {reason}")]
    InvalidTimestamp { input: String, reason: String },

    #[error("Invalid UTC offset: {input}")]
    InvalidOffset { input: String },

    #[error("Invalid engine URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unsupported dialect: {dialect}")]
    UnsupportedDialect { dialect: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl From<SqlmyError> for ExError {
    fn from(err: SqlmyError) -> Self {
        let message = err.to_string();
        match err {
            SqlmyError::UnsupportedSqlType { .. } => {
                ExError::new(ExErrorKind::UnsupportedType).with_message(message)
            }
            SqlmyError::ColumnNotFound { column } => ExError::new(ExErrorKind::NotFound)
                .with_column(column)
                .with_message(message),
            SqlmyError::DuplicateColumn { column } => ExError::new(ExErrorKind::DuplicateColumn)
                .with_column(column)
                .with_message(message),
            SqlmyError::RowWidthMismatch { row, .. } => ExError::new(ExErrorKind::InvalidInput)
                .with_row(row)
                .with_message(message),
            SqlmyError::CoercionFailed { column, row, .. } => {
                ExError::new(ExErrorKind::Conversion)
                    .with_column(column)
                    .with_row(row)
                    .with_message(message)
            }
            SqlmyError::InvalidTimestamp { .. } | SqlmyError::InvalidOffset { .. } => {
                ExError::new(ExErrorKind::InvalidTimestamp).with_message(message)
            }
            SqlmyError::InvalidUrl { .. } => {
                ExError::new(ExErrorKind::InvalidUrl).with_message(message)
            }
            SqlmyError::UnsupportedDialect { .. } => {
                ExError::new(ExErrorKind::UnsupportedDialect).with_message(message)
            }
            SqlmyError::Config { .. } => ExError::new(ExErrorKind::Config).with_message(message),
        }
    }
}

impl From<config::ConfigError> for SqlmyError {
    fn from(err: config::ConfigError) -> Self {
        SqlmyError::Config {
            message: err.to_string(),
        }
    }
}
