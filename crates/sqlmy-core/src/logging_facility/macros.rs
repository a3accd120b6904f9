//! Boundary logging macros
//!
//! Every boundary event carries `component` (the caller's module path), `op`
//! and `event`. Extra `tracing` fields may follow the required arguments.

#[doc(hidden)]
#[macro_export]
macro_rules! __sqlmy_boundary {
    ($level:ident, $op:expr, $event:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $event,
            $($($field)*)?
        )
    };
}

/// Log the start of an operation at info level
///
/// ```
/// # use sqlmy_core::log_op_start;
/// log_op_start!("create_tables");
/// log_op_start!("drop_table", table = "stock_data");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__sqlmy_boundary!(info, $op, $crate::schema::EVENT_START $(, $($field)*)?)
    };
}

/// Log the successful end of an operation with its duration
///
/// ```
/// # use sqlmy_core::log_op_end;
/// log_op_end!("create_tables", duration_ms = 42);
/// log_op_end!("insert_frame", duration_ms = 7, rows = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__sqlmy_boundary!(
            info,
            $op,
            $crate::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// Log the failed end of an operation
///
/// `$err` is anything convertible into `ExError`; its kind, stable code and
/// rendered message are recorded.
///
/// ```
/// # use sqlmy_core::log_op_error;
/// # use sqlmy_core::errors::SqlmyError;
/// let err = SqlmyError::UnsupportedSqlType { sql_type: "BLOB".to_string() };
/// log_op_error!("coerce_columns", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__sqlmy_boundary!(
            error,
            $op,
            $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            error = %ex_err
            $(, $($field)*)?
        )
    }};
}
