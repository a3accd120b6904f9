#![allow(clippy::unwrap_used, clippy::expect_used)]

use sqlmy_core::errors::{ExError, ExErrorKind, SqlmyError};
use sqlmy_core::logging_facility::test_capture::{capture, init_test_capture};
use sqlmy_core::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use sqlmy_core::{log_op_end, log_op_error, log_op_start};
use tracing::Level;

#[test]
fn test_start_carries_extra_fields() {
    let capture = init_test_capture();
    let op_name = "test_start_fields_unique_1";

    log_op_start!(op_name, table = "stock_data");

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1, "Should have exactly one start event");
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(events[0].field("table"), Some("stock_data"));
    assert_eq!(events[0].level, Level::INFO);
}

#[test]
fn test_end_records_duration_and_fields() {
    let capture = init_test_capture();
    let op_name = "test_end_fields_unique_2";

    log_op_end!(op_name, duration_ms = 42, rows = 3);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1, "Should have exactly one end event");
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[0].field("duration_ms"), Some("42"));
    assert_eq!(events[0].field("rows"), Some("3"));
}

#[test]
fn test_error_boundary_records_kind_and_code() {
    let ((), captured) = capture(|| {
        let err = SqlmyError::UnsupportedSqlType {
            sql_type: "BLOB".to_string(),
        };
        log_op_error!("coerce_sql_types", err, duration_ms = 10);
    });

    let events = captured.events_for_op("coerce_sql_types");
    assert_eq!(events.len(), 1, "Should have exactly one error event");
    let error_event = &events[0];
    assert_eq!(error_event.event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(error_event.level, Level::ERROR);
    assert_eq!(error_event.error_code(), Some("ERR_UNSUPPORTED_TYPE"));
    assert_eq!(error_event.field("err.kind"), Some("UnsupportedType"));
    assert!(error_event.fields["error"].contains("Unsupported sql type: BLOB"));
}

#[test]
fn test_error_boundary_renders_context() {
    let ((), captured) = capture(|| {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_table("stock_data")
            .with_message("Table stock_data does not exist.");
        log_op_error!("drop_table", err, duration_ms = 0, attempt = 2);
    });

    let event = &captured.events_for_op("drop_table")[0];
    assert_eq!(event.error_code(), Some("ERR_NOT_FOUND"));
    assert_eq!(event.field("attempt"), Some("2"));
    assert!(event.fields["error"].contains("(table: stock_data)"));
}

#[test]
fn test_boundaries_are_ordered() {
    let ((), captured) = capture(|| {
        log_op_start!("connect");
        tracing::debug!(op = "connect", "opening sqlite connection");
        log_op_end!("connect", duration_ms = 5);
    });

    assert_eq!(
        captured.boundaries("connect"),
        vec![EVENT_START.to_string(), EVENT_END.to_string()]
    );
    let starts = captured.count_events(|e| e.event.as_deref() == Some(EVENT_START));
    assert_eq!(starts, 1);
}

#[test]
fn test_component_is_caller_module_path() {
    let ((), captured) = capture(|| log_op_start!("component_op"));

    let events = captured.events_for_op("component_op");
    assert_eq!(events[0].component.as_deref(), Some("logging_facility_tests"));
    assert_eq!(events[0].target, "logging_facility_tests");
}
