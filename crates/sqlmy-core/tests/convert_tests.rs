#![allow(clippy::unwrap_used, clippy::expect_used)]

use sqlmy_core::time_zone::jst;
use sqlmy_core::{ColumnType, Frame, SqlmyError, Value};
use std::collections::BTreeMap;

fn raw_quotes() -> Frame {
    Frame::from_rows(
        ["Code", "Date", "Close", "Volume"],
        vec![
            vec![
                Value::from("7203"),
                Value::from("2024-03-01 00:00:00"),
                Value::from("3400.0"),
                Value::from("1000"),
            ],
            vec![
                Value::from("7203"),
                Value::from("2024-03-04 00:00:00"),
                Value::Real(3425.5),
                Value::Integer(1200),
            ],
            vec![Value::from("9984"), Value::Null, Value::Null, Value::Null],
        ],
    )
    .unwrap()
}

fn clean(frame: &Frame) -> Frame {
    let mapping = BTreeMap::from([
        ("Code".to_string(), "company_id".to_string()),
        ("Date".to_string(), "date".to_string()),
        ("Close".to_string(), "close_price".to_string()),
        ("Volume".to_string(), "volume".to_string()),
    ]);
    frame
        .rename_columns(&mapping)
        .unwrap()
        .select_columns(&["company_id", "date", "close_price", "volume"])
        .unwrap()
        .coerce_sql_types(&[
            ("company_id", "INTEGER"),
            ("date", "DATETIME"),
            ("close_price", "FLOAT"),
            ("volume", "INTEGER"),
        ])
        .unwrap()
        .convert_timezone("date", jst())
        .unwrap()
}

#[test]
fn test_pipeline_preserves_row_count() {
    let input = raw_quotes();
    let output = clean(&input);
    assert_eq!(output.len(), input.len());
    assert_eq!(output.columns(), ["company_id", "date", "close_price", "volume"]);
}

#[test]
fn test_pipeline_is_deterministic() {
    let input = raw_quotes();
    assert_eq!(clean(&input), clean(&input));
}

#[test]
fn test_pipeline_does_not_modify_input() {
    let input = raw_quotes();
    let before = input.clone();
    let _ = clean(&input);
    assert_eq!(input, before);
}

#[test]
fn test_pipeline_values() {
    let output = clean(&raw_quotes());
    let first = &output.rows()[0];
    assert_eq!(first[0], Value::Integer(7203));
    assert_eq!(
        first[1].as_timestamp().unwrap().to_rfc3339(),
        "2024-03-01T09:00:00+09:00"
    );
    assert_eq!(first[2], Value::Real(3400.0));
    assert_eq!(first[3], Value::Integer(1000));

    let nulls = &output.rows()[2];
    assert!(nulls[1..].iter().all(Value::is_null));
}

#[test]
fn test_object_columns_are_left_alone() {
    let frame = Frame::from_rows(["memo"], vec![vec![Value::Blob(vec![0xff])]]).unwrap();
    let out = frame.coerce_column("memo", ColumnType::Object).unwrap();
    assert_eq!(out, frame);
}

#[test]
fn test_missing_column_is_reported() {
    let err = raw_quotes()
        .coerce_column("Open", ColumnType::Float64)
        .unwrap_err();
    assert_eq!(
        err,
        SqlmyError::ColumnNotFound {
            column: "Open".to_string()
        }
    );
}
