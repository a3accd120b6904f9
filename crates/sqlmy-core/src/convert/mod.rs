//! Tabular data conversion
//!
//! A `Frame` is an in-memory table of `Value`s. Every transformation returns
//! a new frame and leaves its input untouched; none of them add or drop rows.

mod frame;
mod sql_type;

pub use frame::Frame;
pub use sql_type::{coerce_value, ColumnType};
