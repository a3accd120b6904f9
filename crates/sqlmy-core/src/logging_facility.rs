//! Structured logging for sqlmy
//!
//! Console output is installed once with `init(profile)` or
//! `init_with_level`. Operation boundaries are logged with `log_op_start!`,
//! `log_op_end!` and `log_op_error!`, so every public lifecycle call on a
//! database handle produces a `start` event followed by `end` or
//! `end_error`.
//!
//! ```rust
//! use sqlmy_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```
//!
//! Tests assert on events through `test_capture`.

pub mod init;
pub mod macros;
pub mod test_capture;
pub mod visitor;

pub use init::{init, init_with_level, Profile};
pub use test_capture::{capture, init_test_capture, CapturedEvent, TestCapture};
pub use visitor::FieldVisitor;
