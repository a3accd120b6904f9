#![allow(clippy::unwrap_used, clippy::expect_used)]

// Installs the database log layer as the global subscriber
// Kept to a single test: a binary can set the global default only once

use sqlmy_core::errors::ExErrorKind;
use sqlmy_store::models;
use sqlmy_store::repo::LogDataRepository;
use sqlmy_store::{share, Database};
use tracing::Level;

#[test]
fn test_setup_logging_installs_once() {
    let mut db = Database::new(models::metadata(), "sqlite:///:memory:").unwrap();
    db.create_tables().unwrap();
    let db = share(db);

    // Given: the layer installed globally
    sqlmy_store::log_handler::setup_logging(db.clone(), Level::INFO).unwrap();

    // When: an event is raised from another thread
    std::thread::spawn(|| tracing::error!(user_id = "user-7", "background failure"))
        .join()
        .unwrap();

    // Then: it reached the logs table
    let errors = LogDataRepository::new(db.clone())
        .find_by_level("ERROR")
        .unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].user_id.as_deref(), Some("user-7"));

    // And: a second installation is refused
    let err = sqlmy_store::log_handler::setup_logging(db, Level::INFO).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Config);
}
