#![allow(clippy::unwrap_used, clippy::expect_used)]

// Integration tests for the database log layer
// Each test routes tracing events into an in-memory `logs` table

use sqlmy_core::LoggingSettings;
use sqlmy_store::log_handler::{log_subscriber, subscriber_from_settings, DatabaseLogLayer};
use sqlmy_store::models::{self, LogEntry};
use sqlmy_store::repo::LogDataRepository;
use sqlmy_store::{share, Database, SharedDatabase};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

fn setup() -> SharedDatabase {
    let mut db = Database::new(models::metadata(), "sqlite:///:memory:")
        .expect("Failed to create database handle");
    db.create_tables().expect("Failed to create tables");
    share(db)
}

fn stored(db: &SharedDatabase) -> Vec<LogEntry> {
    let mut entries = LogDataRepository::new(db.clone()).recent(100).unwrap();
    entries.reverse();
    entries
}

#[test]
fn test_event_is_written_to_logs_table() {
    let db = setup();

    tracing::subscriber::with_default(log_subscriber(db.clone(), Level::INFO), || {
        tracing::info!("This is a test log message");
    });

    let entries = stored(&db);
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.message.as_deref(), Some("This is a test log message"));
    assert_eq!(entry.log_level.as_deref(), Some("INFO"));
    assert_eq!(entry.logger_name.as_deref(), Some("log_handler_tests"));
    assert_eq!(entry.source.as_deref(), Some("log_handler_tests"));
    assert_eq!(
        entry.process_id.as_deref(),
        Some(std::process::id().to_string().as_str())
    );
    assert!(entry.thread_id.is_some());
    assert!(entry.timestamp.is_some());
    assert_eq!(entry.additional_data, None);
}

#[test]
fn test_events_below_level_are_dropped() {
    let db = setup();

    tracing::subscriber::with_default(log_subscriber(db.clone(), Level::WARN), || {
        tracing::debug!("debug detail");
        tracing::info!("routine");
        tracing::warn!("disk almost full");
        tracing::error!("disk full");
    });

    let levels: Vec<Option<String>> = stored(&db).into_iter().map(|e| e.log_level).collect();
    assert_eq!(
        levels,
        vec![Some("WARN".to_string()), Some("ERROR".to_string())]
    );
}

#[test]
fn test_known_fields_fill_their_columns() {
    let db = setup();

    tracing::subscriber::with_default(log_subscriber(db.clone(), Level::INFO), || {
        tracing::error!(
            user_id = "user-42",
            session_id = "session-9",
            ip_address = "10.0.0.1",
            user_agent = "test-agent",
            tags = "billing",
            error = "connection reset",
            request_id = 17,
            "payment failed"
        );
    });

    let entries = stored(&db);
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.user_id.as_deref(), Some("user-42"));
    assert_eq!(entry.session_id.as_deref(), Some("session-9"));
    assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.1"));
    assert_eq!(entry.user_agent.as_deref(), Some("test-agent"));
    assert_eq!(entry.tags.as_deref(), Some("billing"));
    assert_eq!(entry.stack_trace.as_deref(), Some("connection reset"));

    // Unknown fields land in additional_data as a JSON object
    let extra: serde_json::Value =
        serde_json::from_str(entry.additional_data.as_deref().unwrap()).unwrap();
    assert_eq!(extra["request_id"], "17");
    assert_eq!(extra["error"], "connection reset");
    assert!(extra.get("user_id").is_none());
}

#[test]
fn test_environment_is_recorded() {
    let db = setup();
    let subscriber = tracing_subscriber::registry()
        .with(DatabaseLogLayer::new(db.clone()).with_environment("staging"));

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("deployed");
    });

    let entries = stored(&db);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].environment.as_deref(), Some("staging"));
}

#[test]
fn test_event_is_skipped_while_database_is_locked() {
    let db = setup();

    tracing::subscriber::with_default(log_subscriber(db.clone(), Level::INFO), || {
        let _guard = db.lock().unwrap();
        tracing::info!("raised while busy");
    });

    assert!(stored(&db).is_empty());
}

#[test]
fn test_subscriber_from_settings() {
    let db = setup();
    let settings = LoggingSettings {
        level: "warn".to_string(),
        environment: Some("production".to_string()),
        ..LoggingSettings::default()
    };
    let subscriber = subscriber_from_settings(db.clone(), &settings).unwrap();

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("filtered out");
        tracing::warn!("kept");
    });

    let entries = stored(&db);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message.as_deref(), Some("kept"));
    assert_eq!(entries[0].environment.as_deref(), Some("production"));
}

#[test]
fn test_subscriber_from_settings_rejects_unknown_level() {
    let settings = LoggingSettings {
        level: "loud".to_string(),
        ..LoggingSettings::default()
    };
    assert!(subscriber_from_settings(setup(), &settings).is_err());
}
