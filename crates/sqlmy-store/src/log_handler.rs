//! Tracing layer that writes log events into the `logs` table
//!
//! Each event becomes one row: JST timestamp, level, message, the event
//! target as logger name and its module path as source. Fields named after a
//! `logs` column (`user_id`, `session_id`, `ip_address`, `user_agent`,
//! `tags`) fill that column; a `stack_trace` or `error` field fills
//! `stack_trace`; every other field lands in `additional_data` as JSON.
//!
//! The layer only writes when it can take the database lock without
//! waiting. Events raised while the handle is busy, including the ones the
//! database emits while this layer is writing, are skipped.

use crate::errors::Result;
use crate::models::LogEntry;
use crate::repo::log_data::insert_entry;
use crate::shared::SharedDatabase;
use sqlmy_core::errors::{ExError, ExErrorKind};
use sqlmy_core::logging_facility::FieldVisitor;
use sqlmy_core::schema::{
    FIELD_ERROR, FIELD_IP_ADDRESS, FIELD_MESSAGE, FIELD_SESSION_ID, FIELD_STACK_TRACE, FIELD_TAGS,
    FIELD_USER_AGENT, FIELD_USER_ID,
};
use sqlmy_core::time_zone;
use sqlmy_core::LoggingSettings;
use std::sync::TryLockError;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Writes every event it sees into the `logs` table
pub struct DatabaseLogLayer {
    database: SharedDatabase,
    environment: Option<String>,
}

impl DatabaseLogLayer {
    pub fn new(database: SharedDatabase) -> Self {
        Self {
            database,
            environment: None,
        }
    }

    /// Value stored in the `environment` column
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    fn entry_for(&self, event: &Event<'_>) -> LogEntry {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor::collect(event);

        let stack_trace = visitor
            .take(FIELD_STACK_TRACE)
            .or_else(|| visitor.get(FIELD_ERROR).map(str::to_string));

        LogEntry {
            id: None,
            timestamp: Some(time_zone::current_japan_time()),
            log_level: Some(metadata.level().to_string()),
            message: visitor.take(FIELD_MESSAGE),
            source: metadata.module_path().map(str::to_string),
            thread_id: Some(thread_label()),
            process_id: Some(std::process::id().to_string()),
            user_id: visitor.take(FIELD_USER_ID),
            session_id: visitor.take(FIELD_SESSION_ID),
            logger_name: Some(metadata.target().to_string()),
            stack_trace,
            ip_address: visitor.take(FIELD_IP_ADDRESS),
            user_agent: visitor.take(FIELD_USER_AGENT),
            environment: self.environment.clone(),
            tags: visitor.take(FIELD_TAGS),
            additional_data: additional_data(visitor),
        }
    }
}

impl<S> Layer<S> for DatabaseLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut db = match self.database.try_lock() {
            Ok(db) => db,
            Err(TryLockError::WouldBlock) => return,
            Err(TryLockError::Poisoned(_)) => {
                eprintln!("sqlmy: database log layer skipped an event: lock poisoned");
                return;
            }
        };

        let entry = self.entry_for(event);
        if let Err(err) = insert_entry(&mut db, &entry) {
            eprintln!("sqlmy: failed to write log entry: {}", err);
        }
    }
}

/// A subscriber writing events at `level` and above into the database
pub fn log_subscriber(database: SharedDatabase, level: Level) -> impl Subscriber + Send + Sync {
    tracing_subscriber::registry()
        .with(DatabaseLogLayer::new(database).with_filter(LevelFilter::from_level(level)))
}

/// A subscriber taking its level and environment from `settings`
///
/// # Errors
///
/// `Config` when `settings.level` is not a level name.
pub fn subscriber_from_settings(
    database: SharedDatabase,
    settings: &LoggingSettings,
) -> Result<impl Subscriber + Send + Sync> {
    let level = parse_level(&settings.level)?;
    let mut layer = DatabaseLogLayer::new(database);
    if let Some(environment) = &settings.environment {
        layer = layer.with_environment(environment.as_str());
    }
    Ok(tracing_subscriber::registry().with(layer.with_filter(LevelFilter::from_level(level))))
}

/// Parse a level name such as `info` or `WARN`
///
/// # Errors
///
/// `Config` for anything else.
pub fn parse_level(name: &str) -> Result<Level> {
    name.trim().parse::<Level>().map_err(|_| {
        ExError::new(ExErrorKind::Config)
            .with_op("parse_level")
            .with_message(format!("Unknown log level: {}", name))
    })
}

/// Install `log_subscriber` as the global default
///
/// # Errors
///
/// `Config` if a global subscriber is already installed.
pub fn setup_logging(database: SharedDatabase, level: Level) -> Result<()> {
    tracing::subscriber::set_global_default(log_subscriber(database, level)).map_err(|e| {
        ExError::new(ExErrorKind::Config)
            .with_op("setup_logging")
            .with_message(e.to_string())
    })
}

fn thread_label() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}

fn additional_data(visitor: FieldVisitor) -> Option<String> {
    let fields = visitor.into_fields();
    if fields.is_empty() {
        return None;
    }
    serde_json::to_string(&fields).ok()
}
