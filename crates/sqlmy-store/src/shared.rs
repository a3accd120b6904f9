//! Process-wide shared database handle
//!
//! The first call to `shared_database` creates the handle; every later call
//! returns the same one and ignores its arguments.

use crate::database::Database;
use crate::errors::{lock_poisoned, Result};
use crate::schema::MetaData;
use sqlmy_core::Singleton;
use std::sync::{Arc, Mutex, MutexGuard};

/// A database handle shared between threads
pub type SharedDatabase = Arc<Mutex<Database>>;

static DATABASE: Singleton<Mutex<Database>> = Singleton::new();

/// The process-wide handle, created on first use
///
/// # Errors
///
/// The errors of `Database::new` on the creating call; nothing is stored
/// and the next call tries again.
pub fn shared_database(metadata: MetaData, engine_url: &str) -> Result<SharedDatabase> {
    DATABASE.get_or_try_init(|| {
        tracing::debug!("creating shared database handle");
        Database::new(metadata, engine_url).map(Mutex::new)
    })
}

/// Wrap a handle for sharing, outside the process-wide instance
pub fn share(database: Database) -> SharedDatabase {
    Arc::new(Mutex::new(database))
}

/// Lock a shared handle
///
/// # Errors
///
/// `Concurrency` if a thread panicked while holding the lock.
pub fn lock(database: &SharedDatabase) -> Result<MutexGuard<'_, Database>> {
    database.lock().map_err(|_| lock_poisoned("lock_database"))
}
