//! Thread-safe one-time initialisation
//!
//! A `Singleton<T>` holds at most one `Arc<T>` for the life of the process.
//! The first caller builds the value under a lock; every caller, including
//! ones racing with the first, receives the same instance.

use std::convert::Infallible;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

pub struct Singleton<T> {
    cell: OnceLock<Arc<T>>,
    init_lock: Mutex<()>,
}

impl<T> Singleton<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// The instance, if it has been created
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    pub fn get_or_init<F>(&self, init: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        match self.get_or_try_init(|| Ok::<T, Infallible>(init())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Return the instance, creating it with `init` if this is the first call
    ///
    /// If `init` fails nothing is stored and the next caller tries again.
    pub fn get_or_try_init<F, E>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(existing) = self.cell.get() {
            return Ok(existing.clone());
        }

        // A panic inside a previous `init` leaves nothing behind worth protecting.
        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = self.cell.get() {
            return Ok(existing.clone());
        }

        let created = Arc::new(init()?);
        Ok(self.cell.get_or_init(|| created).clone())
    }
}

impl<T> Default for Singleton<T> {
    fn default() -> Self {
        Self::new()
    }
}
