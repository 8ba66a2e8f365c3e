//! Application state management.
//!
//! The AppState holds the session store and is shared by the command
//! functions and the job runner's background tasks.

use antipas_core::SessionStore;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Failed to acquire session lock")]
pub struct LockPoisoned;

/// Shared application state.
///
/// There is one store per AppState; independent sessions get independent
/// AppStates.
#[derive(Debug)]
pub struct AppState {
    store: Mutex<SessionStore>,
}

impl AppState {
    /// Create a new AppState holding a fresh session.
    pub fn new() -> Self {
        Self {
            store: Mutex::new(SessionStore::new()),
        }
    }

    /// Lock the store for reading or writing.
    pub fn lock(&self) -> Result<MutexGuard<'_, SessionStore>, LockPoisoned> {
        self.store.lock().map_err(|_| LockPoisoned)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
