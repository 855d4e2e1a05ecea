pub mod camera;
pub mod config;
pub mod gateway;
pub mod messages;
pub mod motor;
pub mod peripherals;
pub mod runtime;
pub mod vehicle;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock shared state, recovering the data if another context panicked
/// while holding it. Every writer leaves the state consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
