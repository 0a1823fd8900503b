//! Lock utilities for proper error handling of poisoned locks

use crate::error::{Error, Result};
use std::sync::{Mutex, MutexGuard};

/// Lock a Mutex and handle poisoning
pub fn lock_mutex<'a, T>(lock: &'a Mutex<T>, context: &str) -> Result<MutexGuard<'a, T>> {
    lock.lock()
        .map_err(|_| Error::internal(format!("Mutex lock poisoned: {context}")))
}
