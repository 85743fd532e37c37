//! Synchronization utilities for robust mutex handling
//!
//! The batch controller shares one mutex-guarded state record between its
//! worker and any number of status/results readers. A panic while holding
//! that lock poisons it; these helpers convert poison errors into
//! application errors instead of propagating the panic.

use std::sync::LockResult;

/// Handle poisoned mutex cases with consistent error handling
///
/// Converts a mutex poison error into an application-specific error using
/// the provided constructor, so callers keep their own error taxonomy.
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned). This indicates a panic occurred while holding a lock. PoisonError: {:?}",
            poison_err
        ))
    })
}
