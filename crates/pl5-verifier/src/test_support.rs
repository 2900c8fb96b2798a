use std::sync::{Mutex, MutexGuard, OnceLock};

/// Serialises tests that read or mutate process environment variables.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    GUARD
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
