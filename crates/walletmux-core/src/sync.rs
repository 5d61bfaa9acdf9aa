/*
[INPUT]:  Mutex-guarded crate state
[OUTPUT]: Guards that survive a panicked holder
[POS]:    Shared utility - lock helper used by every stateful module
[UPDATE]: When changing how crate state is locked
*/

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a state mutex, recovering the data if a holder panicked.
///
/// Critical sections in this crate never await, so the data behind a
/// poisoned lock is still consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
