//! Mutex wrapper adding the `try_lock`/`Busy` vocabulary the source's
//! `dsMutex` exposes on top of `parking_lot`'s guard-based API.

use std::time::Duration;

use parking_lot::Mutex as RawMutex;
pub use parking_lot::MutexGuard;

use crate::error::{Error, ErrorKind, Result};

/// A mutual-exclusion lock around a `T`. Unlocking happens automatically
/// when the returned guard drops, so the source's "unlock without a held
/// lock" error case has no Rust equivalent — ownership of the guard *is*
/// holding the lock.
pub struct Mutex<T> {
    inner: RawMutex<T>,
}

impl<T> Mutex<T> {
    /// Creates a new, unlocked mutex around `value`.
    pub fn new(value: T) -> Self {
        Mutex { inner: RawMutex::new(value) }
    }

    /// Blocks until the lock is acquired.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Acquires the lock only if it's immediately available, otherwise
    /// reports [`ErrorKind::Busy`].
    pub fn try_lock(&self) -> Result<MutexGuard<'_, T>> {
        self.inner
            .try_lock()
            .ok_or_else(|| Error::new(ErrorKind::Busy, "mutex is already held"))
    }

    /// Acquires the lock, waiting up to `timeout`. Reports
    /// [`ErrorKind::Timeout`] if the deadline passes first.
    pub fn try_lock_for(&self, timeout: Duration) -> Result<MutexGuard<'_, T>> {
        self.inner
            .try_lock_for(timeout)
            .ok_or_else(|| Error::new(ErrorKind::Timeout, "mutex lock timed out"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn lock_excludes_concurrent_access() {
        let mutex = Arc::new(Mutex::new(0u32));
        thread::scope(|scope| {
            for _ in 0..8 {
                let mutex = Arc::clone(&mutex);
                scope.spawn(move || {
                    for _ in 0..1000 {
                        *mutex.lock() += 1;
                    }
                });
            }
        });
        assert_eq!(*mutex.lock(), 8000);
    }

    #[test]
    fn try_lock_reports_busy_when_held() {
        let mutex = Mutex::new(0);
        let guard = mutex.lock();
        let err = mutex.try_lock().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Busy);
        drop(guard);
        assert!(mutex.try_lock().is_ok());
    }
}
