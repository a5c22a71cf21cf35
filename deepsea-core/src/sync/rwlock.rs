//! Read-write lock wrapper around `parking_lot::RwLock`.

use parking_lot::RwLock as RawRwLock;
pub use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, ErrorKind, Result};

/// A read-write lock around a `T`: any number of concurrent readers, or
/// one exclusive writer.
pub struct RwLock<T> {
    inner: RawRwLock<T>,
}

impl<T> RwLock<T> {
    /// Creates a new, unlocked read-write lock around `value`.
    pub fn new(value: T) -> Self {
        RwLock { inner: RawRwLock::new(value) }
    }

    /// Blocks until a read lock is acquired.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    /// Blocks until the write lock is acquired.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }

    /// Acquires a read lock only if it's immediately available.
    pub fn try_read(&self) -> Result<RwLockReadGuard<'_, T>> {
        self.inner
            .try_read()
            .ok_or_else(|| Error::new(ErrorKind::Busy, "read-write lock is write-locked"))
    }

    /// Acquires the write lock only if it's immediately available.
    pub fn try_write(&self) -> Result<RwLockWriteGuard<'_, T>> {
        self.inner
            .try_write()
            .ok_or_else(|| Error::new(ErrorKind::Busy, "read-write lock is already locked"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn write_lock_blocks_readers_until_released() {
        let lock = Arc::new(RwLock::new(0u32));
        let read_guard = lock.read();

        let progressed = Arc::new(AtomicBool::new(false));
        let handles: Vec<_> = (0..100)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let progressed = Arc::clone(&progressed);
                thread::spawn(move || {
                    let mut w = lock.write();
                    *w += 1;
                    progressed.store(true, Ordering::SeqCst);
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(10));
        assert!(!progressed.load(Ordering::SeqCst));

        drop(read_guard);
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*lock.read(), 100);
    }

    #[test]
    fn try_write_reports_busy_while_read_held() {
        let lock = RwLock::new(0);
        let _guard = lock.read();
        let err = lock.try_write().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Busy);
    }
}
