//! Read-write spinlock: reader count and a writer flag packed into one
//! atomic word, per spec — writer spins until the whole word is zero
//! then CAS-sets the writer bit; readers CAS-increment only while the
//! writer bit is clear.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU32, Ordering};

const WRITER_BIT: u32 = 1 << 31;

/// A read-write spinlock around a `T`. Never suspends the calling thread.
pub struct ReadWriteSpinlock<T> {
    state: AtomicU32,
    value: UnsafeCell<T>,
}

// SAFETY: shared access is only granted through `ReadGuard`/`WriteGuard`,
// which the CAS loops below only hand out under the matching bit.
unsafe impl<T: Send> Sync for ReadWriteSpinlock<T> {}

impl<T> ReadWriteSpinlock<T> {
    /// A new, unlocked read-write spinlock around `value`.
    pub const fn new(value: T) -> Self {
        ReadWriteSpinlock { state: AtomicU32::new(0), value: UnsafeCell::new(value) }
    }

    /// Spins until a read lock is acquired. Any number of readers may
    /// hold the lock concurrently, so long as no writer holds it.
    pub fn read(&self) -> ReadGuard<'_, T> {
        loop {
            let current = self.state.load(Ordering::Relaxed);
            if current & WRITER_BIT != 0 {
                std::hint::spin_loop();
                continue;
            }
            if self
                .state
                .compare_exchange_weak(current, current + 1, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return ReadGuard { lock: self };
            }
        }
    }

    /// Spins until the exclusive write lock is acquired.
    pub fn write(&self) -> WriteGuard<'_, T> {
        loop {
            if self
                .state
                .compare_exchange_weak(0, WRITER_BIT, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return WriteGuard { lock: self };
            }
            std::hint::spin_loop();
        }
    }
}

/// RAII guard from [`ReadWriteSpinlock::read`].
pub struct ReadGuard<'a, T> {
    lock: &'a ReadWriteSpinlock<T>,
}

impl<'a, T> Deref for ReadGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: holding a read guard means the writer bit is clear and
        // the reader count includes this guard.
        unsafe { &*self.lock.value.get() }
    }
}

impl<'a, T> Drop for ReadGuard<'a, T> {
    fn drop(&mut self) {
        self.lock.state.fetch_sub(1, Ordering::Release);
    }
}

/// RAII guard from [`ReadWriteSpinlock::write`].
pub struct WriteGuard<'a, T> {
    lock: &'a ReadWriteSpinlock<T>,
}

impl<'a, T> Deref for WriteGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: the writer bit is exclusive; no reader can be active.
        unsafe { &*self.lock.value.get() }
    }
}

impl<'a, T> DerefMut for WriteGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: same as `Deref`.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<'a, T> Drop for WriteGuard<'a, T> {
    fn drop(&mut self) {
        self.lock.state.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering as O};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn write_lock_blocks_readers_until_released() {
        let lock = Arc::new(ReadWriteSpinlock::new(0u32));
        let read_guard = lock.read();

        let progressed = Arc::new(AtomicBool::new(false));
        let handles: Vec<_> = (0..100)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let progressed = Arc::clone(&progressed);
                thread::spawn(move || {
                    let mut w = lock.write();
                    *w += 1;
                    progressed.store(true, O::SeqCst);
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(10));
        assert!(!progressed.load(O::SeqCst));

        drop(read_guard);
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*lock.read(), 100);
    }

    #[test]
    fn concurrent_readers_do_not_block_each_other() {
        let lock = Arc::new(ReadWriteSpinlock::new(7u32));
        thread::scope(|scope| {
            for _ in 0..8 {
                let lock = Arc::clone(&lock);
                scope.spawn(move || {
                    for _ in 0..1000 {
                        assert_eq!(*lock.read(), 7);
                    }
                });
            }
        });
    }
}
