//! A stateless-besides-one-word spinlock, for the hot, short critical
//! sections (profiler records, ref-count bookkeeping) that don't justify
//! a park/unpark round trip.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

/// A spinlock guarding a `T`. Never suspends the calling thread; callers
/// must keep the critical section short.
pub struct Spinlock<T> {
    locked: AtomicBool,
    value: UnsafeCell<T>,
}

// SAFETY: access to `value` is only ever granted through a `SpinlockGuard`
// obtained while `locked` is held, which `lock`/`try_lock` enforce.
unsafe impl<T: Send> Sync for Spinlock<T> {}

impl<T> Spinlock<T> {
    /// A new, unlocked spinlock around `value`.
    pub const fn new(value: T) -> Self {
        Spinlock { locked: AtomicBool::new(false), value: UnsafeCell::new(value) }
    }

    /// Spins until the lock is acquired.
    pub fn lock(&self) -> SpinlockGuard<'_, T> {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
        SpinlockGuard { lock: self }
    }

    /// Acquires the lock only if it's immediately free.
    pub fn try_lock(&self) -> Option<SpinlockGuard<'_, T>> {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| SpinlockGuard { lock: self })
    }
}

/// RAII guard returned by [`Spinlock::lock`]; releases the lock on drop.
pub struct SpinlockGuard<'a, T> {
    lock: &'a Spinlock<T>,
}

impl<'a, T> Deref for SpinlockGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: holding the guard means `locked` is set by this thread.
        unsafe { &*self.lock.value.get() }
    }
}

impl<'a, T> DerefMut for SpinlockGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: same as `Deref`; exclusive because only one guard exists.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<'a, T> Drop for SpinlockGuard<'a, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn lock_excludes_concurrent_access() {
        let spinlock = Arc::new(Spinlock::new(0u32));
        thread::scope(|scope| {
            for _ in 0..8 {
                let spinlock = Arc::clone(&spinlock);
                scope.spawn(move || {
                    for _ in 0..2000 {
                        *spinlock.lock() += 1;
                    }
                });
            }
        });
        assert_eq!(*spinlock.lock(), 16000);
    }

    #[test]
    fn try_lock_fails_while_held() {
        let spinlock = Spinlock::new(0);
        let guard = spinlock.lock();
        assert!(spinlock.try_lock().is_none());
        drop(guard);
        assert!(spinlock.try_lock().is_some());
    }
}
