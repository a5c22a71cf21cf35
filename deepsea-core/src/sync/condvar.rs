//! Condition variable pairing with [`super::mutex::Mutex`]'s guard.

use std::time::Duration;

use parking_lot::Condvar as RawCondvar;

use super::mutex::MutexGuard;

/// A condition variable. Always used together with a
/// [`super::mutex::Mutex`] guard for the same protected state.
pub struct CondVar {
    inner: RawCondvar,
}

impl Default for CondVar {
    fn default() -> Self {
        Self::new()
    }
}

impl CondVar {
    /// A fresh condition variable with no waiters.
    pub fn new() -> Self {
        CondVar { inner: RawCondvar::new() }
    }

    /// Releases `guard` and blocks until notified, then re-acquires it.
    pub fn wait<'a, T>(&self, guard: &mut MutexGuard<'a, T>) {
        self.inner.wait(guard);
    }

    /// Like [`CondVar::wait`], but gives up after `timeout` and reports
    /// whether the wait actually timed out.
    pub fn timed_wait<'a, T>(&self, guard: &mut MutexGuard<'a, T>, timeout: Duration) -> bool {
        self.inner.wait_for(guard, timeout).timed_out()
    }

    /// Wakes one waiter, if any.
    pub fn notify_one(&self) {
        self.inner.notify_one();
    }

    /// Wakes every current waiter.
    pub fn notify_all(&self) {
        self.inner.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::super::mutex::Mutex;
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn notify_one_wakes_a_waiter() {
        let mutex = Arc::new(Mutex::new(false));
        let condvar = Arc::new(CondVar::new());

        let worker = {
            let mutex = Arc::clone(&mutex);
            let condvar = Arc::clone(&condvar);
            thread::spawn(move || {
                let mut ready = mutex.lock();
                while !*ready {
                    condvar.wait(&mut ready);
                }
            })
        };

        thread::sleep(std::time::Duration::from_millis(5));
        *mutex.lock() = true;
        condvar.notify_one();
        worker.join().unwrap();
    }

    #[test]
    fn timed_wait_reports_timeout() {
        let mutex = Mutex::new(false);
        let condvar = CondVar::new();
        let mut guard = mutex.lock();
        let timed_out = condvar.timed_wait(&mut guard, std::time::Duration::from_millis(5));
        assert!(timed_out);
    }
}
