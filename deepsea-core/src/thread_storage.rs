//! Per-thread object storage whose destructor runs exactly once per
//! (storage, thread) pair that ever held a value — whichever comes
//! first, the thread exiting or the storage itself being destroyed.
//!
//! The source relies on platform TLS destructors plus a registry walk;
//! this exposes the same guarantee through a single safe API
//! (`set`/`get`/`take`/`destroy`) backed by a thread-local exit-hook list
//! instead of raw platform TLS callbacks.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use crate::sync::Mutex;

struct ExitHooks(RefCell<Vec<Box<dyn FnOnce()>>>);

impl Drop for ExitHooks {
    fn drop(&mut self) {
        for hook in self.0.borrow_mut().drain(..) {
            hook();
        }
    }
}

thread_local! {
    static EXIT_HOOKS: ExitHooks = ExitHooks(RefCell::new(Vec::new()));
}

fn register_exit_hook(hook: impl FnOnce() + 'static) {
    EXIT_HOOKS.with(|hooks| hooks.0.borrow_mut().push(Box::new(hook)));
}

struct Inner<T> {
    dtor: Box<dyn Fn(T) + Send + Sync>,
    slots: Mutex<HashMap<ThreadId, T>>,
    registered: Mutex<HashSet<ThreadId>>,
}

/// A per-thread slot for a `T`, with a destructor invoked on whichever
/// happens first: the owning thread exiting, or [`ThreadObjectStorage::destroy`].
pub struct ThreadObjectStorage<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + Clone + 'static> ThreadObjectStorage<T> {
    /// Creates storage that runs `dtor` on whatever value a thread last
    /// set, once that thread exits or the storage is destroyed.
    pub fn new(dtor: impl Fn(T) + Send + Sync + 'static) -> Self {
        ThreadObjectStorage {
            inner: Arc::new(Inner {
                dtor: Box::new(dtor),
                slots: Mutex::new(HashMap::new()),
                registered: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Stores `value` for the calling thread. If the thread previously
    /// set a different value, the destructor runs on the old one first.
    pub fn set(&self, value: T) {
        let tid = thread::current().id();
        let previous = self.inner.slots.lock().insert(tid, value);
        if let Some(previous) = previous {
            (self.inner.dtor)(previous);
        }

        let mut registered = self.inner.registered.lock();
        if registered.insert(tid) {
            let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
            register_exit_hook(move || {
                if let Some(inner) = weak.upgrade() {
                    let value = inner.slots.lock().remove(&tid);
                    if let Some(value) = value {
                        (inner.dtor)(value);
                    }
                    inner.registered.lock().remove(&tid);
                }
            });
        }
    }

    /// Returns a clone of the calling thread's stored value, if any.
    pub fn get(&self) -> Option<T> {
        let tid = thread::current().id();
        self.inner.slots.lock().get(&tid).cloned()
    }

    /// Removes and returns the calling thread's stored value without
    /// running the destructor.
    pub fn take(&self) -> Option<T> {
        let tid = thread::current().id();
        self.inner.slots.lock().remove(&tid)
    }

    /// Runs the destructor on every thread's remaining value and clears
    /// the storage. Consumes `self`: no further `set` calls are possible
    /// through this handle.
    pub fn destroy(self) {
        let remaining: Vec<T> = self.inner.slots.lock().drain().map(|(_, v)| v).collect();
        for value in remaining {
            (self.inner.dtor)(value);
        }
        self.inner.registered.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;

    #[test]
    fn set_then_get_round_trips_on_same_thread() {
        let storage = ThreadObjectStorage::new(|_: u32| {});
        storage.set(42);
        assert_eq!(storage.get(), Some(42));
    }

    #[test]
    fn setting_a_new_value_destroys_the_old_one() {
        let destroyed = StdArc::new(AtomicUsize::new(0));
        let destroyed_clone = StdArc::clone(&destroyed);
        let storage = ThreadObjectStorage::new(move |_: u32| {
            destroyed_clone.fetch_add(1, Ordering::SeqCst);
        });
        storage.set(1);
        storage.set(2);
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
        assert_eq!(storage.get(), Some(2));
    }

    #[test]
    fn take_does_not_run_the_destructor() {
        let destroyed = StdArc::new(AtomicUsize::new(0));
        let destroyed_clone = StdArc::clone(&destroyed);
        let storage = ThreadObjectStorage::new(move |_: u32| {
            destroyed_clone.fetch_add(1, Ordering::SeqCst);
        });
        storage.set(1);
        assert_eq!(storage.take(), Some(1));
        assert_eq!(destroyed.load(Ordering::SeqCst), 0);
        assert_eq!(storage.get(), None);
    }

    #[test]
    fn destroy_runs_the_destructor_on_remaining_threads() {
        let destroyed = StdArc::new(AtomicUsize::new(0));
        let destroyed_clone = StdArc::clone(&destroyed);
        let storage = ThreadObjectStorage::new(move |_: u32| {
            destroyed_clone.fetch_add(1, Ordering::SeqCst);
        });
        storage.set(7);
        storage.destroy();
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn thread_exit_runs_the_destructor_exactly_once() {
        let destroyed = StdArc::new(AtomicUsize::new(0));
        let destroyed_clone = StdArc::clone(&destroyed);
        let storage = StdArc::new(ThreadObjectStorage::new(move |_: u32| {
            destroyed_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let storage_clone = StdArc::clone(&storage);
        thread::spawn(move || {
            storage_clone.set(99);
        })
        .join()
        .unwrap();

        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }
}
