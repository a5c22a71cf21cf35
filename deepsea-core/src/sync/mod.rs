//! Concurrency toolbox: blocking primitives backed by `parking_lot`, and
//! two hand-rolled spinlocks for the hot paths (profiler records, ref
//! counts) where a park/unpark round trip would dominate the cost of the
//! critical section itself.

mod condvar;
mod mutex;
mod rw_spinlock;
mod rwlock;
mod spinlock;

pub use condvar::CondVar;
pub use mutex::{Mutex, MutexGuard};
pub use rw_spinlock::{ReadGuard, ReadWriteSpinlock, WriteGuard};
pub use rwlock::{RwLock, RwLockReadGuard, RwLockWriteGuard};
pub use spinlock::{Spinlock, SpinlockGuard};
