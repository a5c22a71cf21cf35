//! Shared idle-worker wakeup: a mutex/condvar pair handed to every queue
//! so pushing a task (or shrinking the pool) can rouse a sleeping worker.

use std::time::Duration;

use crate::sync::{CondVar, Mutex};

pub(super) struct WakeHandle {
    gate: Mutex<()>,
    cv: CondVar,
}

impl WakeHandle {
    pub(super) fn new() -> Self {
        WakeHandle { gate: Mutex::new(()), cv: CondVar::new() }
    }

    pub(super) fn notify(&self) {
        self.cv.notify_all();
    }

    pub(super) fn wait_timeout(&self, timeout: Duration) {
        let mut guard = self.gate.lock();
        self.cv.timed_wait(&mut guard, timeout);
    }
}
