//! A single task queue: bounded FIFO pending list plus an in-flight
//! counter capped by `max_concurrency`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::sync::{CondVar, Mutex};

use super::wake::WakeHandle;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

struct Inner {
    pending: VecDeque<Task>,
    in_flight: usize,
}

/// A FIFO queue of tasks dispatched by a [`super::ThreadPool`]'s workers.
/// `max_concurrency == 0` means "unbounded", i.e. limited only by the
/// pool's worker count.
pub struct ThreadTaskQueue {
    capacity: usize,
    max_concurrency: usize,
    inner: Mutex<Inner>,
    not_full: CondVar,
    drained: CondVar,
    wake: Arc<WakeHandle>,
}

impl ThreadTaskQueue {
    pub(super) fn new(capacity: usize, max_concurrency: usize, wake: Arc<WakeHandle>) -> Arc<Self> {
        Arc::new(ThreadTaskQueue {
            capacity,
            max_concurrency,
            inner: Mutex::new(Inner { pending: VecDeque::new(), in_flight: 0 }),
            not_full: CondVar::new(),
            drained: CondVar::new(),
            wake,
        })
    }

    /// Appends `tasks`, blocking while the queue is at `capacity`.
    pub fn add_tasks<I: IntoIterator<Item = Task>>(&self, tasks: I) {
        for task in tasks {
            let mut inner = self.inner.lock();
            while inner.pending.len() >= self.capacity {
                self.not_full.wait(&mut inner);
            }
            inner.pending.push_back(task);
            drop(inner);
            self.wake.notify();
        }
    }

    /// Blocks until every task enqueued so far has finished running.
    pub fn wait_for_tasks(&self) {
        let mut inner = self.inner.lock();
        while !(inner.pending.is_empty() && inner.in_flight == 0) {
            self.drained.wait(&mut inner);
        }
    }

    /// Number of tasks waiting plus currently running.
    pub fn outstanding(&self) -> usize {
        let inner = self.inner.lock();
        inner.pending.len() + inner.in_flight
    }

    pub(super) fn try_pop(&self) -> Option<Task> {
        let mut inner = self.inner.lock();
        let cap = if self.max_concurrency == 0 { usize::MAX } else { self.max_concurrency };
        if inner.pending.is_empty() || inner.in_flight >= cap {
            return None;
        }
        let task = inner.pending.pop_front();
        if task.is_some() {
            inner.in_flight += 1;
            self.not_full.notify_one();
        }
        task
    }

    pub(super) fn finish_one(&self) {
        let mut inner = self.inner.lock();
        inner.in_flight -= 1;
        if inner.pending.is_empty() && inner.in_flight == 0 {
            self.drained.notify_all();
        }
    }

    pub(super) fn wait_drained_with_timeout(&self, timeout: Duration) {
        let mut inner = self.inner.lock();
        if !(inner.pending.is_empty() && inner.in_flight == 0) {
            self.drained.timed_wait(&mut inner, timeout);
        }
    }

    pub(super) fn is_drained(&self) -> bool {
        let inner = self.inner.lock();
        inner.pending.is_empty() && inner.in_flight == 0
    }
}
