//! Worker pool driving a dynamic set of [`ThreadTaskQueue`]s in
//! round-robin order.

use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};
use crate::sync::Mutex;

use super::task_queue::{Task, ThreadTaskQueue};
use super::wake::WakeHandle;

const IDLE_POLL: Duration = Duration::from_millis(20);

struct Shared {
    queues: Mutex<Vec<Arc<ThreadTaskQueue>>>,
    cursor: AtomicUsize,
    shutdown: AtomicBool,
    /// Number of running workers that should exit at their next chance,
    /// decremented by whichever worker claims the exit slot first.
    excess: AtomicIsize,
    wake: Arc<WakeHandle>,
}

impl Shared {
    fn try_pop_task(&self) -> Option<(Arc<ThreadTaskQueue>, Task)> {
        let queues = self.queues.lock().clone();
        if queues.is_empty() {
            return None;
        }
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % queues.len();
        for i in 0..queues.len() {
            let queue = &queues[(start + i) % queues.len()];
            if let Some(task) = queue.try_pop() {
                return Some((Arc::clone(queue), task));
            }
        }
        None
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        if shared.shutdown.load(Ordering::Acquire) {
            return;
        }
        match shared.try_pop_task() {
            Some((queue, task)) => {
                task();
                queue.finish_one();
            }
            None => {
                if shared.shutdown.load(Ordering::Acquire) {
                    return;
                }
                loop {
                    let current = shared.excess.load(Ordering::Acquire);
                    if current <= 0 {
                        break;
                    }
                    if shared
                        .excess
                        .compare_exchange(current, current - 1, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                shared.wake.wait_timeout(IDLE_POLL);
            }
        }
    }
}

/// A fixed-identity pool of worker threads, dispatching tasks from a
/// dynamic set of [`ThreadTaskQueue`]s in round-robin order, each subject
/// to its own `max_concurrency`.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPool {
    /// Spawns a pool with `thread_count` workers.
    pub fn new(thread_count: usize) -> Self {
        let shared = Arc::new(Shared {
            queues: Mutex::new(Vec::new()),
            cursor: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            excess: AtomicIsize::new(0),
            wake: Arc::new(WakeHandle::new()),
        });
        let mut workers = Vec::with_capacity(thread_count);
        for _ in 0..thread_count {
            workers.push(spawn_worker(Arc::clone(&shared)));
        }
        ThreadPool { shared, workers: Mutex::new(workers) }
    }

    /// Creates a new task queue dispatched by this pool.
    pub fn create_queue(&self, capacity: usize, max_concurrency: usize) -> Arc<ThreadTaskQueue> {
        let queue = ThreadTaskQueue::new(capacity, max_concurrency, Arc::clone(&self.shared.wake));
        self.shared.queues.lock().push(Arc::clone(&queue));
        queue
    }

    /// Removes `queue` from this pool's dispatch set once its outstanding
    /// tasks have finished.
    pub fn remove_queue(&self, queue: &Arc<ThreadTaskQueue>) {
        queue.wait_for_tasks();
        self.shared.queues.lock().retain(|q| !Arc::ptr_eq(q, queue));
    }

    /// Like [`ThreadPool::remove_queue`], but gives up waiting after
    /// `timeout` if the queue has not drained. Returns `false` (leaving
    /// `queue` registered) rather than removing a queue workers might still
    /// be dispatching into.
    pub fn remove_queue_with_timeout(&self, queue: &Arc<ThreadTaskQueue>, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while !queue.is_drained() {
            let remaining = match deadline.checked_duration_since(std::time::Instant::now()) {
                Some(remaining) if !remaining.is_zero() => remaining,
                _ => return false,
            };
            queue.wait_drained_with_timeout(remaining);
        }
        self.shared.queues.lock().retain(|q| !Arc::ptr_eq(q, queue));
        true
    }

    /// Number of currently-running worker threads.
    pub fn thread_count(&self) -> usize {
        self.reap();
        self.workers.lock().len()
    }

    fn reap(&self) {
        self.workers.lock().retain(|handle| !handle.is_finished());
    }

    /// Grows the pool by spawning workers, or shrinks it by marking the
    /// excess count; shrinking workers exit only after finishing whatever
    /// task they're currently running.
    pub fn set_thread_count(&self, n: usize) {
        self.reap();
        let mut workers = self.workers.lock();
        if n > workers.len() {
            log::debug!("growing thread pool from {} to {} workers", workers.len(), n);
            for _ in workers.len()..n {
                workers.push(spawn_worker(Arc::clone(&self.shared)));
            }
        } else if n < workers.len() {
            log::debug!("shrinking thread pool from {} to {} workers", workers.len(), n);
            let delta = (workers.len() - n) as isize;
            self.shared.excess.fetch_add(delta, Ordering::AcqRel);
            self.shared.wake.notify();
        }
    }

    /// Shuts the pool down, joining every worker. Fails with
    /// [`ErrorKind::PermissionDenied`] if any queue still exists — callers
    /// must [`ThreadPool::remove_queue`] every queue first.
    pub fn destroy(self) -> Result<()> {
        if !self.shared.queues.lock().is_empty() {
            return Err(Error::new(
                ErrorKind::PermissionDenied,
                "cannot destroy a thread pool with live queues",
            ));
        }
        log::debug!("destroying thread pool");
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.wake.notify();
        for handle in self.workers.lock().drain(..) {
            let _ = handle.join();
        }
        Ok(())
    }
}

fn spawn_worker(shared: Arc<Shared>) -> JoinHandle<()> {
    std::thread::spawn(move || worker_loop(shared))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize as Counter;
    use std::sync::Mutex as StdMutex;
    use std::thread;
    use std::time::Duration as D;

    #[test]
    fn wait_for_tasks_counts_every_enqueued_task() {
        let pool = ThreadPool::new(4);
        let queue = pool.create_queue(64, 0);
        let finished = Arc::new(Counter::new(0));

        let tasks: Vec<Task> = (0..30)
            .map(|_| {
                let finished = Arc::clone(&finished);
                Box::new(move || {
                    finished.fetch_add(1, Ordering::SeqCst);
                }) as Task
            })
            .collect();
        queue.add_tasks(tasks);
        queue.wait_for_tasks();

        assert_eq!(finished.load(Ordering::SeqCst), 30);
        pool.remove_queue(&queue);
        pool.destroy().unwrap();
    }

    #[test]
    fn max_concurrency_caps_observed_overlap() {
        let pool = ThreadPool::new(4);
        let queue = pool.create_queue(20, 2);
        let current = Arc::new(Counter::new(0));
        let max_seen = Arc::new(Counter::new(0));

        let tasks: Vec<Task> = (0..20)
            .map(|_| {
                let current = Arc::clone(&current);
                let max_seen = Arc::clone(&max_seen);
                Box::new(move || {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(D::from_millis(1));
                    current.fetch_sub(1, Ordering::SeqCst);
                }) as Task
            })
            .collect();
        queue.add_tasks(tasks);
        queue.wait_for_tasks();

        assert!(max_seen.load(Ordering::SeqCst) <= 2);
        pool.remove_queue(&queue);
        pool.destroy().unwrap();
    }

    #[test]
    fn round_robin_interleaves_single_worker_across_queues() {
        let pool = ThreadPool::new(1);
        let queue_a = pool.create_queue(8, 0);
        let queue_b = pool.create_queue(8, 0);
        let order = Arc::new(StdMutex::new(Vec::new()));

        let mut tasks_a: Vec<Task> = Vec::new();
        let mut tasks_b: Vec<Task> = Vec::new();
        for t in 0..3 {
            let order_a = Arc::clone(&order);
            tasks_a.push(Box::new(move || order_a.lock().unwrap().push(('a', t))));
            let order_b = Arc::clone(&order);
            tasks_b.push(Box::new(move || order_b.lock().unwrap().push(('b', t))));
        }
        queue_a.add_tasks(tasks_a);
        queue_b.add_tasks(tasks_b);
        queue_a.wait_for_tasks();
        queue_b.wait_for_tasks();

        let recorded = order.lock().unwrap().clone();
        assert_eq!(recorded.len(), 6);
        pool.remove_queue(&queue_a);
        pool.remove_queue(&queue_b);
        pool.destroy().unwrap();
    }

    #[test]
    fn remove_queue_with_timeout_gives_up_on_a_stuck_task() {
        let pool = ThreadPool::new(1);
        let queue = pool.create_queue(4, 0);
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        queue.add_tasks(vec![Box::new(move || {
            let _ = release_rx.recv();
        }) as Task]);

        assert!(!pool.remove_queue_with_timeout(&queue, D::from_millis(20)));

        release_tx.send(()).unwrap();
        pool.remove_queue(&queue);
        pool.destroy().unwrap();
    }

    #[test]
    fn remove_queue_with_timeout_succeeds_once_drained() {
        let pool = ThreadPool::new(1);
        let queue = pool.create_queue(4, 0);
        queue.add_tasks(vec![Box::new(|| ()) as Task]);

        assert!(pool.remove_queue_with_timeout(&queue, D::from_secs(1)));
        pool.destroy().unwrap();
    }

    #[test]
    fn destroy_fails_while_queue_still_registered() {
        let pool = ThreadPool::new(1);
        let _queue = pool.create_queue(4, 0);
        let err = pool.destroy().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }
}
