//! Thread pool and task queues: a dynamically-sized worker set dispatching
//! a dynamic set of FIFO queues in round-robin order, each with its own
//! pending capacity and concurrency cap.

mod pool;
mod task_queue;
mod wake;

pub use pool::ThreadPool;
pub use task_queue::{Task, ThreadTaskQueue};
