//! A thread-safe FIFO queue with blocking, timed and non-blocking put/get,
//! plus join-style completion tracking (`task_done` / `wait_all_complete`).

mod error;
mod threadpool;
mod utils;

pub use error::{Error, PutError, Result};
pub use threadpool::queue::{BlockingQueue, BlockingQueueRef};
pub use threadpool::threadpool::ThreadPool;
pub use utils::config::Config;
pub use utils::utils::set_log_level;
