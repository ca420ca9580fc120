use super::queue::{BlockingQueue, BlockingQueueRef};
use crate::error::Result;
use log::{debug, error};
use num_cpus;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

enum Message {
    NewJob(Job),
    Terminate,
}

/// Fixed set of worker threads fed from a `BlockingQueue`.
///
/// Workers report each job through `task_done`, which is what lets
/// `wait_all` tell finished work apart from work that was only picked up.
pub struct ThreadPool {
    workers: Vec<Worker>,
    queue: BlockingQueueRef<Message>,
}
type Job = Box<dyn FnOnce() + Send + 'static>;

impl ThreadPool {
    /// `size == 0` picks one worker per cpu plus one. `backlog` bounds the
    /// number of jobs waiting for a worker; zero or less is unbounded.
    pub fn new(size: usize, backlog: i64) -> ThreadPool {
        let size = if size > 0 { size } else { num_cpus::get() + 1 };

        let queue = Arc::new(BlockingQueue::new(backlog));

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            workers.push(Worker::new(id, Arc::clone(&queue)));
        }
        debug!("Start {} worker.", workers.len());
        ThreadPool { workers, queue }
    }

    /// Queues `f`, waiting for room if the backlog is full.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push_back(Message::NewJob(Box::new(f)));
    }

    /// Queues `f` only if the backlog has room, failing with `Error::Full`
    /// otherwise.
    pub fn try_execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.put_nowait(Message::NewJob(Box::new(f)))?;
        Ok(())
    }

    /// Blocks until every job handed to the pool so far has run.
    pub fn wait_all(&self) {
        self.queue.wait_all_complete();
    }

    pub fn pending(&self) -> usize {
        self.queue.size()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        debug!("Sending terminate message to all workers.");

        for _ in &self.workers {
            self.queue.push_back(Message::Terminate);
        }
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!("worker {} exited abnormally", worker.id);
                }
            }
        }
        debug!("Shutting down {} worker", self.workers.len());
    }
}

struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(id: usize, queue: BlockingQueueRef<Message>) -> Worker {
        let thread = thread::spawn(move || loop {
            let message = queue.pop_front();
            let terminate = match message {
                Message::NewJob(job) => {
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        error!("worker {} job panicked", id);
                    }
                    false
                }
                Message::Terminate => true,
            };
            queue.task_done();
            if terminate {
                debug!("worker {} terminating", id);
                break;
            }
        });
        Worker {
            id,
            thread: Some(thread),
        }
    }
}
