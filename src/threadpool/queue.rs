use crate::error::{Error, PutError, Result};
use chrono::Duration;
use log::trace;
use std::collections::VecDeque;
use std::fmt;
use std::result;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

pub type BlockingQueueRef<T> = Arc<BlockingQueue<T>>;

struct State<T> {
    items: VecDeque<T>,
    // enqueued minus task_done() calls, not minus dequeues
    unfinished: usize,
}

/// A FIFO queue shared between producer and consumer threads.
///
/// One mutex guards the items and the unfinished-task counter. Three
/// condition variables hang off it: `not_empty` for getters, `not_full` for
/// putters on a bounded queue and `all_done` for `wait_all_complete`.
/// Every waiter re-checks its predicate after waking, so which of several
/// blocked threads gets a freed slot or a new item is unspecified.
///
/// Removing an item and finishing it are separate steps: `get` hands the
/// item out, `task_done` reports that the consumer is finished with it.
pub struct BlockingQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    all_done: Condvar,
    // 0 means unbounded
    capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    NoWait,
    Forever,
    Until(Instant),
}

impl Wait {
    fn new(block: bool, timeout: Option<Duration>) -> Result<Wait> {
        match timeout {
            Some(timeout) if timeout < Duration::zero() => Err(Error::InvalidArgument(format!(
                "'timeout' must be a non-negative duration, got {}",
                timeout
            ))),
            _ if !block => Ok(Wait::NoWait),
            None => Ok(Wait::Forever),
            Some(timeout) if timeout == Duration::zero() => Ok(Wait::Forever),
            Some(timeout) => {
                let timeout = timeout
                    .to_std()
                    .map_err(|e| Error::InvalidArgument(e.to_string()))?;
                // a deadline too far out to represent is as good as forever
                Ok(Instant::now()
                    .checked_add(timeout)
                    .map_or(Wait::Forever, Wait::Until))
            }
        }
    }
}

impl<T> BlockingQueue<T> {
    /// Creates an empty queue holding at most `max_size` items. Zero or a
    /// negative size makes it unbounded.
    pub fn new(max_size: i64) -> Self {
        let capacity = if max_size > 0 { max_size as usize } else { 0 };
        BlockingQueue {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                unfinished: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            all_done: Condvar::new(),
            capacity,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Appends `item` to the back of the queue.
    ///
    /// With `block` unset a full queue fails straight away. Otherwise the
    /// call waits for a free slot, for at most `timeout` if one is given.
    /// `None` and a zero timeout both mean wait forever. A negative timeout
    /// is rejected before the queue is looked at. On failure the item comes
    /// back inside the `PutError`.
    pub fn put(
        &self,
        item: T,
        block: bool,
        timeout: Option<Duration>,
    ) -> result::Result<(), PutError<T>> {
        let wait = match Wait::new(block, timeout) {
            Ok(wait) => wait,
            Err(e) => return Err(PutError::new(e, item)),
        };
        let state = self.lock();
        let (mut state, ready) = self.wait_while(&self.not_full, state, wait, |s| self.at_capacity(s));
        if !ready {
            trace!("put gave up, queue still full ({} items)", state.items.len());
            return Err(PutError::new(Error::Full, item));
        }
        self.enqueue(&mut state, item);
        Ok(())
    }

    pub fn put_nowait(&self, item: T) -> result::Result<(), PutError<T>> {
        self.put(item, false, None)
    }

    /// Appends `item`, waiting as long as it takes for a free slot.
    pub fn push_back(&self, item: T) {
        let state = self.lock();
        let (mut state, _) = self.wait_while(&self.not_full, state, Wait::Forever, |s| {
            self.at_capacity(s)
        });
        self.enqueue(&mut state, item);
    }

    /// Removes and returns the front item.
    ///
    /// Mirrors `put`: `Error::Empty` when nothing arrives in time,
    /// `Error::InvalidArgument` for a negative timeout. The unfinished-task
    /// count is left alone; call `task_done` once the item is handled.
    pub fn get(&self, block: bool, timeout: Option<Duration>) -> Result<T> {
        let wait = Wait::new(block, timeout)?;
        let state = self.lock();
        let (mut state, _) = self.wait_while(&self.not_empty, state, wait, |s| s.items.is_empty());
        match self.dequeue(&mut state) {
            Some(item) => Ok(item),
            None => {
                trace!("get gave up, queue still empty");
                Err(Error::Empty)
            }
        }
    }

    pub fn get_nowait(&self) -> Result<T> {
        self.get(false, None)
    }

    /// Removes the front item, waiting as long as it takes for one.
    pub fn pop_front(&self) -> T {
        let mut state = self.lock();
        loop {
            match self.dequeue(&mut state) {
                Some(item) => return item,
                None => state = self.wait(&self.not_empty, state),
            }
        }
    }

    /// Marks one previously enqueued item as fully processed.
    ///
    /// # Panics
    ///
    /// Panics when called more times than items were put. The lock is
    /// released first, so other threads can keep using the queue.
    pub fn task_done(&self) {
        let mut state = self.lock();
        if state.unfinished == 0 {
            drop(state);
            panic!("task_done() called too many times");
        }
        state.unfinished -= 1;
        if state.unfinished == 0 {
            self.all_done.notify_all();
        }
    }

    /// Blocks until every item ever put has been matched by a `task_done`.
    pub fn wait_all_complete(&self) {
        let state = self.lock();
        let _ = self.wait_while(&self.all_done, state, Wait::Forever, |s| s.unfinished != 0);
    }

    // The queries below are snapshots; they may be stale as soon as they return.

    pub fn size(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.at_capacity(&self.lock())
    }

    pub fn unfinished_tasks(&self) -> usize {
        self.lock().unfinished
    }

    /// The fixed item limit, or `None` for an unbounded queue.
    pub fn capacity(&self) -> Option<usize> {
        if self.capacity > 0 {
            Some(self.capacity)
        } else {
            None
        }
    }

    fn at_capacity(&self, state: &State<T>) -> bool {
        self.capacity > 0 && state.items.len() >= self.capacity
    }

    fn enqueue(&self, state: &mut State<T>, item: T) {
        state.items.push_back(item);
        state.unfinished += 1;
        debug_assert!(self.capacity == 0 || state.items.len() <= self.capacity);
        self.not_empty.notify_one();
    }

    fn dequeue(&self, state: &mut State<T>) -> Option<T> {
        let item = state.items.pop_front()?;
        self.not_full.notify_one();
        Some(item)
    }

    // Every method leaves State consistent before anything that can panic,
    // so a poisoned lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, cond: &Condvar, state: MutexGuard<'a, State<T>>) -> MutexGuard<'a, State<T>> {
        trace!("suspending, {} items resident", state.items.len());
        cond.wait(state).unwrap_or_else(PoisonError::into_inner)
    }

    /// Suspends on `cond` while `blocked` holds, within the limits of `wait`.
    /// Returns the reacquired guard and whether the predicate was cleared.
    fn wait_while<'a, F>(
        &self,
        cond: &Condvar,
        mut state: MutexGuard<'a, State<T>>,
        wait: Wait,
        mut blocked: F,
    ) -> (MutexGuard<'a, State<T>>, bool)
    where
        F: FnMut(&State<T>) -> bool,
    {
        loop {
            if !blocked(&*state) {
                return (state, true);
            }
            match wait {
                Wait::NoWait => return (state, false),
                Wait::Forever => state = self.wait(cond, state),
                Wait::Until(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        trace!("wait deadline passed");
                        return (state, false);
                    }
                    state = cond
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let state = self.lock();
        write!(
            fmt,
            "BlockingQueue[{}/{} unfinished: {}]",
            state.items.len(),
            self.capacity,
            state.unfinished
        )
    }
}
