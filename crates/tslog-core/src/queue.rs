//! Unbounded blocking FIFO shared by producers and the writer thread.
//!
//! Producers only ever [`push`](LineQueue::push); the single consumer parks in
//! [`wait_pop`](LineQueue::wait_pop). Closing is one-way: once closed, a queue
//! hands out what it still holds and then reports [`Popped::Closed`] forever.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::format::LogLine;

/// Result of [`LineQueue::wait_pop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popped<T> {
    /// The head of the queue
    Item(T),
    /// The queue is closed and has nothing left
    Closed,
}

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Mutex/condvar guarded FIFO with a close signal.
#[derive(Debug)]
pub struct LineQueue<T = LogLine> {
    state: Mutex<State<T>>,
    available: Condvar,
}

impl<T> LineQueue<T> {
    /// An empty, open queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Append to the tail and wake one waiting consumer.
    ///
    /// Never blocks beyond the short critical section and never fails.
    pub fn push(&self, item: T) {
        self.state.lock().items.push_back(item);
        self.available.notify_one();
    }

    /// Block until an item is available or the queue is closed and empty.
    pub fn wait_pop(&self) -> Popped<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Popped::Item(item);
            }
            if state.closed {
                return Popped::Closed;
            }
            // Spurious wakeups just go round the loop again.
            self.available.wait(&mut state);
        }
    }

    /// Mark the queue closed and wake every waiter. Idempotent.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Snapshot; may be stale as soon as it returns.
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }
}

impl<T> Default for LineQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
