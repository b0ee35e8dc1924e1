//! Bounded event queue between the replay producer and the strategy
//! consumer. A plain `Mutex<VecDeque>` with two condvars: producers block
//! at the depth ceiling, consumers block on empty. Closing the queue wakes
//! everyone; a blocked push then fails instead of deadlocking.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// The queue was closed while pushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueClosed;

struct Inner<T> {
    queue: VecDeque<T>,
    closed: bool,
}

pub struct EventQueue<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    below_ceiling: Condvar,
    ceiling: usize,
}

impl<T> EventQueue<T> {
    pub fn new(ceiling: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
            below_ceiling: Condvar::new(),
            ceiling: ceiling.max(1),
        }
    }

    /// Blocking push. Waits while the queue sits at its ceiling.
    pub fn push(&self, item: T) -> Result<(), QueueClosed> {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        while inner.queue.len() >= self.ceiling && !inner.closed {
            inner = self
                .below_ceiling
                .wait(inner)
                .expect("queue mutex poisoned");
        }
        if inner.closed {
            return Err(QueueClosed);
        }
        inner.queue.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Blocking pop. Returns `None` once the queue is closed and drained.
    pub fn pop(&self) -> Option<T> {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        while inner.queue.is_empty() && !inner.closed {
            inner = self.not_empty.wait(inner).expect("queue mutex poisoned");
        }
        let item = inner.queue.pop_front();
        if item.is_some() {
            self.below_ceiling.notify_one();
        }
        item
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("queue mutex poisoned").queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the queue: pending items stay poppable, further pushes fail,
    /// all waiters wake.
    pub fn close(&self) {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        inner.closed = true;
        self.not_empty.notify_all();
        self.below_ceiling.notify_all();
    }
}

/// Shared cancellation flag, checked by the producer at every batch and
/// row boundary and by the consumer between events.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
