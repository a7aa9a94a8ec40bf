//! A queue with atomic reservation semantics.
//!
//! Workers *reserve* an element before dequeuing it, so that another
//! worker checking `can_reserve` while the first is still dispatching does
//! not see a theoretically available item.  The reserve/dequeue pair and
//! `can_reserve` share one mutex.

use std::collections::VecDeque;
use std::sync::Mutex;

type EnqueueCallback = Box<dyn Fn() + Send + Sync>;

struct Inner<T> {
    queue: VecDeque<T>,
    num_reserved: usize,
}

/// A mutex-guarded FIFO queue with reservations and an optional
/// on-enqueue callback (used to signal worker availability).
pub struct SyncQueue<T> {
    inner: Mutex<Inner<T>>,
    callback: Option<EnqueueCallback>,
}

impl<T> Default for SyncQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SyncQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { queue: VecDeque::new(), num_reserved: 0 }),
            callback: None,
        }
    }

    /// A queue that invokes `callback` after every enqueue.
    pub fn with_callback(callback: EnqueueCallback) -> Self {
        Self {
            inner: Mutex::new(Inner { queue: VecDeque::new(), num_reserved: 0 }),
            callback: Some(callback),
        }
    }

    /// Add an element to the back.
    pub fn enqueue(&self, element: T) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.queue.push_back(element);
        }
        if let Some(callback) = &self.callback {
            callback();
        }
    }

    /// Get and remove the element in front, consuming one reservation.
    ///
    /// Returns `None` when nothing was reserved.  A reservation against an
    /// element that is no longer there is released rather than leaked.
    pub fn dequeue(&self) -> Option<T> {
        let mut inner = self.inner.lock().unwrap();
        if inner.num_reserved == 0 {
            return None;
        }
        inner.num_reserved -= 1;
        inner.queue.pop_front()
    }

    /// Reserve one element ahead of a dequeue.
    pub fn reserve(&self) {
        self.inner.lock().unwrap().num_reserved += 1;
    }

    /// Atomically reserve an element if an unreserved one is available.
    pub fn try_reserve(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.queue.len() > inner.num_reserved {
            inner.num_reserved += 1;
            true
        } else {
            false
        }
    }

    /// Whether an unreserved element is available.
    pub fn can_reserve(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.queue.len() > inner.num_reserved
    }

    pub fn num_reserved(&self) -> usize {
        self.inner.lock().unwrap().num_reserved
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().queue.is_empty()
    }

    /// Take every queued element at once (reservations are untouched).
    pub fn drain_all(&self) -> Vec<T> {
        let mut inner = self.inner.lock().unwrap();
        inner.queue.drain(..).collect()
    }
}
