//! Per-camera frame queue
//!
//! Bounded FIFO backed by a ring buffer. When full, the oldest frame is evicted
//! to make room, so the render loop always sees the most recent images.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::Frame;
use ringbuf::{traits::*, HeapRb};

/// Thread-safe bounded frame queue
///
/// Producer is the camera callback thread, consumer is the render loop.
/// All locking is internal.
pub struct FrameQueue {
    inner: Mutex<HeapRb<Frame>>,
    capacity: usize,
}

impl fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl FrameQueue {
    /// Create a queue holding at most `capacity` frames (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(HeapRb::new(capacity)),
            capacity,
        }
    }

    /// Push a frame, evicting the oldest one if the queue is full
    ///
    /// Returns `true` when a frame was evicted.
    pub fn push(&self, frame: Frame) -> bool {
        let mut rb = self.lock();
        let evicted = if rb.is_full() {
            rb.try_pop().is_some()
        } else {
            false
        };
        let _ = rb.try_push(frame);
        evicted
    }

    /// Pop the oldest frame
    pub fn try_pop(&self) -> Option<Frame> {
        self.lock().try_pop()
    }

    pub fn len(&self) -> usize {
        self.lock().occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discard every queued frame, returning how many were discarded
    pub fn clear(&self) -> usize {
        self.lock().clear()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HeapRb<Frame>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
