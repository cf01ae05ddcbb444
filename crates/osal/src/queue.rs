//! Bounded FIFO queues.
//!
//! Fixed-capacity ring buffer over `MaybeUninit` storage, guarded by a
//! spin lock so any number of producers and consumers keep strict FIFO
//! order per queue. Two send policies: `Normal` blocks (or fails) when
//! full, `Overwrite` displaces the oldest element. `send_front` is the
//! priority insert and deliberately violates FIFO.
//!
//! The `_from_isr` variants attempt exactly once and never block.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::mem::MaybeUninit;

use crate::config::QUEUE_MAX_ITEM_SIZE;
use crate::diag::{self, ResourceKind};
use crate::sched;
use crate::status::{Result, Status};
use crate::time::NO_WAIT;

/// Policy applied by `send` when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    /// Wait for space; fail with `Full` on expiry.
    Normal,
    /// Displace the oldest element; `send` always succeeds.
    Overwrite,
}

struct Ring<T: Copy> {
    buf: Box<[MaybeUninit<T>]>,
    head: usize,
    len: usize,
}

impl<T: Copy> Ring<T> {
    fn new(capacity: usize) -> Self {
        let buf: Vec<MaybeUninit<T>> = (0..capacity).map(|_| MaybeUninit::uninit()).collect();
        Self {
            buf: buf.into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn push_back(&mut self, value: T) -> bool {
        if self.len == self.capacity() {
            return false;
        }
        let idx = (self.head + self.len) % self.capacity();
        self.buf[idx].write(value);
        self.len += 1;
        true
    }

    fn push_front(&mut self, value: T) -> bool {
        if self.len == self.capacity() {
            return false;
        }
        self.head = (self.head + self.capacity() - 1) % self.capacity();
        self.buf[self.head].write(value);
        self.len += 1;
        true
    }

    fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        // Safety: slots in [head, head+len) always hold initialized items.
        let value = unsafe { self.buf[self.head].assume_init_read() };
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        Some(value)
    }

    fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let idx = (self.head + self.len - 1) % self.capacity();
        self.len -= 1;
        // Safety: same occupancy invariant as pop_front.
        Some(unsafe { self.buf[idx].assume_init_read() })
    }

    fn front(&self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        // Safety: same occupancy invariant as pop_front.
        Some(unsafe { self.buf[self.head].assume_init_read() })
    }
}

struct QueueInner<T: Copy> {
    ring: spin::Mutex<Ring<T>>,
    mode: QueueMode,
}

/// Handle to a bounded queue. Clones refer to the same ring.
#[derive(Clone)]
pub struct Queue<T: Copy + Send> {
    inner: Arc<QueueInner<T>>,
}

impl<T: Copy + Send> Queue<T> {
    /// Create a `Normal`-mode queue holding `capacity` items.
    pub fn create(capacity: usize) -> Result<Queue<T>> {
        Queue::create_with_mode(capacity, QueueMode::Normal)
    }

    /// Create a queue with an explicit full-queue policy.
    ///
    /// The item type must have a nonzero size no larger than
    /// `QUEUE_MAX_ITEM_SIZE`.
    pub fn create_with_mode(capacity: usize, mode: QueueMode) -> Result<Queue<T>> {
        if capacity == 0 {
            return Err(Status::InvalidParam);
        }
        let item_size = core::mem::size_of::<T>();
        if item_size == 0 || item_size > QUEUE_MAX_ITEM_SIZE {
            return Err(Status::InvalidSize);
        }
        let queue = Queue {
            inner: Arc::new(QueueInner {
                ring: spin::Mutex::new(Ring::new(capacity)),
                mode,
            }),
        };
        diag::on_create(ResourceKind::Queue);
        Ok(queue)
    }

    fn try_send_back(&self, item: T) -> bool {
        let mut ring = self.inner.ring.lock();
        if ring.push_back(item) {
            return true;
        }
        if self.inner.mode == QueueMode::Overwrite {
            ring.pop_front();
            return ring.push_back(item);
        }
        false
    }

    fn try_send_front(&self, item: T) -> bool {
        let mut ring = self.inner.ring.lock();
        if ring.push_front(item) {
            return true;
        }
        if self.inner.mode == QueueMode::Overwrite {
            ring.pop_back();
            return ring.push_front(item);
        }
        false
    }

    /// Append `item`, waiting up to `timeout_ms` for space.
    ///
    /// A full `Normal` queue yields `Full`, on `NO_WAIT` as well as
    /// after an exhausted timeout. `Overwrite` mode never fails.
    pub fn send(&self, item: T, timeout_ms: u32) -> Result<()> {
        if sched::block_until(|| self.try_send_back(item), timeout_ms) {
            Ok(())
        } else {
            Err(Status::Full)
        }
    }

    /// Priority insert at the head of the queue.
    pub fn send_front(&self, item: T, timeout_ms: u32) -> Result<()> {
        if sched::block_until(|| self.try_send_front(item), timeout_ms) {
            Ok(())
        } else {
            Err(Status::Full)
        }
    }

    /// Remove and return the oldest item.
    ///
    /// Empty with `NO_WAIT` yields `Empty`; an exhausted positive
    /// timeout yields `Timeout`.
    pub fn receive(&self, timeout_ms: u32) -> Result<T> {
        let mut taken: Option<T> = None;
        sched::block_until(
            || {
                taken = self.inner.ring.lock().pop_front();
                taken.is_some()
            },
            timeout_ms,
        );
        match taken {
            Some(value) => Ok(value),
            None if timeout_ms == NO_WAIT => Err(Status::Empty),
            None => Err(Status::Timeout),
        }
    }

    /// Copy the front item without removing it.
    pub fn peek(&self) -> Result<T> {
        self.inner.ring.lock().front().ok_or(Status::Empty)
    }

    /// Non-blocking send for interrupt context.
    pub fn send_from_isr(&self, item: T) -> Result<()> {
        if self.try_send_back(item) {
            Ok(())
        } else {
            Err(Status::Full)
        }
    }

    /// Non-blocking receive for interrupt context.
    pub fn receive_from_isr(&self) -> Result<T> {
        self.inner.ring.lock().pop_front().ok_or(Status::Empty)
    }

    /// Non-blocking peek for interrupt context.
    pub fn peek_from_isr(&self) -> Result<T> {
        self.peek()
    }

    /// Discard every queued item.
    pub fn reset(&self) {
        let mut ring = self.inner.ring.lock();
        ring.head = 0;
        ring.len = 0;
    }

    /// Items currently queued.
    pub fn len(&self) -> usize {
        self.inner.ring.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        let ring = self.inner.ring.lock();
        ring.len == ring.capacity()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.inner.ring.lock().capacity()
    }

    /// Free slots. `len() + space() == capacity()` always holds.
    pub fn space(&self) -> usize {
        let ring = self.inner.ring.lock();
        ring.capacity() - ring.len
    }

    /// Destroy the queue.
    pub fn delete(self) -> Result<()> {
        diag::on_delete(ResourceKind::Queue);
        Ok(())
    }
}
