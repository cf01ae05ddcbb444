//! Event groups: a shared bitmask tasks can wait on.
//!
//! `set` ORs bits in, `clear` ANDs them out, and `wait` blocks until
//! any or all of a mask are present. The observed bits are sampled and
//! optionally cleared in one step, so a waiter never loses the bits it
//! matched on.

use alloc::sync::Arc;

use crate::diag::{self, ResourceKind};
use crate::sched;
use crate::status::{Result, Status};

/// Match policy for [`EventGroup::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Any bit of the mask satisfies the wait.
    Any,
    /// Every bit of the mask must be present.
    All,
}

#[derive(Debug)]
struct EventInner {
    bits: spin::Mutex<u32>,
}

/// Handle to an event group. Clones refer to the same bitmask.
#[derive(Debug, Clone)]
pub struct EventGroup {
    inner: Arc<EventInner>,
}

impl EventGroup {
    /// Create an event group with all bits clear.
    pub fn create() -> Result<EventGroup> {
        let group = EventGroup {
            inner: Arc::new(EventInner {
                bits: spin::Mutex::new(0),
            }),
        };
        diag::on_create(ResourceKind::Event);
        Ok(group)
    }

    /// OR `bits` into the group.
    pub fn set(&self, bits: u32) {
        *self.inner.bits.lock() |= bits;
    }

    /// Clear `bits` from the group.
    pub fn clear(&self, bits: u32) {
        *self.inner.bits.lock() &= !bits;
    }

    /// Current bitmask.
    pub fn get(&self) -> u32 {
        *self.inner.bits.lock()
    }

    /// Wait until the mask condition holds, returning the bits observed
    /// at completion (before any clear-on-exit).
    pub fn wait(
        &self,
        bits: u32,
        mode: WaitMode,
        clear_on_exit: bool,
        timeout_ms: u32,
    ) -> Result<u32> {
        if bits == 0 {
            return Err(Status::InvalidParam);
        }
        let mut observed = 0u32;
        let satisfied = sched::block_until(
            || {
                let mut current = self.inner.bits.lock();
                let hit = match mode {
                    WaitMode::Any => *current & bits != 0,
                    WaitMode::All => *current & bits == bits,
                };
                if hit {
                    observed = *current;
                    if clear_on_exit {
                        *current &= !bits;
                    }
                }
                hit
            },
            timeout_ms,
        );
        if satisfied {
            Ok(observed)
        } else {
            Err(Status::Timeout)
        }
    }

    /// Destroy the event group.
    pub fn delete(self) -> Result<()> {
        diag::on_delete(ResourceKind::Event);
        Ok(())
    }
}
