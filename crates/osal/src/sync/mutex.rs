//! Recursive mutex with owner tracking.
//!
//! At most one task holds the mutex; the owner may re-lock to any
//! depth and must unlock the same number of times. Ownership is
//! checked on unlock, so a non-owner release is rejected instead of
//! corrupting the lock.

use alloc::sync::Arc;

use crate::diag::{self, ResourceKind};
use crate::sched::{self, TaskId};
use crate::status::{Result, Status};

#[derive(Debug)]
struct MutexState {
    owner: Option<TaskId>,
    depth: u32,
}

#[derive(Debug)]
struct MutexInner {
    state: spin::Mutex<MutexState>,
}

/// Handle to a recursive mutex. Clones refer to the same lock.
#[derive(Debug, Clone)]
pub struct Mutex {
    inner: Arc<MutexInner>,
}

impl Mutex {
    /// Create an unlocked mutex.
    pub fn create() -> Result<Mutex> {
        let mutex = Mutex {
            inner: Arc::new(MutexInner {
                state: spin::Mutex::new(MutexState {
                    owner: None,
                    depth: 0,
                }),
            }),
        };
        diag::on_create(ResourceKind::Mutex);
        Ok(mutex)
    }

    /// Acquire the mutex, waiting up to `timeout_ms`.
    ///
    /// Re-locking by the owner nests. Expiry returns `Timeout`.
    pub fn lock(&self, timeout_ms: u32) -> Result<()> {
        let me = sched::current();
        let acquired = sched::block_until(
            || {
                let mut state = self.inner.state.lock();
                match state.owner {
                    None => {
                        state.owner = Some(me);
                        state.depth = 1;
                        true
                    }
                    Some(owner) if owner == me => {
                        state.depth += 1;
                        true
                    }
                    Some(_) => false,
                }
            },
            timeout_ms,
        );
        if acquired {
            Ok(())
        } else {
            Err(Status::Timeout)
        }
    }

    /// Release one nesting level. Only the owner may unlock.
    pub fn unlock(&self) -> Result<()> {
        let me = sched::current();
        let mut state = self.inner.state.lock();
        if state.owner != Some(me) {
            return Err(Status::InvalidState);
        }
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
        }
        Ok(())
    }

    /// True while any task holds the mutex.
    pub fn is_locked(&self) -> bool {
        self.inner.state.lock().owner.is_some()
    }

    /// Current owner, or `None` when unlocked.
    pub fn owner(&self) -> Option<TaskId> {
        self.inner.state.lock().owner
    }

    /// Destroy the mutex. Refused while held.
    pub fn delete(self) -> Result<()> {
        if self.is_locked() {
            return Err(Status::ResourceBusy);
        }
        diag::on_delete(ResourceKind::Mutex);
        Ok(())
    }
}
