//! Counting and binary semaphores.
//!
//! The count stays in `0..=max`. `give` saturates at the maximum;
//! `take` decrements atomically and blocks while the count is zero.
//! The ISR variants never block.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::diag::{self, ResourceKind};
use crate::sched;
use crate::status::{Result, Status};

#[derive(Debug)]
struct SemInner {
    count: AtomicU32,
    max: u32,
}

/// Handle to a semaphore. Clones refer to the same count.
#[derive(Debug, Clone)]
pub struct Semaphore {
    inner: Arc<SemInner>,
}

impl Semaphore {
    /// Create a semaphore with `initial` tokens and ceiling `max`.
    pub fn create(initial: u32, max: u32) -> Result<Semaphore> {
        if max == 0 || initial > max {
            return Err(Status::InvalidParam);
        }
        let sem = Semaphore {
            inner: Arc::new(SemInner {
                count: AtomicU32::new(initial),
                max,
            }),
        };
        diag::on_create(ResourceKind::Semaphore);
        Ok(sem)
    }

    /// Binary semaphore: ceiling 1.
    pub fn create_binary(initial: u32) -> Result<Semaphore> {
        Semaphore::create(initial, 1)
    }

    /// Counting semaphore, FreeRTOS argument order.
    pub fn create_counting(max: u32, initial: u32) -> Result<Semaphore> {
        Semaphore::create(initial, max)
    }

    fn try_take(&self) -> bool {
        let mut count = self.inner.count.load(Ordering::Acquire);
        loop {
            if count == 0 {
                return false;
            }
            match self.inner.count.compare_exchange_weak(
                count,
                count - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => count = observed,
            }
        }
    }

    /// Take one token, waiting up to `timeout_ms`.
    pub fn take(&self, timeout_ms: u32) -> Result<()> {
        if sched::block_until(|| self.try_take(), timeout_ms) {
            Ok(())
        } else {
            Err(Status::Timeout)
        }
    }

    /// Non-blocking take for interrupt context.
    pub fn take_from_isr(&self) -> Result<()> {
        if self.try_take() {
            Ok(())
        } else {
            Err(Status::Timeout)
        }
    }

    /// Return one token, saturating at the ceiling.
    pub fn give(&self) -> Result<()> {
        let mut count = self.inner.count.load(Ordering::Acquire);
        loop {
            if count >= self.inner.max {
                return Ok(());
            }
            match self.inner.count.compare_exchange_weak(
                count,
                count + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(observed) => count = observed,
            }
        }
    }

    /// `give` is already non-blocking; the ISR variant is an alias kept
    /// for call-site symmetry.
    pub fn give_from_isr(&self) -> Result<()> {
        self.give()
    }

    /// Current token count.
    pub fn count(&self) -> u32 {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Configured ceiling.
    pub fn max(&self) -> u32 {
        self.inner.max
    }

    /// Destroy the semaphore.
    pub fn delete(self) -> Result<()> {
        diag::on_delete(ResourceKind::Semaphore);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::NO_WAIT;

    #[test]
    fn test_create_validation() {
        assert_eq!(
            Semaphore::create(0, 0).unwrap_err(),
            Status::InvalidParam
        );
        assert_eq!(
            Semaphore::create(5, 3).unwrap_err(),
            Status::InvalidParam
        );
        assert!(Semaphore::create_binary(2).is_err());
    }

    #[test]
    fn test_take_give_counting() {
        let sem = Semaphore::create_counting(10, 5).unwrap();
        assert_eq!(sem.count(), 5);

        for _ in 0..5 {
            sem.take(NO_WAIT).unwrap();
        }
        assert_eq!(sem.count(), 0);
        assert_eq!(sem.take(NO_WAIT), Err(Status::Timeout));

        sem.give().unwrap();
        assert_eq!(sem.count(), 1);
        sem.take(NO_WAIT).unwrap();
        sem.delete().unwrap();
    }

    #[test]
    fn test_give_saturates_at_max() {
        let sem = Semaphore::create_binary(1).unwrap();
        sem.give().unwrap();
        sem.give().unwrap();
        assert_eq!(sem.count(), 1);
    }

    #[test]
    fn test_isr_variants_never_block() {
        let sem = Semaphore::create_binary(0).unwrap();
        assert_eq!(sem.take_from_isr(), Err(Status::Timeout));
        sem.give_from_isr().unwrap();
        sem.take_from_isr().unwrap();
    }
}
