//! Sync/async transport adapters.
//!
//! Four adapter kinds bridge the two transport directions, each backed
//! by a fixed pool of `ADAPTER_POOL_SIZE` slots so adapter acquisition
//! never allocates. An adapter handle carries its slot index; releasing
//! consumes the handle and clears the slot for reuse.

use alloc::sync::Arc;
use spin::Mutex;

use strata_osal::status::{Result, Status};
use strata_osal::{block_until, relax, Deadline, NO_WAIT};

use crate::config::{ADAPTER_POOL_SIZE, ADAPTER_TX_TIMEOUT_MS};
use crate::transport::{RxAsync, RxOutcome, RxSync, TxAsync, TxState, TxSync};

use core::sync::atomic::{AtomicBool, Ordering};

struct Pool<T> {
    slots: Mutex<[Option<T>; ADAPTER_POOL_SIZE]>,
}

impl<T> Pool<T> {
    const fn new() -> Self {
        Self {
            slots: Mutex::new([const { None }; ADAPTER_POOL_SIZE]),
        }
    }
}

impl<T: Clone> Pool<T> {
    fn acquire(&self, value: T) -> Option<usize> {
        let mut slots = self.slots.lock();
        let free = slots.iter().position(|s| s.is_none())?;
        slots[free] = Some(value);
        Some(free)
    }

    fn release(&self, index: usize) -> Result<()> {
        let mut slots = self.slots.lock();
        if slots[index].take().is_none() {
            return Err(Status::InvalidState);
        }
        Ok(())
    }

    fn get(&self, index: usize) -> Result<T> {
        self.slots.lock()[index].clone().ok_or(Status::InvalidState)
    }

    fn free_slots(&self) -> usize {
        self.slots.lock().iter().filter(|s| s.is_none()).count()
    }
}

// One pool per adapter kind.
static TX_TO_SYNC: Pool<Arc<dyn TxAsync>> = Pool::new();
static RX_TO_SYNC: Pool<Arc<dyn RxAsync>> = Pool::new();
static TX_TO_ASYNC: Pool<(Arc<dyn TxSync>, Arc<AtomicBool>)> = Pool::new();
static RX_TO_ASYNC: Pool<Arc<dyn RxSync>> = Pool::new();

/// Synchronous view over an asynchronous transmitter.
pub struct TxSyncAdapter {
    slot: usize,
}

/// Wrap an async transmitter in a blocking send interface. `None` when
/// every slot is in use.
pub fn acquire_tx_sync(target: Arc<dyn TxAsync>) -> Option<TxSyncAdapter> {
    let slot = TX_TO_SYNC.acquire(target)?;
    Some(TxSyncAdapter { slot })
}

/// Return a TX adapter to its pool.
pub fn release_tx_sync(adapter: TxSyncAdapter) -> Result<()> {
    TX_TO_SYNC.release(adapter.slot)
}

impl TxSync for TxSyncAdapter {
    /// Start the async send, then poll its state until complete,
    /// yielding between polls. Expiry reports `Timeout`.
    fn send(&self, data: &[u8], timeout_ms: u32) -> Result<()> {
        let target = TX_TO_SYNC.get(self.slot)?;
        target.send(data)?;
        if block_until(|| target.state() != TxState::Busy, timeout_ms) {
            Ok(())
        } else {
            Err(Status::Timeout)
        }
    }
}

/// Synchronous view over an asynchronous receiver.
pub struct RxSyncAdapter {
    slot: usize,
}

/// Wrap an async receiver in a blocking receive interface.
pub fn acquire_rx_sync(target: Arc<dyn RxAsync>) -> Option<RxSyncAdapter> {
    let slot = RX_TO_SYNC.acquire(target)?;
    Some(RxSyncAdapter { slot })
}

/// Return an RX adapter to its pool.
pub fn release_rx_sync(adapter: RxSyncAdapter) -> Result<()> {
    RX_TO_SYNC.release(adapter.slot)
}

impl RxSync for RxSyncAdapter {
    fn receive(&self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
        let target = RX_TO_SYNC.get(self.slot)?;
        let mut count = 0usize;
        let got = block_until(
            || match target.receive(buf) {
                Ok(n) if n > 0 => {
                    count = n;
                    true
                }
                _ => false,
            },
            timeout_ms,
        );
        if got {
            Ok(count)
        } else {
            Err(Status::Timeout)
        }
    }

    /// Accumulate until the buffer is full; on expiry the partial
    /// count is reported with `Timeout`, even when it is zero.
    fn receive_all(&self, buf: &mut [u8], timeout_ms: u32) -> RxOutcome {
        let target = match RX_TO_SYNC.get(self.slot) {
            Ok(t) => t,
            Err(status) => return RxOutcome { count: 0, status },
        };
        let deadline = Deadline::new(timeout_ms);
        let mut filled = 0usize;
        while filled < buf.len() {
            if let Ok(n) = target.receive(&mut buf[filled..]) {
                filled += n;
                continue;
            }
            if deadline.expired() {
                return RxOutcome {
                    count: filled,
                    status: Status::Timeout,
                };
            }
            relax();
        }
        RxOutcome {
            count: filled,
            status: Status::Ok,
        }
    }
}

/// Asynchronous view over a synchronous transmitter.
pub struct TxAsyncAdapter {
    slot: usize,
}

/// Wrap a blocking transmitter in a fire-and-poll interface.
pub fn acquire_tx_async(target: Arc<dyn TxSync>) -> Option<TxAsyncAdapter> {
    let slot = TX_TO_ASYNC.acquire((target, Arc::new(AtomicBool::new(false))))?;
    Some(TxAsyncAdapter { slot })
}

/// Return a TX adapter to its pool.
pub fn release_tx_async(adapter: TxAsyncAdapter) -> Result<()> {
    TX_TO_ASYNC.release(adapter.slot)
}

impl TxAsync for TxAsyncAdapter {
    /// Run the sync send under a fixed timeout. A send that times out
    /// leaves the adapter busy; the next send retries the transfer.
    fn send(&self, data: &[u8]) -> Result<()> {
        let (target, busy) = TX_TO_ASYNC.get(self.slot)?;
        busy.store(true, Ordering::Release);
        match target.send(data, ADAPTER_TX_TIMEOUT_MS) {
            Ok(()) => {
                busy.store(false, Ordering::Release);
                Ok(())
            }
            Err(Status::Timeout) => Err(Status::Busy),
            Err(status) => {
                busy.store(false, Ordering::Release);
                Err(status)
            }
        }
    }

    fn state(&self) -> TxState {
        match TX_TO_ASYNC.get(self.slot) {
            Ok((_, busy)) if busy.load(Ordering::Acquire) => TxState::Busy,
            _ => TxState::Ready,
        }
    }
}

/// Asynchronous view over a synchronous receiver.
pub struct RxAsyncAdapter {
    slot: usize,
}

/// Wrap a blocking receiver in a poll interface.
pub fn acquire_rx_async(target: Arc<dyn RxSync>) -> Option<RxAsyncAdapter> {
    let slot = RX_TO_ASYNC.acquire(target)?;
    Some(RxAsyncAdapter { slot })
}

/// Return an RX adapter to its pool.
pub fn release_rx_async(adapter: RxAsyncAdapter) -> Result<()> {
    RX_TO_ASYNC.release(adapter.slot)
}

impl RxAsync for RxAsyncAdapter {
    /// One immediate attempt; a sync timeout maps to `NoData`.
    fn receive(&self, buf: &mut [u8]) -> Result<usize> {
        let target = RX_TO_ASYNC.get(self.slot)?;
        match target.receive(buf, NO_WAIT) {
            Ok(n) => Ok(n),
            Err(Status::Timeout) => Err(Status::NoData),
            Err(status) => Err(status),
        }
    }
}

/// Free slots remaining per adapter kind, in the order
/// `(tx_sync, rx_sync, tx_async, rx_async)`. Diagnostic aid.
pub fn pool_free_slots() -> (usize, usize, usize, usize) {
    (
        TX_TO_SYNC.free_slots(),
        RX_TO_SYNC.free_slots(),
        TX_TO_ASYNC.free_slots(),
        RX_TO_ASYNC.free_slots(),
    )
}
