//! Synchronous and asynchronous transport interfaces.
//!
//! A driver exposes whichever direction its hardware path naturally
//! provides; the adapter pools in [`crate::adapter`] bridge to the
//! other one.

use strata_osal::status::{Result, Status};

/// Progress state of an asynchronous transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Previous send completed; a new one may start.
    Ready,
    /// A send is still in flight.
    Busy,
}

/// Blocking transmit.
pub trait TxSync: Send + Sync {
    /// Send all of `data` or fail with `Timeout`.
    fn send(&self, data: &[u8], timeout_ms: u32) -> Result<()>;
}

/// Non-blocking transmit.
pub trait TxAsync: Send + Sync {
    /// Start sending `data`. Fails with `Busy` while a send is in
    /// flight.
    fn send(&self, data: &[u8]) -> Result<()>;
    fn state(&self) -> TxState;
}

/// Outcome of a receive-all call: how much arrived and why it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxOutcome {
    pub count: usize,
    pub status: Status,
}

/// Blocking receive.
pub trait RxSync: Send + Sync {
    /// Receive at least one byte, up to `buf.len()`; returns the count
    /// actually read or `Timeout`.
    fn receive(&self, buf: &mut [u8], timeout_ms: u32) -> Result<usize>;

    /// Receive exactly `buf.len()` bytes or time out; a timeout
    /// reports the partial count alongside the status.
    fn receive_all(&self, buf: &mut [u8], timeout_ms: u32) -> RxOutcome;
}

/// Non-blocking receive.
pub trait RxAsync: Send + Sync {
    /// Take whatever is immediately available, up to `buf.len()`.
    /// Fails with `NoData` when nothing is pending.
    fn receive(&self, buf: &mut [u8]) -> Result<usize>;
}
