//! UART capability interface.

use strata_osal::status::Result;

use super::{Device, StatsWriter};
use crate::transport::{RxAsync, TxAsync};

/// Serial port interface. The synchronous send/receive pair is the
/// base contract; drivers with interrupt- or DMA-driven paths expose
/// them through the async transport accessors and callers bridge with
/// the adapter pools.
pub trait UartDevice: Device {
    /// Transmit `data`, blocking until accepted or `timeout_ms` expires.
    fn send(&self, data: &[u8], timeout_ms: u32) -> Result<()>;
    /// Receive up to `buf.len()` bytes, returning the count actually
    /// read (at least one byte unless the timeout expires).
    fn receive(&self, buf: &mut [u8], timeout_ms: u32) -> Result<usize>;

    /// Non-blocking transmit view, when the driver has one.
    fn tx_async(&self) -> Option<&dyn TxAsync> {
        None
    }

    /// Non-blocking receive view, when the driver has one.
    fn rx_async(&self) -> Option<&dyn RxAsync> {
        None
    }
}

/// UART statistics block.
///
/// Encoding: `tx_bytes:u64, rx_bytes:u64, overruns:u32,
/// framing_errors:u32, parity_errors:u32, busy:u8` LE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UartStats {
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub overruns: u32,
    pub framing_errors: u32,
    pub parity_errors: u32,
    pub busy: bool,
}

impl UartStats {
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut writer = StatsWriter::new(buf);
        writer.put_u64(self.tx_bytes)?;
        writer.put_u64(self.rx_bytes)?;
        writer.put_u32(self.overruns)?;
        writer.put_u32(self.framing_errors)?;
        writer.put_u32(self.parity_errors)?;
        writer.put_u8(self.busy as u8)?;
        Ok(writer.len())
    }
}
