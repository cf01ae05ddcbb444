//! SPI capability interface.

use strata_osal::status::Result;

use super::{Device, StatsWriter};

/// Clock polarity/phase mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

/// SPI bus interface.
///
/// `bus_lock`/`bus_unlock` give a task exclusive use of the bus across
/// a multi-transfer transaction; the chip-select pair frames a single
/// device conversation inside it.
pub trait SpiDevice: Device {
    /// Full-duplex transfer. `tx` and `rx` must be the same length.
    fn transfer(&self, tx: &[u8], rx: &mut [u8], timeout_ms: u32) -> Result<()>;
    /// Half-duplex transmit.
    fn transmit(&self, tx: &[u8], timeout_ms: u32) -> Result<()>;
    /// Half-duplex receive.
    fn receive(&self, rx: &mut [u8], timeout_ms: u32) -> Result<()>;

    fn cs_select(&self) -> Result<()>;
    fn cs_deselect(&self) -> Result<()>;

    fn bus_lock(&self, timeout_ms: u32) -> Result<()>;
    fn bus_unlock(&self) -> Result<()>;

    fn set_clock_hz(&self, hz: u32) -> Result<()>;
    fn set_mode(&self, mode: SpiMode) -> Result<()>;
}

/// SPI statistics block.
///
/// Encoding: `tx_bytes:u64, rx_bytes:u64, transfers:u64, errors:u32,
/// busy:u8` LE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpiStats {
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub transfers: u64,
    pub errors: u32,
    pub busy: bool,
}

impl SpiStats {
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut writer = StatsWriter::new(buf);
        writer.put_u64(self.tx_bytes)?;
        writer.put_u64(self.rx_bytes)?;
        writer.put_u64(self.transfers)?;
        writer.put_u32(self.errors)?;
        writer.put_u8(self.busy as u8)?;
        Ok(writer.len())
    }
}
