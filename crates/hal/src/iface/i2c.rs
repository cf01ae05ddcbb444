//! I²C capability interface.

use strata_osal::status::Result;

use super::{Device, StatsWriter};

/// I²C master interface.
///
/// `mem_write`/`mem_read` address a register window inside the target
/// device: `mem_addr_size` is the width of the register address in
/// bytes (1 or 2 on most parts).
pub trait I2cDevice: Device {
    fn master_transmit(&self, addr: u16, data: &[u8], timeout_ms: u32) -> Result<()>;
    fn master_receive(&self, addr: u16, buf: &mut [u8], timeout_ms: u32) -> Result<()>;

    fn mem_write(
        &self,
        addr: u16,
        mem_addr: u32,
        mem_addr_size: u8,
        data: &[u8],
        timeout_ms: u32,
    ) -> Result<()>;
    fn mem_read(
        &self,
        addr: u16,
        mem_addr: u32,
        mem_addr_size: u8,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<()>;

    /// Address a device and report whether it acknowledges.
    fn probe(&self, addr: u16, timeout_ms: u32) -> Result<()>;

    /// Probe the 7-bit address range, filling `found` with responders.
    /// Returns the number of devices discovered.
    fn scan(&self, found: &mut [u16]) -> Result<usize>;

    fn set_speed_hz(&self, hz: u32) -> Result<()>;
}

/// I²C statistics block.
///
/// Encoding: `tx_bytes:u64, rx_bytes:u64, nacks:u32, bus_errors:u32,
/// arbitration_losses:u32, busy:u8` LE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct I2cStats {
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub nacks: u32,
    pub bus_errors: u32,
    pub arbitration_losses: u32,
    pub busy: bool,
}

impl I2cStats {
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut writer = StatsWriter::new(buf);
        writer.put_u64(self.tx_bytes)?;
        writer.put_u64(self.rx_bytes)?;
        writer.put_u32(self.nacks)?;
        writer.put_u32(self.bus_errors)?;
        writer.put_u32(self.arbitration_losses)?;
        writer.put_u8(self.busy as u8)?;
        Ok(writer.len())
    }
}
