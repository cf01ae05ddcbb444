//! Flash and option-byte capability interfaces.

use strata_osal::status::Result;

use super::{Device, StatsWriter};

/// Internal or external flash interface.
///
/// Writes may only clear bits; erased regions read back as
/// [`FlashDevice::erased_byte`]. Addresses are device-relative.
pub trait FlashDevice: Device {
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<()>;
    /// Program `data` at `addr`. The region must have been erased.
    fn write(&self, addr: u32, data: &[u8]) -> Result<()>;
    /// Erase the page containing `addr`.
    fn erase_page(&self, addr: u32) -> Result<()>;
    /// Erase the sector containing `addr`.
    fn erase_sector(&self, addr: u32) -> Result<()>;

    fn page_size(&self) -> usize;
    fn sector_size(&self) -> usize;
    fn capacity(&self) -> usize;

    /// Fill value of erased cells, typically `0xFF`.
    fn erased_byte(&self) -> u8 {
        0xff
    }
}

/// Option-byte block interface.
///
/// Programmed values are staged; [`OptionBytesDevice::has_pending_changes`]
/// reports whether a staged value differs from the active one (applied
/// on the next reset or reload, per platform).
pub trait OptionBytesDevice: Device {
    fn read(&self) -> Result<u32>;
    fn program(&self, value: u32) -> Result<()>;
    fn has_pending_changes(&self) -> Result<bool>;
}

/// Flash statistics block.
///
/// Encoding: `bytes_read:u64, bytes_written:u64, page_erases:u32,
/// sector_erases:u32, write_errors:u32` LE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlashStats {
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub page_erases: u32,
    pub sector_erases: u32,
    pub write_errors: u32,
}

impl FlashStats {
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut writer = StatsWriter::new(buf);
        writer.put_u64(self.bytes_read)?;
        writer.put_u64(self.bytes_written)?;
        writer.put_u32(self.page_erases)?;
        writer.put_u32(self.sector_erases)?;
        writer.put_u32(self.write_errors)?;
        Ok(writer.len())
    }
}
