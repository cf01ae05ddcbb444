//! GPIO capability interface.

use alloc::sync::Arc;
use bitflags::bitflags;

use strata_osal::status::Result;

use super::{Device, StatsWriter};

/// Logic level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioLevel {
    Low,
    High,
}

impl GpioLevel {
    pub fn toggled(self) -> GpioLevel {
        match self {
            GpioLevel::Low => GpioLevel::High,
            GpioLevel::High => GpioLevel::Low,
        }
    }
}

bitflags! {
    /// Edge selection for pin event callbacks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GpioTrigger: u8 {
        const RISING = 1 << 0;
        const FALLING = 1 << 1;
        const BOTH = Self::RISING.bits() | Self::FALLING.bits();
    }
}

/// Callback invoked on a matching pin edge.
pub type GpioEventHandler = Arc<dyn Fn(u8, GpioLevel) + Send + Sync>;

/// GPIO controller interface.
pub trait GpioDevice: Device {
    fn read(&self, pin: u8) -> Result<GpioLevel>;
    fn write(&self, pin: u8, level: GpioLevel) -> Result<()>;
    fn toggle(&self, pin: u8) -> Result<()>;
    /// Register an edge callback for `pin`, replacing any previous one.
    fn register_event(&self, pin: u8, trigger: GpioTrigger, handler: GpioEventHandler)
        -> Result<()>;
    fn unregister_event(&self, pin: u8) -> Result<()>;
}

/// GPIO statistics block.
///
/// Encoding: `reads:u64, writes:u64, toggles:u64, events:u64` LE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpioStats {
    pub reads: u64,
    pub writes: u64,
    pub toggles: u64,
    pub events: u64,
}

impl GpioStats {
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut writer = StatsWriter::new(buf);
        writer.put_u64(self.reads)?;
        writer.put_u64(self.writes)?;
        writer.put_u64(self.toggles)?;
        writer.put_u64(self.events)?;
        Ok(writer.len())
    }
}
