//! Capability interface model.
//!
//! Every peripheral class is a trait over a common [`Device`] base, and
//! an initialized driver hands the registry a [`DeviceIface`]: a
//! class-tagged handle that applications downcast with the `as_*`
//! accessors. The base trait exposes the three optional subinterfaces
//! (lifecycle, power, diagnostics); a driver that does not implement
//! one simply leaves the accessor at its `None` default.

pub mod adc;
pub mod flash;
pub mod gpio;
pub mod i2c;
pub mod spi;
pub mod uart;

pub use adc::{to_millivolts, AdcDevice, AdcResolution, AdcStats};
pub use flash::{FlashDevice, FlashStats, OptionBytesDevice};
pub use gpio::{GpioDevice, GpioEventHandler, GpioLevel, GpioStats, GpioTrigger};
pub use i2c::{I2cDevice, I2cStats};
pub use spi::{SpiDevice, SpiMode, SpiStats};
pub use uart::{UartDevice, UartStats};

use alloc::sync::Arc;

use strata_osal::status::Result;

/// Lifecycle position of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceState {
    Uninitialized,
    Running,
    Suspended,
}

/// Peripheral class tag carried by every interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Gpio,
    Uart,
    Spi,
    I2c,
    Adc,
    Flash,
    OptionBytes,
    Other,
}

/// Lifecycle subinterface.
pub trait Lifecycle: Send + Sync {
    fn init(&self) -> Result<()>;
    fn deinit(&self) -> Result<()>;
    fn suspend(&self) -> Result<()>;
    fn resume(&self) -> Result<()>;
    fn state(&self) -> DeviceState;
}

/// Power control subinterface.
pub trait PowerControl: Send + Sync {
    fn enable(&self) -> Result<()>;
    fn disable(&self) -> Result<()>;
    fn is_enabled(&self) -> bool;
}

/// Diagnostics subinterface. Status and statistics are encoded into
/// caller-provided buffers; each class documents its encoding next to
/// its stats struct.
pub trait Diagnostic: Send + Sync {
    /// Write a status snapshot into `buf`, returning the encoded size.
    fn status(&self, buf: &mut [u8]) -> Result<usize>;
    /// Write the statistics block into `buf`, returning the encoded size.
    fn statistics(&self, buf: &mut [u8]) -> Result<usize>;
    fn clear_statistics(&self) -> Result<()>;
}

/// Base interface every peripheral class builds on.
pub trait Device: Send + Sync {
    fn class(&self) -> DeviceClass;

    fn lifecycle(&self) -> Option<&dyn Lifecycle> {
        None
    }

    fn power(&self) -> Option<&dyn PowerControl> {
        None
    }

    fn diagnostic(&self) -> Option<&dyn Diagnostic> {
        None
    }
}

/// Class-tagged interface handle returned by a driver's init hook.
#[derive(Clone)]
pub enum DeviceIface {
    Gpio(Arc<dyn GpioDevice>),
    Uart(Arc<dyn UartDevice>),
    Spi(Arc<dyn SpiDevice>),
    I2c(Arc<dyn I2cDevice>),
    Adc(Arc<dyn AdcDevice>),
    Flash(Arc<dyn FlashDevice>),
    OptionBytes(Arc<dyn OptionBytesDevice>),
    Other(Arc<dyn Device>),
}

impl DeviceIface {
    pub fn class(&self) -> DeviceClass {
        match self {
            DeviceIface::Gpio(_) => DeviceClass::Gpio,
            DeviceIface::Uart(_) => DeviceClass::Uart,
            DeviceIface::Spi(_) => DeviceClass::Spi,
            DeviceIface::I2c(_) => DeviceClass::I2c,
            DeviceIface::Adc(_) => DeviceClass::Adc,
            DeviceIface::Flash(_) => DeviceClass::Flash,
            DeviceIface::OptionBytes(_) => DeviceClass::OptionBytes,
            DeviceIface::Other(_) => DeviceClass::Other,
        }
    }

    /// Class-independent view, for lifecycle/power/diagnostic access.
    pub fn as_device(&self) -> &dyn Device {
        match self {
            DeviceIface::Gpio(d) => &**d,
            DeviceIface::Uart(d) => &**d,
            DeviceIface::Spi(d) => &**d,
            DeviceIface::I2c(d) => &**d,
            DeviceIface::Adc(d) => &**d,
            DeviceIface::Flash(d) => &**d,
            DeviceIface::OptionBytes(d) => &**d,
            DeviceIface::Other(d) => &**d,
        }
    }

    pub fn as_gpio(&self) -> Option<&Arc<dyn GpioDevice>> {
        match self {
            DeviceIface::Gpio(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_uart(&self) -> Option<&Arc<dyn UartDevice>> {
        match self {
            DeviceIface::Uart(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_spi(&self) -> Option<&Arc<dyn SpiDevice>> {
        match self {
            DeviceIface::Spi(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_i2c(&self) -> Option<&Arc<dyn I2cDevice>> {
        match self {
            DeviceIface::I2c(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_adc(&self) -> Option<&Arc<dyn AdcDevice>> {
        match self {
            DeviceIface::Adc(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_flash(&self) -> Option<&Arc<dyn FlashDevice>> {
        match self {
            DeviceIface::Flash(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_option_bytes(&self) -> Option<&Arc<dyn OptionBytesDevice>> {
        match self {
            DeviceIface::OptionBytes(d) => Some(d),
            _ => None,
        }
    }
}

/// Little-endian field encoder for statistics blocks.
pub(crate) struct StatsWriter<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

impl<'a> StatsWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn put_u32(&mut self, value: u32) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    pub fn put_u64(&mut self, value: u64) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.put(&[value])
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.offset + bytes.len();
        if end > self.buf.len() {
            return Err(strata_osal::Status::InvalidSize);
        }
        self.buf[self.offset..end].copy_from_slice(bytes);
        self.offset = end;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.offset
    }
}
