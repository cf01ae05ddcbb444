//! Mock ADC with test-settable channel values.

use alloc::string::String;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use spin::Mutex;

use strata_osal::status::{Result, Status};

use crate::iface::{
    AdcDevice, AdcResolution, AdcStats, Device, DeviceClass, DeviceState, Diagnostic, Lifecycle,
    PowerControl,
};

const CHANNEL_COUNT: usize = 16;

/// In-memory ADC. Channels read back whatever a test staged through
/// [`MockAdc::set_raw`], clamped to the configured resolution.
pub struct MockAdc {
    name: String,
    resolution: AdcResolution,
    state: Mutex<DeviceState>,
    enabled: AtomicBool,
    channels: Mutex<[u32; CHANNEL_COUNT]>,
    conversions: AtomicU64,
    overruns: AtomicU32,
}

impl MockAdc {
    pub fn new(name: &str, resolution: AdcResolution) -> Arc<MockAdc> {
        Arc::new(MockAdc {
            name: String::from(name),
            resolution,
            state: Mutex::new(DeviceState::Running),
            enabled: AtomicBool::new(true),
            channels: Mutex::new([0; CHANNEL_COUNT]),
            conversions: AtomicU64::new(0),
            overruns: AtomicU32::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage the raw value the next reads of `channel` observe.
    pub fn set_raw(&self, channel: u8, raw: u32) -> Result<()> {
        if channel as usize >= CHANNEL_COUNT {
            return Err(Status::InvalidParam);
        }
        self.channels.lock()[channel as usize] = raw.min(self.resolution.max_raw());
        Ok(())
    }
}

impl Device for MockAdc {
    fn class(&self) -> DeviceClass {
        DeviceClass::Adc
    }

    fn lifecycle(&self) -> Option<&dyn Lifecycle> {
        Some(self)
    }

    fn power(&self) -> Option<&dyn PowerControl> {
        Some(self)
    }

    fn diagnostic(&self) -> Option<&dyn Diagnostic> {
        Some(self)
    }
}

impl Lifecycle for MockAdc {
    fn init(&self) -> Result<()> {
        *self.state.lock() = DeviceState::Running;
        Ok(())
    }

    fn deinit(&self) -> Result<()> {
        *self.state.lock() = DeviceState::Uninitialized;
        Ok(())
    }

    fn suspend(&self) -> Result<()> {
        *self.state.lock() = DeviceState::Suspended;
        Ok(())
    }

    fn resume(&self) -> Result<()> {
        *self.state.lock() = DeviceState::Running;
        Ok(())
    }

    fn state(&self) -> DeviceState {
        *self.state.lock()
    }
}

impl PowerControl for MockAdc {
    fn enable(&self) -> Result<()> {
        self.enabled.store(true, Ordering::Release);
        Ok(())
    }

    fn disable(&self) -> Result<()> {
        self.enabled.store(false, Ordering::Release);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl Diagnostic for MockAdc {
    fn status(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(Status::InvalidSize);
        }
        buf[0] = self.resolution.bits() as u8;
        Ok(1)
    }

    fn statistics(&self, buf: &mut [u8]) -> Result<usize> {
        let stats = AdcStats {
            conversions: self.conversions.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
        };
        stats.encode(buf)
    }

    fn clear_statistics(&self) -> Result<()> {
        self.conversions.store(0, Ordering::Relaxed);
        self.overruns.store(0, Ordering::Relaxed);
        Ok(())
    }
}

impl AdcDevice for MockAdc {
    fn read_raw(&self, channel: u8) -> Result<u32> {
        if channel as usize >= CHANNEL_COUNT {
            return Err(Status::InvalidParam);
        }
        match *self.state.lock() {
            DeviceState::Uninitialized => return Err(Status::NotInitialized),
            DeviceState::Suspended => return Err(Status::Suspended),
            DeviceState::Running => {}
        }
        self.conversions.fetch_add(1, Ordering::Relaxed);
        Ok(self.channels.lock()[channel as usize])
    }

    fn resolution(&self) -> AdcResolution {
        self.resolution
    }
}
