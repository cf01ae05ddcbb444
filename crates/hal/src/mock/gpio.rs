//! Mock GPIO controller: an in-memory pin bank with edge callbacks.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use spin::Mutex;

use strata_osal::status::{Result, Status};

use crate::iface::{
    Device, DeviceClass, DeviceState, Diagnostic, GpioDevice, GpioEventHandler, GpioLevel,
    GpioStats, GpioTrigger, Lifecycle, PowerControl,
};

const PIN_COUNT: u8 = 64;

struct PinEvent {
    trigger: GpioTrigger,
    handler: GpioEventHandler,
}

/// In-memory GPIO bank of 64 pins, all starting low. Writes fire any
/// registered edge callback synchronously, the way a level change
/// would raise the EXTI line on hardware.
pub struct MockGpio {
    name: String,
    state: Mutex<DeviceState>,
    enabled: AtomicBool,

    /// Bit per pin; set = high.
    levels: Mutex<u64>,
    events: Mutex<BTreeMap<u8, PinEvent>>,

    reads: AtomicU64,
    writes: AtomicU64,
    toggles: AtomicU64,
    fired: AtomicU64,
}

impl MockGpio {
    pub fn new(name: &str) -> Arc<MockGpio> {
        Arc::new(MockGpio {
            name: String::from(name),
            state: Mutex::new(DeviceState::Running),
            enabled: AtomicBool::new(true),
            levels: Mutex::new(0),
            events: Mutex::new(BTreeMap::new()),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            toggles: AtomicU64::new(0),
            fired: AtomicU64::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn guard(&self, pin: u8) -> Result<()> {
        if pin >= PIN_COUNT {
            return Err(Status::InvalidParam);
        }
        match *self.state.lock() {
            DeviceState::Uninitialized => Err(Status::NotInitialized),
            DeviceState::Suspended => Err(Status::Suspended),
            DeviceState::Running => Ok(()),
        }
    }

    /// Apply a level change and fire a matching edge callback. The
    /// handler runs outside the level lock.
    fn set_level(&self, pin: u8, level: GpioLevel) {
        let mask = 1u64 << pin;
        let rising = {
            let mut levels = self.levels.lock();
            let was_high = *levels & mask != 0;
            let now_high = level == GpioLevel::High;
            if was_high == now_high {
                return;
            }
            if now_high {
                *levels |= mask;
            } else {
                *levels &= !mask;
            }
            now_high
        };

        let handler = {
            let events = self.events.lock();
            events.get(&pin).and_then(|event| {
                let wanted = if rising {
                    GpioTrigger::RISING
                } else {
                    GpioTrigger::FALLING
                };
                if event.trigger.contains(wanted) {
                    Some(event.handler.clone())
                } else {
                    None
                }
            })
        };
        if let Some(handler) = handler {
            self.fired.fetch_add(1, Ordering::Relaxed);
            handler(pin, level);
        }
    }
}

impl Device for MockGpio {
    fn class(&self) -> DeviceClass {
        DeviceClass::Gpio
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

impl Lifecycle for MockGpio {
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

impl PowerControl for MockGpio {
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

impl Diagnostic for MockGpio {
    fn status(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 8 {
            return Err(Status::InvalidSize);
        }
        buf[..8].copy_from_slice(&self.levels.lock().to_le_bytes());
        Ok(8)
    }

    fn statistics(&self, buf: &mut [u8]) -> Result<usize> {
        let stats = GpioStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            toggles: self.toggles.load(Ordering::Relaxed),
            events: self.fired.load(Ordering::Relaxed),
        };
        stats.encode(buf)
    }

    fn clear_statistics(&self) -> Result<()> {
        self.reads.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
        self.toggles.store(0, Ordering::Relaxed);
        self.fired.store(0, Ordering::Relaxed);
        Ok(())
    }
}

impl GpioDevice for MockGpio {
    fn read(&self, pin: u8) -> Result<GpioLevel> {
        self.guard(pin)?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        let high = *self.levels.lock() & (1u64 << pin) != 0;
        Ok(if high { GpioLevel::High } else { GpioLevel::Low })
    }

    fn write(&self, pin: u8, level: GpioLevel) -> Result<()> {
        self.guard(pin)?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.set_level(pin, level);
        Ok(())
    }

    fn toggle(&self, pin: u8) -> Result<()> {
        self.guard(pin)?;
        self.toggles.fetch_add(1, Ordering::Relaxed);
        let current = *self.levels.lock() & (1u64 << pin) != 0;
        let next = if current { GpioLevel::Low } else { GpioLevel::High };
        self.set_level(pin, next);
        Ok(())
    }

    fn register_event(
        &self,
        pin: u8,
        trigger: GpioTrigger,
        handler: GpioEventHandler,
    ) -> Result<()> {
        self.guard(pin)?;
        if trigger.is_empty() {
            return Err(Status::InvalidParam);
        }
        self.events.lock().insert(pin, PinEvent { trigger, handler });
        Ok(())
    }

    fn unregister_event(&self, pin: u8) -> Result<()> {
        self.guard(pin)?;
        self.events
            .lock()
            .remove(&pin)
            .map(|_| ())
            .ok_or(Status::NotFound)
    }
}
