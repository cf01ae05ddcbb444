//! Mock I²C master over a bank of simulated register-file targets.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use spin::Mutex;

use strata_osal::status::{Result, Status};

use crate::iface::{
    Device, DeviceClass, DeviceState, Diagnostic, I2cDevice, I2cStats, Lifecycle, PowerControl,
};

/// Register file exposed by one simulated target device.
struct Target {
    registers: Vec<u8>,
    /// Auto-incrementing register pointer, set by writes.
    pointer: usize,
}

/// In-memory I²C master. Targets attached with
/// [`MockI2c::attach_target`] acknowledge their address; everything
/// else NACKs, which is what probe and scan key on. Plain
/// transmit/receive follow the register-pointer convention: the first
/// written byte selects the register, subsequent bytes and reads move
/// the pointer forward.
pub struct MockI2c {
    name: String,
    state: Mutex<DeviceState>,
    enabled: AtomicBool,
    speed_hz: AtomicU32,
    targets: Mutex<BTreeMap<u16, Target>>,

    tx_bytes: AtomicU64,
    rx_bytes: AtomicU64,
    nacks: AtomicU32,
}

impl MockI2c {
    pub fn new(name: &str) -> Arc<MockI2c> {
        Arc::new(MockI2c {
            name: String::from(name),
            state: Mutex::new(DeviceState::Running),
            enabled: AtomicBool::new(true),
            speed_hz: AtomicU32::new(100_000),
            targets: Mutex::new(BTreeMap::new()),
            tx_bytes: AtomicU64::new(0),
            rx_bytes: AtomicU64::new(0),
            nacks: AtomicU32::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach a responding target with `size` registers, zero-filled.
    pub fn attach_target(&self, addr: u16, size: usize) {
        self.targets.lock().insert(
            addr,
            Target {
                registers: alloc::vec![0u8; size],
                pointer: 0,
            },
        );
    }

    pub fn speed_hz(&self) -> u32 {
        self.speed_hz.load(Ordering::Acquire)
    }

    /// Direct register inspection for assertions.
    pub fn register(&self, addr: u16, reg: usize) -> Option<u8> {
        self.targets
            .lock()
            .get(&addr)
            .and_then(|t| t.registers.get(reg).copied())
    }

    fn guard(&self) -> Result<()> {
        match *self.state.lock() {
            DeviceState::Uninitialized => Err(Status::NotInitialized),
            DeviceState::Suspended => Err(Status::Suspended),
            DeviceState::Running => Ok(()),
        }
    }

    fn nack(&self) -> Status {
        self.nacks.fetch_add(1, Ordering::Relaxed);
        Status::Nack
    }
}

impl Device for MockI2c {
    fn class(&self) -> DeviceClass {
        DeviceClass::I2c
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

impl Lifecycle for MockI2c {
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

impl PowerControl for MockI2c {
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

impl Diagnostic for MockI2c {
    fn status(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(Status::InvalidSize);
        }
        buf[0] = match *self.state.lock() {
            DeviceState::Uninitialized => 0,
            DeviceState::Running => 1,
            DeviceState::Suspended => 2,
        };
        Ok(1)
    }

    fn statistics(&self, buf: &mut [u8]) -> Result<usize> {
        let stats = I2cStats {
            tx_bytes: self.tx_bytes.load(Ordering::Relaxed),
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
            nacks: self.nacks.load(Ordering::Relaxed),
            bus_errors: 0,
            arbitration_losses: 0,
            busy: false,
        };
        stats.encode(buf)
    }

    fn clear_statistics(&self) -> Result<()> {
        self.tx_bytes.store(0, Ordering::Relaxed);
        self.rx_bytes.store(0, Ordering::Relaxed);
        self.nacks.store(0, Ordering::Relaxed);
        Ok(())
    }
}

impl I2cDevice for MockI2c {
    fn master_transmit(&self, addr: u16, data: &[u8], _timeout_ms: u32) -> Result<()> {
        self.guard()?;
        if data.is_empty() {
            return Err(Status::InvalidParam);
        }
        let mut targets = self.targets.lock();
        let target = match targets.get_mut(&addr) {
            Some(t) => t,
            None => return Err(self.nack()),
        };
        // First byte selects the register, the rest program it.
        target.pointer = data[0] as usize;
        for &byte in &data[1..] {
            if target.pointer >= target.registers.len() {
                return Err(Status::Overrun);
            }
            target.registers[target.pointer] = byte;
            target.pointer += 1;
        }
        self.tx_bytes.fetch_add(data.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn master_receive(&self, addr: u16, buf: &mut [u8], _timeout_ms: u32) -> Result<()> {
        self.guard()?;
        let mut targets = self.targets.lock();
        let target = match targets.get_mut(&addr) {
            Some(t) => t,
            None => return Err(self.nack()),
        };
        for slot in buf.iter_mut() {
            if target.pointer >= target.registers.len() {
                return Err(Status::Overrun);
            }
            *slot = target.registers[target.pointer];
            target.pointer += 1;
        }
        self.rx_bytes.fetch_add(buf.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn mem_write(
        &self,
        addr: u16,
        mem_addr: u32,
        mem_addr_size: u8,
        data: &[u8],
        _timeout_ms: u32,
    ) -> Result<()> {
        self.guard()?;
        if mem_addr_size != 1 && mem_addr_size != 2 {
            return Err(Status::InvalidParam);
        }
        let mut targets = self.targets.lock();
        let target = match targets.get_mut(&addr) {
            Some(t) => t,
            None => return Err(self.nack()),
        };
        let start = mem_addr as usize;
        let end = start.checked_add(data.len()).ok_or(Status::InvalidParam)?;
        if end > target.registers.len() {
            return Err(Status::Overrun);
        }
        target.registers[start..end].copy_from_slice(data);
        self.tx_bytes.fetch_add(data.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn mem_read(
        &self,
        addr: u16,
        mem_addr: u32,
        mem_addr_size: u8,
        buf: &mut [u8],
        _timeout_ms: u32,
    ) -> Result<()> {
        self.guard()?;
        if mem_addr_size != 1 && mem_addr_size != 2 {
            return Err(Status::InvalidParam);
        }
        let targets = self.targets.lock();
        let target = match targets.get(&addr) {
            Some(t) => t,
            None => return Err(self.nack()),
        };
        let start = mem_addr as usize;
        let end = start.checked_add(buf.len()).ok_or(Status::InvalidParam)?;
        if end > target.registers.len() {
            return Err(Status::Overrun);
        }
        buf.copy_from_slice(&target.registers[start..end]);
        self.rx_bytes.fetch_add(buf.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn probe(&self, addr: u16, _timeout_ms: u32) -> Result<()> {
        self.guard()?;
        if self.targets.lock().contains_key(&addr) {
            Ok(())
        } else {
            Err(self.nack())
        }
    }

    fn scan(&self, found: &mut [u16]) -> Result<usize> {
        self.guard()?;
        let targets = self.targets.lock();
        let mut count = 0;
        for &addr in targets.keys() {
            if count == found.len() {
                break;
            }
            found[count] = addr;
            count += 1;
        }
        Ok(count)
    }

    fn set_speed_hz(&self, hz: u32) -> Result<()> {
        if hz == 0 {
            return Err(Status::InvalidParam);
        }
        self.speed_hz.store(hz, Ordering::Release);
        Ok(())
    }
}
