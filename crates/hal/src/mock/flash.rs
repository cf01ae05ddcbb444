//! Mock flash and option-byte devices.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use spin::Mutex;

use strata_osal::status::{Result, Status};

use crate::iface::{
    Device, DeviceClass, DeviceState, Diagnostic, FlashDevice, FlashStats, Lifecycle,
    OptionBytesDevice, PowerControl,
};

const ERASED: u8 = 0xff;

/// In-memory NOR-style flash: programming can only clear bits, and a
/// write over a non-erased cell fails the way a real part would leave
/// garbage behind.
pub struct MockFlash {
    name: String,
    page_size: usize,
    sector_size: usize,
    state: Mutex<DeviceState>,
    enabled: AtomicBool,
    cells: Mutex<Vec<u8>>,

    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    page_erases: AtomicU32,
    sector_erases: AtomicU32,
    write_errors: AtomicU32,
}

impl MockFlash {
    pub fn new(name: &str, capacity: usize, page_size: usize, sector_size: usize) -> Arc<MockFlash> {
        Arc::new(MockFlash {
            name: String::from(name),
            page_size,
            sector_size,
            state: Mutex::new(DeviceState::Running),
            enabled: AtomicBool::new(true),
            cells: Mutex::new(alloc::vec![ERASED; capacity]),
            bytes_read: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            page_erases: AtomicU32::new(0),
            sector_erases: AtomicU32::new(0),
            write_errors: AtomicU32::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn guard(&self) -> Result<()> {
        match *self.state.lock() {
            DeviceState::Uninitialized => Err(Status::NotInitialized),
            DeviceState::Suspended => Err(Status::Suspended),
            DeviceState::Running => Ok(()),
        }
    }

    fn bounds(&self, addr: u32, len: usize) -> Result<core::ops::Range<usize>> {
        let start = addr as usize;
        let end = start.checked_add(len).ok_or(Status::InvalidParam)?;
        if end > self.cells.lock().len() {
            return Err(Status::InvalidParam);
        }
        Ok(start..end)
    }

    fn erase_span(&self, addr: u32, span: usize) -> Result<()> {
        self.guard()?;
        let start = (addr as usize / span) * span;
        let range = self.bounds(start as u32, span)?;
        let mut cells = self.cells.lock();
        cells[range].fill(ERASED);
        Ok(())
    }
}

impl Device for MockFlash {
    fn class(&self) -> DeviceClass {
        DeviceClass::Flash
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

impl Lifecycle for MockFlash {
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

impl PowerControl for MockFlash {
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

impl Diagnostic for MockFlash {
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
        let stats = FlashStats {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            page_erases: self.page_erases.load(Ordering::Relaxed),
            sector_erases: self.sector_erases.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        };
        stats.encode(buf)
    }

    fn clear_statistics(&self) -> Result<()> {
        self.bytes_read.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.page_erases.store(0, Ordering::Relaxed);
        self.sector_erases.store(0, Ordering::Relaxed);
        self.write_errors.store(0, Ordering::Relaxed);
        Ok(())
    }
}

impl FlashDevice for MockFlash {
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.guard()?;
        let range = self.bounds(addr, buf.len())?;
        let cells = self.cells.lock();
        buf.copy_from_slice(&cells[range]);
        self.bytes_read.fetch_add(buf.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn write(&self, addr: u32, data: &[u8]) -> Result<()> {
        self.guard()?;
        let range = self.bounds(addr, data.len())?;
        let mut cells = self.cells.lock();
        if cells[range.clone()].iter().any(|&b| b != ERASED) {
            self.write_errors.fetch_add(1, Ordering::Relaxed);
            return Err(Status::Io);
        }
        cells[range].copy_from_slice(data);
        self.bytes_written
            .fetch_add(data.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn erase_page(&self, addr: u32) -> Result<()> {
        self.erase_span(addr, self.page_size)?;
        self.page_erases.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn erase_sector(&self, addr: u32) -> Result<()> {
        self.erase_span(addr, self.sector_size)?;
        self.sector_erases.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn sector_size(&self) -> usize {
        self.sector_size
    }

    fn capacity(&self) -> usize {
        self.cells.lock().len()
    }
}

/// In-memory option-byte block: programmed values stage until a reset
/// would apply them.
pub struct MockOptionBytes {
    name: String,
    active: AtomicU32,
    staged: AtomicU32,
}

impl MockOptionBytes {
    pub fn new(name: &str, initial: u32) -> Arc<MockOptionBytes> {
        Arc::new(MockOptionBytes {
            name: String::from(name),
            active: AtomicU32::new(initial),
            staged: AtomicU32::new(initial),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulate the reset that applies staged changes.
    pub fn apply_staged(&self) {
        self.active
            .store(self.staged.load(Ordering::Acquire), Ordering::Release);
    }
}

impl Device for MockOptionBytes {
    fn class(&self) -> DeviceClass {
        DeviceClass::OptionBytes
    }
}

impl OptionBytesDevice for MockOptionBytes {
    fn read(&self) -> Result<u32> {
        Ok(self.active.load(Ordering::Acquire))
    }

    fn program(&self, value: u32) -> Result<()> {
        self.staged.store(value, Ordering::Release);
        Ok(())
    }

    fn has_pending_changes(&self) -> Result<bool> {
        Ok(self.staged.load(Ordering::Acquire) != self.active.load(Ordering::Acquire))
    }
}
