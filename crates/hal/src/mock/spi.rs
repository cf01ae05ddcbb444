//! Mock SPI bus: loopback transfers with real bus-lock semantics.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use spin::Mutex;

use strata_osal::status::{Result, Status};
use strata_osal::sync::Mutex as OsalMutex;
use strata_osal::task;

use crate::iface::{
    Device, DeviceClass, DeviceState, Diagnostic, Lifecycle, PowerControl, SpiDevice, SpiMode,
    SpiStats,
};

/// In-memory SPI bus.
///
/// Transfers loop TX back into RX through a settable response byte, so
/// tests can model a responding peripheral. The bus lock is a real
/// OSAL mutex: operations from a task that does not hold a taken lock
/// fail with `Locked`, which is the contract drivers rely on when
/// sharing one bus across several chip selects.
pub struct MockSpi {
    name: String,
    state: Mutex<DeviceState>,
    enabled: AtomicBool,

    bus: OsalMutex,
    cs_active: AtomicBool,
    mode: Mutex<SpiMode>,
    clock_hz: AtomicU32,

    /// XOR mask applied to TX bytes to produce the RX side.
    response_mask: AtomicU8,
    tx_trace: Mutex<Vec<u8>>,

    tx_bytes: AtomicU64,
    rx_bytes: AtomicU64,
    transfers: AtomicU64,
    errors: AtomicU32,
}

impl MockSpi {
    pub fn new(name: &str) -> Arc<MockSpi> {
        Arc::new(MockSpi {
            name: String::from(name),
            state: Mutex::new(DeviceState::Running),
            enabled: AtomicBool::new(true),
            bus: OsalMutex::create().expect("mutex creation is infallible"),
            cs_active: AtomicBool::new(false),
            mode: Mutex::new(SpiMode::Mode0),
            clock_hz: AtomicU32::new(1_000_000),
            response_mask: AtomicU8::new(0),
            tx_trace: Mutex::new(Vec::new()),
            tx_bytes: AtomicU64::new(0),
            rx_bytes: AtomicU64::new(0),
            transfers: AtomicU64::new(0),
            errors: AtomicU32::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mask XORed into transmitted bytes to form the receive side.
    pub fn set_response_mask(&self, mask: u8) {
        self.response_mask.store(mask, Ordering::Relaxed);
    }

    /// Every byte clocked out so far.
    pub fn tx_trace(&self) -> Vec<u8> {
        self.tx_trace.lock().clone()
    }

    pub fn cs_is_active(&self) -> bool {
        self.cs_active.load(Ordering::Acquire)
    }

    pub fn clock_hz(&self) -> u32 {
        self.clock_hz.load(Ordering::Acquire)
    }

    pub fn mode(&self) -> SpiMode {
        *self.mode.lock()
    }

    fn guard(&self) -> Result<()> {
        match *self.state.lock() {
            DeviceState::Uninitialized => return Err(Status::NotInitialized),
            DeviceState::Suspended => return Err(Status::Suspended),
            DeviceState::Running => {}
        }
        // A bus held by another task refuses interleaved traffic.
        if let Some(owner) = self.bus.owner() {
            if owner != task::current() {
                return Err(Status::Locked);
            }
        }
        Ok(())
    }

    fn clock_out(&self, tx: &[u8], rx: Option<&mut [u8]>) {
        let mask = self.response_mask.load(Ordering::Relaxed);
        self.tx_trace.lock().extend_from_slice(tx);
        self.tx_bytes.fetch_add(tx.len() as u64, Ordering::Relaxed);
        if let Some(rx) = rx {
            for (slot, &byte) in rx.iter_mut().zip(tx.iter()) {
                *slot = byte ^ mask;
            }
            self.rx_bytes.fetch_add(rx.len() as u64, Ordering::Relaxed);
        }
        self.transfers.fetch_add(1, Ordering::Relaxed);
    }
}

impl Device for MockSpi {
    fn class(&self) -> DeviceClass {
        DeviceClass::Spi
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

impl Lifecycle for MockSpi {
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

impl PowerControl for MockSpi {
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

impl Diagnostic for MockSpi {
    fn status(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 2 {
            return Err(Status::InvalidSize);
        }
        buf[0] = match *self.state.lock() {
            DeviceState::Uninitialized => 0,
            DeviceState::Running => 1,
            DeviceState::Suspended => 2,
        };
        buf[1] = self.cs_is_active() as u8;
        Ok(2)
    }

    fn statistics(&self, buf: &mut [u8]) -> Result<usize> {
        let stats = SpiStats {
            tx_bytes: self.tx_bytes.load(Ordering::Relaxed),
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
            transfers: self.transfers.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            busy: self.bus.is_locked(),
        };
        stats.encode(buf)
    }

    fn clear_statistics(&self) -> Result<()> {
        self.tx_bytes.store(0, Ordering::Relaxed);
        self.rx_bytes.store(0, Ordering::Relaxed);
        self.transfers.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        Ok(())
    }
}

impl SpiDevice for MockSpi {
    fn transfer(&self, tx: &[u8], rx: &mut [u8], _timeout_ms: u32) -> Result<()> {
        self.guard()?;
        if tx.len() != rx.len() {
            self.errors.fetch_add(1, Ordering::Relaxed);
            return Err(Status::InvalidSize);
        }
        self.clock_out(tx, Some(rx));
        Ok(())
    }

    fn transmit(&self, tx: &[u8], _timeout_ms: u32) -> Result<()> {
        self.guard()?;
        self.clock_out(tx, None);
        Ok(())
    }

    fn receive(&self, rx: &mut [u8], _timeout_ms: u32) -> Result<()> {
        self.guard()?;
        // Half-duplex read clocks out filler bytes.
        let mask = self.response_mask.load(Ordering::Relaxed);
        rx.fill(0xff ^ mask);
        self.rx_bytes.fetch_add(rx.len() as u64, Ordering::Relaxed);
        self.transfers.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn cs_select(&self) -> Result<()> {
        self.guard()?;
        self.cs_active.store(true, Ordering::Release);
        Ok(())
    }

    fn cs_deselect(&self) -> Result<()> {
        self.guard()?;
        self.cs_active.store(false, Ordering::Release);
        Ok(())
    }

    fn bus_lock(&self, timeout_ms: u32) -> Result<()> {
        self.bus.lock(timeout_ms)
    }

    fn bus_unlock(&self) -> Result<()> {
        self.bus.unlock()
    }

    fn set_clock_hz(&self, hz: u32) -> Result<()> {
        if hz == 0 {
            return Err(Status::InvalidParam);
        }
        self.clock_hz.store(hz, Ordering::Release);
        Ok(())
    }

    fn set_mode(&self, mode: SpiMode) -> Result<()> {
        self.guard()?;
        *self.mode.lock() = mode;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_osal::NO_WAIT;

    #[test]
    fn test_loopback_transfer() {
        let spi = MockSpi::new("spi-mock");
        spi.set_response_mask(0xff);

        let tx = [0x12u8, 0x34, 0x56];
        let mut rx = [0u8; 3];
        spi.transfer(&tx, &mut rx, NO_WAIT).unwrap();
        assert_eq!(rx, [0xed, 0xcb, 0xa9]);
        assert_eq!(spi.tx_trace(), tx);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let spi = MockSpi::new("spi-len");
        let mut rx = [0u8; 2];
        assert_eq!(
            spi.transfer(&[1, 2, 3], &mut rx, NO_WAIT),
            Err(Status::InvalidSize)
        );
    }

    #[test]
    fn test_cs_and_configuration() {
        let spi = MockSpi::new("spi-cfg");
        spi.cs_select().unwrap();
        assert!(spi.cs_is_active());
        spi.cs_deselect().unwrap();
        assert!(!spi.cs_is_active());

        spi.set_mode(SpiMode::Mode3).unwrap();
        assert_eq!(spi.mode(), SpiMode::Mode3);
        spi.set_clock_hz(8_000_000).unwrap();
        assert_eq!(spi.clock_hz(), 8_000_000);
        assert_eq!(spi.set_clock_hz(0), Err(Status::InvalidParam));
    }

    #[test]
    fn test_bus_lock_is_recursive_for_owner() {
        let spi = MockSpi::new("spi-lock");
        spi.bus_lock(NO_WAIT).unwrap();
        spi.bus_lock(NO_WAIT).unwrap();
        // The owner keeps transferring while holding the lock.
        spi.transmit(&[1], NO_WAIT).unwrap();
        spi.bus_unlock().unwrap();
        spi.bus_unlock().unwrap();
        assert_eq!(spi.bus_unlock(), Err(Status::InvalidState));
    }
}
