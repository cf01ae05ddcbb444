//! Mock UART: loopback FIFOs with a polled async TX state machine.

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use spin::Mutex;

use strata_osal::status::{Result, Status};
use strata_osal::{block_until, Deadline};

use crate::iface::{
    Device, DeviceClass, DeviceState, Diagnostic, Lifecycle, PowerControl, UartDevice, UartStats,
};
use crate::transport::{RxAsync, RxOutcome, RxSync, TxAsync, TxState, TxSync};

/// In-memory UART.
///
/// Bytes written through any TX path land in the TX log; the RX paths
/// drain whatever a test fed through [`MockUart::feed_rx`]. The async
/// transmitter reports `Busy` for a configurable number of state polls
/// after each send, so adapter wait loops have real work to do.
pub struct MockUart {
    name: String,
    state: Mutex<DeviceState>,
    enabled: AtomicBool,

    tx_log: Mutex<Vec<u8>>,
    rx_fifo: Mutex<VecDeque<u8>>,

    /// State polls a started async send stays busy for.
    busy_polls: u32,
    busy_left: AtomicU32,

    tx_bytes: AtomicU64,
    rx_bytes: AtomicU64,
    overruns: AtomicU32,
}

impl MockUart {
    pub fn new(name: &str, busy_polls: u32) -> Arc<MockUart> {
        Arc::new(MockUart {
            name: String::from(name),
            state: Mutex::new(DeviceState::Running),
            enabled: AtomicBool::new(true),
            tx_log: Mutex::new(Vec::new()),
            rx_fifo: Mutex::new(VecDeque::new()),
            busy_polls,
            busy_left: AtomicU32::new(0),
            tx_bytes: AtomicU64::new(0),
            rx_bytes: AtomicU64::new(0),
            overruns: AtomicU32::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue bytes for the receive paths.
    pub fn feed_rx(&self, data: &[u8]) {
        self.rx_fifo.lock().extend(data.iter().copied());
    }

    /// Everything transmitted so far.
    pub fn tx_log(&self) -> Vec<u8> {
        self.tx_log.lock().clone()
    }

    fn guard(&self) -> Result<()> {
        match *self.state.lock() {
            DeviceState::Uninitialized => Err(Status::NotInitialized),
            DeviceState::Suspended => Err(Status::Suspended),
            DeviceState::Running => Ok(()),
        }
    }

    fn pop_rx(&self, buf: &mut [u8]) -> usize {
        let mut fifo = self.rx_fifo.lock();
        let count = fifo.len().min(buf.len());
        for slot in buf.iter_mut().take(count) {
            *slot = fifo.pop_front().unwrap_or_default();
        }
        if count > 0 {
            self.rx_bytes.fetch_add(count as u64, Ordering::Relaxed);
        }
        count
    }
}

impl Device for MockUart {
    fn class(&self) -> DeviceClass {
        DeviceClass::Uart
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

impl Lifecycle for MockUart {
    fn init(&self) -> Result<()> {
        *self.state.lock() = DeviceState::Running;
        Ok(())
    }

    fn deinit(&self) -> Result<()> {
        *self.state.lock() = DeviceState::Uninitialized;
        Ok(())
    }

    fn suspend(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != DeviceState::Running {
            return Err(Status::InvalidState);
        }
        *state = DeviceState::Suspended;
        Ok(())
    }

    fn resume(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != DeviceState::Suspended {
            return Err(Status::InvalidState);
        }
        *state = DeviceState::Running;
        Ok(())
    }

    fn state(&self) -> DeviceState {
        *self.state.lock()
    }
}

impl PowerControl for MockUart {
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

impl Diagnostic for MockUart {
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
        let stats = UartStats {
            tx_bytes: self.tx_bytes.load(Ordering::Relaxed),
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            framing_errors: 0,
            parity_errors: 0,
            busy: self.busy_left.load(Ordering::Relaxed) > 0,
        };
        stats.encode(buf)
    }

    fn clear_statistics(&self) -> Result<()> {
        self.tx_bytes.store(0, Ordering::Relaxed);
        self.rx_bytes.store(0, Ordering::Relaxed);
        self.overruns.store(0, Ordering::Relaxed);
        Ok(())
    }
}

impl UartDevice for MockUart {
    fn send(&self, data: &[u8], _timeout_ms: u32) -> Result<()> {
        self.guard()?;
        self.tx_log.lock().extend_from_slice(data);
        self.tx_bytes.fetch_add(data.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn receive(&self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
        self.guard()?;
        let mut count = 0usize;
        let got = block_until(
            || {
                count = self.pop_rx(buf);
                count > 0
            },
            timeout_ms,
        );
        if got {
            Ok(count)
        } else {
            Err(Status::Timeout)
        }
    }

    fn tx_async(&self) -> Option<&dyn TxAsync> {
        Some(self)
    }

    fn rx_async(&self) -> Option<&dyn RxAsync> {
        Some(self)
    }
}

impl TxAsync for MockUart {
    fn send(&self, data: &[u8]) -> Result<()> {
        self.guard()?;
        if self.busy_left.load(Ordering::Acquire) > 0 {
            return Err(Status::Busy);
        }
        self.busy_left.store(self.busy_polls, Ordering::Release);
        self.tx_log.lock().extend_from_slice(data);
        self.tx_bytes.fetch_add(data.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn state(&self) -> TxState {
        let left = self.busy_left.load(Ordering::Acquire);
        if left == 0 {
            return TxState::Ready;
        }
        self.busy_left.store(left - 1, Ordering::Release);
        TxState::Busy
    }
}

impl RxAsync for MockUart {
    fn receive(&self, buf: &mut [u8]) -> Result<usize> {
        self.guard()?;
        match self.pop_rx(buf) {
            0 => Err(Status::NoData),
            count => Ok(count),
        }
    }
}

impl TxSync for MockUart {
    fn send(&self, data: &[u8], timeout_ms: u32) -> Result<()> {
        UartDevice::send(self, data, timeout_ms)
    }
}

impl RxSync for MockUart {
    fn receive(&self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
        UartDevice::receive(self, buf, timeout_ms)
    }

    fn receive_all(&self, buf: &mut [u8], timeout_ms: u32) -> RxOutcome {
        let deadline = Deadline::new(timeout_ms);
        let mut filled = 0usize;
        while filled < buf.len() {
            filled += self.pop_rx(&mut buf[filled..]);
            if filled >= buf.len() {
                break;
            }
            if deadline.expired() {
                return RxOutcome {
                    count: filled,
                    status: Status::Timeout,
                };
            }
            strata_osal::relax();
        }
        RxOutcome {
            count: filled,
            status: Status::Ok,
        }
    }
}
