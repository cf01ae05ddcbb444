//! Sync/async adapter pool tests, driven by the mock UART endpoints.

use strata_hal::adapter::{
    acquire_rx_async, acquire_rx_sync, acquire_tx_async, acquire_tx_sync, pool_free_slots,
    release_rx_async, release_rx_sync, release_tx_async, release_tx_sync,
};
use strata_hal::config::ADAPTER_POOL_SIZE;
use strata_hal::mock::MockUart;
use strata_hal::transport::{RxAsync, RxSync, TxAsync, TxState, TxSync};
use strata_osal::status::Status;

use std::sync::Arc as StdArc;
use std::sync::Mutex as StdMutex;

// Adapter pools are process-global; run these tests one at a time.
static SERIAL: StdMutex<()> = StdMutex::new(());

fn setup() -> std::sync::MutexGuard<'static, ()> {
    let _ = env_logger::builder().is_test(true).try_init();
    strata_hal::init_default().unwrap();
    SERIAL.lock().unwrap()
}

#[test]
fn test_tx_async_to_sync_completes() {
    let _guard = setup();
    let uart = MockUart::new("a-tx-sync", 3);
    let adapter = acquire_tx_sync(uart.clone()).unwrap();

    // Three busy polls stand between send and completion.
    adapter.send(b"ping", 1000).unwrap();
    assert_eq!(uart.tx_log(), b"ping");
    release_tx_sync(adapter).unwrap();
}

#[test]
fn test_tx_async_to_sync_times_out() {
    let _guard = setup();
    // Effectively never drains within the timeout.
    let uart = MockUart::new("a-tx-stuck", u32::MAX);
    let adapter = acquire_tx_sync(uart.clone()).unwrap();
    assert_eq!(adapter.send(b"x", 40), Err(Status::Timeout));
    release_tx_sync(adapter).unwrap();
}

#[test]
fn test_rx_async_to_sync_receive() {
    let _guard = setup();
    let uart = MockUart::new("a-rx-sync", 0);
    let adapter = acquire_rx_sync(uart.clone()).unwrap();

    uart.feed_rx(b"abc");
    let mut buf = [0u8; 8];
    assert_eq!(adapter.receive(&mut buf, 100).unwrap(), 3);
    assert_eq!(&buf[..3], b"abc");

    // Nothing pending: timed out.
    assert_eq!(adapter.receive(&mut buf, 30), Err(Status::Timeout));
    release_rx_sync(adapter).unwrap();
}

#[test]
fn test_rx_receive_all_partial_reports_timeout_with_count() {
    let _guard = setup();
    let uart = MockUart::new("a-rx-all", 0);
    let adapter = acquire_rx_sync(uart.clone()).unwrap();

    uart.feed_rx(b"12");
    let mut buf = [0u8; 6];
    let outcome = adapter.receive_all(&mut buf, 50);
    assert_eq!(outcome.status, Status::Timeout);
    assert_eq!(outcome.count, 2);
    assert_eq!(&buf[..2], b"12");

    // A feeder completing the buffer in time yields a clean result.
    let feeder_uart = uart.clone();
    let feeder = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        feeder_uart.feed_rx(b"345678");
    });
    let outcome = adapter.receive_all(&mut buf, 500);
    feeder.join().unwrap();
    assert_eq!(outcome.status, Status::Ok);
    assert_eq!(outcome.count, 6);
    assert_eq!(&buf, b"345678");
    release_rx_sync(adapter).unwrap();
}

// A sync transmitter that always times out, for the busy mapping.
struct StuckTx;

impl TxSync for StuckTx {
    fn send(&self, _data: &[u8], _timeout_ms: u32) -> strata_osal::Result<()> {
        Err(Status::Timeout)
    }
}

#[test]
fn test_tx_sync_to_async_busy_mapping() {
    let _guard = setup();
    let uart = MockUart::new("a-tx-async", 0);
    let adapter = acquire_tx_async(uart.clone()).unwrap();
    assert_eq!(adapter.state(), TxState::Ready);
    TxAsync::send(&adapter, b"ok").unwrap();
    assert_eq!(adapter.state(), TxState::Ready);
    assert_eq!(uart.tx_log(), b"ok");
    release_tx_async(adapter).unwrap();

    let stuck = acquire_tx_async(StdArc::new(StuckTx)).unwrap();
    assert_eq!(TxAsync::send(&stuck, b"x"), Err(Status::Busy));
    assert_eq!(stuck.state(), TxState::Busy);
    release_tx_async(stuck).unwrap();
}

#[test]
fn test_rx_sync_to_async_no_data_mapping() {
    let _guard = setup();
    let uart = MockUart::new("a-rx-async", 0);
    let adapter = acquire_rx_async(uart.clone()).unwrap();

    let mut buf = [0u8; 4];
    assert_eq!(RxAsync::receive(&adapter, &mut buf), Err(Status::NoData));

    uart.feed_rx(b"zz");
    assert_eq!(RxAsync::receive(&adapter, &mut buf).unwrap(), 2);
    release_rx_async(adapter).unwrap();
}

#[test]
fn test_pool_exhaustion_and_reuse() {
    let _guard = setup();
    let uart = MockUart::new("a-pool", 0);
    assert_eq!(pool_free_slots().0, ADAPTER_POOL_SIZE);

    let mut held = Vec::new();
    for _ in 0..ADAPTER_POOL_SIZE {
        held.push(acquire_tx_sync(uart.clone()).unwrap());
    }
    assert!(acquire_tx_sync(uart.clone()).is_none());
    assert_eq!(pool_free_slots().0, 0);

    // Releasing one slot makes acquisition work again.
    release_tx_sync(held.pop().unwrap()).unwrap();
    let again = acquire_tx_sync(uart.clone()).unwrap();
    held.push(again);

    for adapter in held {
        release_tx_sync(adapter).unwrap();
    }
    assert_eq!(pool_free_slots().0, ADAPTER_POOL_SIZE);
}
