//! Ordered init-all / deinit-all sweeps. Single test function: the
//! sweeps walk the whole process-global registry.

use strata_hal::device::{self, DeviceContext, DeviceDescriptor, DeviceHooks};
use strata_hal::iface::DeviceIface;
use strata_hal::mock::MockUart;
use strata_osal::status::Status;

use std::sync::Mutex;

static TRACE: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn traced_init(ctx: &DeviceContext) -> strata_osal::Result<DeviceIface> {
    TRACE.lock().unwrap().push(ctx.name.to_string());
    Ok(DeviceIface::Uart(MockUart::new(ctx.name, 0)))
}

fn traced_deinit(iface: &DeviceIface) -> strata_osal::Result<()> {
    let uart = iface.as_uart().expect("sweep devices are uarts");
    TRACE.lock().unwrap().push(format!("~{}", uart.name()));
    Ok(())
}

fn failing_init(_ctx: &DeviceContext) -> strata_osal::Result<DeviceIface> {
    Err(Status::Io)
}

fn descriptor(
    name: &'static str,
    init: fn(&DeviceContext) -> strata_osal::Result<DeviceIface>,
) -> DeviceDescriptor {
    DeviceDescriptor {
        name,
        default_config: None,
        config_size: 0,
        hooks: DeviceHooks {
            init: Some(init),
            deinit: Some(traced_deinit),
            suspend: None,
            resume: None,
        },
    }
}

#[test]
fn test_sweeps_walk_in_order_and_survive_failures() {
    let _ = env_logger::builder().is_test(true).try_init();
    strata_hal::init_default().unwrap();

    device::register(descriptor("sweep-a", traced_init)).unwrap();
    device::register(descriptor("sweep-bad", failing_init)).unwrap();
    device::register(descriptor("sweep-b", traced_init)).unwrap();
    device::register(descriptor("sweep-c", traced_init)).unwrap();

    // Init sweep: declaration order, failure recorded but not fatal to
    // the rest, worst error returned.
    assert_eq!(device::init_all(), Err(Status::Io));
    assert_eq!(
        TRACE.lock().unwrap().as_slice(),
        ["sweep-a", "sweep-b", "sweep-c"]
    );
    assert!(device::info("sweep-a").unwrap().initialized);
    assert!(!device::info("sweep-bad").unwrap().initialized);
    assert_eq!(device::info("sweep-bad").unwrap().init_result, Status::Io);
    assert!(device::info("sweep-c").unwrap().initialized);

    // Devices initialized by the sweep carry no references yet.
    assert_eq!(device::info("sweep-a").unwrap().ref_count, 0);

    // Acquiring the broken device records the failure with its
    // registry index as the source token ("sweep-bad" is entry 1).
    strata_osal::error::clear_error();
    assert_eq!(device::get("sweep-bad").map(|_| ()), Err(Status::Io));
    let record = strata_osal::get_last_error().unwrap();
    assert_eq!(record.code, Status::Io);
    assert_eq!(record.source, 1);

    // A later sweep skips the already-initialized entries.
    TRACE.lock().unwrap().clear();
    assert_eq!(device::init_all(), Err(Status::Io));
    assert!(TRACE.lock().unwrap().is_empty());

    // Deinit sweep tears down in reverse declaration order.
    TRACE.lock().unwrap().clear();
    device::deinit_all().unwrap();
    assert_eq!(
        TRACE.lock().unwrap().as_slice(),
        ["~sweep-c", "~sweep-b", "~sweep-a"]
    );
    assert!(!device::info("sweep-a").unwrap().initialized);
    assert!(!device::info("sweep-c").unwrap().initialized);
}
