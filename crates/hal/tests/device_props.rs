//! Reference-count monotonicity under random get/put interleavings.

use proptest::prelude::*;

use strata_hal::device::{self, DeviceContext, DeviceDescriptor, DeviceHooks};
use strata_hal::iface::DeviceIface;
use strata_hal::mock::MockUart;
use strata_osal::status::Status;

fn uart_init(ctx: &DeviceContext) -> strata_osal::Result<DeviceIface> {
    Ok(DeviceIface::Uart(MockUart::new(ctx.name, 0)))
}

fn ensure_registered() {
    let result = device::register(DeviceDescriptor {
        name: "prop-uart",
        default_config: None,
        config_size: 0,
        hooks: DeviceHooks {
            init: Some(uart_init),
            ..DeviceHooks::default()
        },
    });
    assert!(matches!(result, Ok(()) | Err(Status::AlreadyInitialized)));
}

proptest! {
    // At every step, gets minus puts equals the observed ref_count.
    #[test]
    fn prop_ref_count_tracks_interleaving(ops in proptest::collection::vec(any::<bool>(), 1..64)) {
        ensure_registered();
        let mut held = Vec::new();
        for acquire in ops {
            if acquire {
                held.push(device::get("prop-uart").unwrap());
            } else if let Some(handle) = held.pop() {
                device::put(handle).unwrap();
            }
            prop_assert_eq!(
                device::info("prop-uart").unwrap().ref_count as usize,
                held.len()
            );
        }
        let remaining = held.len();
        for (i, handle) in held.into_iter().enumerate() {
            device::put(handle).unwrap();
            prop_assert_eq!(
                device::info("prop-uart").unwrap().ref_count as usize,
                remaining - i - 1
            );
        }
        prop_assert!(!device::info("prop-uart").unwrap().initialized);
    }
}
