//! Registry capacity limit. Own binary: it fills the whole table.

use strata_hal::config::MAX_DEVICES;
use strata_hal::device::{self, DeviceDescriptor, DeviceHooks};
use strata_osal::status::Status;

const NAMES: [&str; 33] = [
    "cap-00", "cap-01", "cap-02", "cap-03", "cap-04", "cap-05", "cap-06", "cap-07", "cap-08",
    "cap-09", "cap-10", "cap-11", "cap-12", "cap-13", "cap-14", "cap-15", "cap-16", "cap-17",
    "cap-18", "cap-19", "cap-20", "cap-21", "cap-22", "cap-23", "cap-24", "cap-25", "cap-26",
    "cap-27", "cap-28", "cap-29", "cap-30", "cap-31", "cap-32",
];

#[test]
fn test_registry_capacity() {
    assert!(NAMES.len() > MAX_DEVICES);

    for &name in NAMES.iter().take(MAX_DEVICES) {
        device::register(DeviceDescriptor {
            name,
            default_config: None,
            config_size: 0,
            hooks: DeviceHooks::default(),
        })
        .unwrap();
    }
    assert_eq!(device::count(), MAX_DEVICES);

    // The table is full.
    assert_eq!(
        device::register(DeviceDescriptor {
            name: NAMES[MAX_DEVICES],
            default_config: None,
            config_size: 0,
            hooks: DeviceHooks::default(),
        }),
        Err(Status::NoResource)
    );

    // An empty name never registers.
    assert_eq!(
        device::register(DeviceDescriptor {
            name: "",
            default_config: None,
            config_size: 0,
            hooks: DeviceHooks::default(),
        }),
        Err(Status::InvalidParam)
    );

    // Unregistering frees a slot for reuse.
    device::unregister("cap-00").unwrap();
    device::register(DeviceDescriptor {
        name: NAMES[MAX_DEVICES],
        default_config: None,
        config_size: 0,
        hooks: DeviceHooks::default(),
    })
    .unwrap();

    // Enumeration sees every registered device.
    let mut seen = 0;
    device::for_each(|_| seen += 1);
    assert_eq!(seen, MAX_DEVICES);
}
