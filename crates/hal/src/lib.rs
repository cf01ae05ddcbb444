//! Hardware abstraction layer.
//!
//! Peripherals are reached through a name-keyed device registry:
//! drivers register descriptors with lifecycle hooks, applications
//! acquire reference-counted handles and operate the device through
//! its capability interface (base I/O per peripheral class, plus the
//! lifecycle, power, and diagnostic subinterfaces). Sync/async
//! transport adapters and a process-wide power manager round out the
//! layer. All waiting, locking, and timing goes through `strata-osal`.
//!
//! # Bring-up
//!
//! ```
//! strata_hal::init_default().unwrap();
//! assert!(strata_hal::is_initialized());
//! ```
//!
//! Platform specifics (init/deinit, power transitions) enter through
//! the optional [`PlatformHooks`] record; every hook defaults to a
//! no-op success, so hosted builds boot with no platform code at all.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod adapter;
pub mod config;
pub mod device;
pub mod iface;
#[cfg(any(test, feature = "mock-devices"))]
pub mod mock;
pub mod power;
pub mod transport;

use core::sync::atomic::{AtomicBool, Ordering};
use spin::RwLock;

use strata_osal::status::{Result, Status};

pub use power::PowerMode;

/// Optional platform services consumed by the HAL.
#[derive(Clone, Copy, Default)]
pub struct PlatformHooks {
    /// One-time platform bring-up, run by the first [`init`].
    pub platform_init: Option<fn() -> Result<()>>,
    /// Platform teardown, run by [`deinit`].
    pub platform_deinit: Option<fn() -> Result<()>>,
    /// Hardware power-mode transition.
    pub enter_power_mode: Option<fn(PowerMode) -> Result<()>>,
}

static HOOKS: RwLock<PlatformHooks> = RwLock::new(PlatformHooks {
    platform_init: None,
    platform_deinit: None,
    enter_power_mode: None,
});

static INITIALIZED: AtomicBool = AtomicBool::new(false);

pub(crate) fn hooks() -> PlatformHooks {
    *HOOKS.read()
}

/// Initialize the HAL with a platform hook record.
///
/// Idempotent: the first call installs the hooks and runs
/// `platform_init`; later calls return `Ok` without side effect.
pub fn init(platform: PlatformHooks) -> Result<()> {
    if INITIALIZED.load(Ordering::Acquire) {
        return Ok(());
    }
    *HOOKS.write() = platform;
    strata_osal::init()?;
    if let Some(hook) = platform.platform_init {
        if let Err(status) = hook() {
            log::error!("hal: platform init failed: {}", status);
            return Err(status);
        }
    }
    INITIALIZED.store(true, Ordering::Release);
    log::info!("hal: initialized (v{})", version());
    Ok(())
}

/// Initialize the HAL with default (no-op) platform hooks.
pub fn init_default() -> Result<()> {
    init(PlatformHooks::default())
}

/// Tear the HAL down: runs `platform_deinit` and resets the power
/// manager. Idempotent like [`init`].
pub fn deinit() -> Result<()> {
    if !INITIALIZED.swap(false, Ordering::AcqRel) {
        return Ok(());
    }
    let platform = hooks();
    if let Some(hook) = platform.platform_deinit {
        if let Err(status) = hook() {
            log::error!("hal: platform deinit failed: {}", status);
            INITIALIZED.store(true, Ordering::Release);
            return Err(status);
        }
    }
    power::reset();
    log::info!("hal: deinitialized");
    Ok(())
}

/// True between a successful [`init`] and [`deinit`].
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Crate version string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// Re-exported so a status import travels with the HAL prelude.
pub use strata_osal::status::{Result as HalResult, Status as HalStatus};
