//! Portable OS abstraction layer.
//!
//! Uniform tasking, synchronization, queueing, timing, and memory
//! services over either a preemptive host scheduler or a cooperative
//! run-to-completion loop. Application and driver code written against
//! this crate moves between backends unchanged; the primitives keep
//! the same blocking, timeout, and ISR-safety contract on both.
//!
//! # Bring-up
//!
//! ```
//! strata_osal::init().unwrap();
//! let queue = strata_osal::queue::Queue::<u32>::create(8).unwrap();
//! queue.send(7, strata_osal::NO_WAIT).unwrap();
//! assert_eq!(queue.receive(strata_osal::NO_WAIT).unwrap(), 7);
//! ```
//!
//! `init` is idempotent; every call succeeds and the first one pins
//! the backend choice.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod config;
pub mod critical;
pub mod diag;
pub mod error;
pub mod hooks;
pub mod mem;
pub mod queue;
pub mod sched;
pub mod status;
pub mod sync;
pub mod task;
pub mod time;
pub mod timer;

use core::sync::atomic::{AtomicBool, Ordering};

pub use error::{get_last_error, record_error, report_error, ErrorRecord};
pub use hooks::OsalHooks;
pub use sched::{backend_kind, block_until, relax, BackendKind, TaskId};
pub use status::{code_to_str, Result, Status};
pub use time::{now_ms, Deadline, NO_WAIT, WAIT_FOREVER};

/// OSAL bring-up configuration.
#[derive(Debug, Clone, Copy)]
pub struct OsalConfig {
    pub backend: BackendKind,
}

impl Default for OsalConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

fn default_backend() -> BackendKind {
    #[cfg(feature = "std")]
    {
        BackendKind::Preemptive
    }
    #[cfg(not(feature = "std"))]
    {
        BackendKind::Cooperative
    }
}

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize the OSAL with the default backend. Idempotent: every
/// call returns `Ok`.
pub fn init() -> Result<()> {
    init_with(OsalConfig::default())
}

/// Initialize the OSAL with an explicit backend choice. The first call
/// pins the backend; later calls with a different choice are logged
/// and ignored.
pub fn init_with(config: OsalConfig) -> Result<()> {
    sched::select_backend(config.backend);
    if !INITIALIZED.swap(true, Ordering::AcqRel) {
        log::info!("osal: initialized ({:?} backend)", sched::backend_kind());
    }
    Ok(())
}

/// True once [`init`] has run.
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}
