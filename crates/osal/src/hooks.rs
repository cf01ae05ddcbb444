//! Platform hook record.
//!
//! The OSAL consumes a small set of platform services through an
//! optional capability record instead of weak symbols: a millisecond
//! tick source and a yield primitive. Every field has a core-supplied
//! default, so a hosted build needs no hooks at all and a bare-metal
//! port installs exactly what its platform provides.

use spin::RwLock;

/// Optional platform services consumed by the OSAL.
#[derive(Clone, Copy, Default)]
pub struct OsalHooks {
    /// Millisecond tick source. Default: hosted monotonic clock under
    /// `std`, the soft tick counter otherwise.
    pub tick_ms: Option<fn() -> u32>,
    /// Processor yield. Default: `std::thread::yield_now` under `std`,
    /// a spin-loop hint otherwise.
    pub yield_now: Option<fn()>,
}

static HOOKS: RwLock<OsalHooks> = RwLock::new(OsalHooks {
    tick_ms: None,
    yield_now: None,
});

/// Install the platform hook record, replacing any previous one.
pub fn install(hooks: OsalHooks) {
    *HOOKS.write() = hooks;
}

/// Reset every hook to its core-supplied default.
pub fn reset() {
    *HOOKS.write() = OsalHooks::default();
}

pub(crate) fn tick_hook() -> Option<fn() -> u32> {
    HOOKS.read().tick_ms
}

pub(crate) fn call_yield() {
    let hook = HOOKS.read().yield_now;
    match hook {
        Some(f) => f(),
        None => {
            #[cfg(feature = "std")]
            std::thread::yield_now();
            #[cfg(not(feature = "std"))]
            core::hint::spin_loop();
        }
    }
}
