//! Tick source and deadline tracking.
//!
//! All blocking primitives measure time in milliseconds against a
//! monotonic tick. The tick comes from the installed platform hook
//! when present; otherwise a hosted build reads the process clock and
//! a freestanding build falls back to the soft tick counter advanced
//! by [`tick_advance`].

use core::sync::atomic::{AtomicU32, Ordering};

use crate::hooks;

/// Timeout value meaning "attempt once, never wait".
pub const NO_WAIT: u32 = 0;

/// Timeout value meaning "wait indefinitely".
pub const WAIT_FOREVER: u32 = u32::MAX;

/// Soft tick counter for ports without a tick hook.
static SOFT_TICK_MS: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "std")]
static CLOCK_START: spin::Lazy<std::time::Instant> = spin::Lazy::new(std::time::Instant::now);

/// Current monotonic time in milliseconds. Wraps at `u32::MAX`.
pub fn now_ms() -> u32 {
    if let Some(tick) = hooks::tick_hook() {
        return tick();
    }
    #[cfg(feature = "std")]
    {
        CLOCK_START.elapsed().as_millis() as u32
    }
    #[cfg(not(feature = "std"))]
    {
        SOFT_TICK_MS.load(Ordering::Relaxed)
    }
}

/// Advance the soft tick counter. Called from the platform tick
/// interrupt on ports that use the fallback source.
pub fn tick_advance(ms: u32) {
    SOFT_TICK_MS.fetch_add(ms, Ordering::Relaxed);
}

/// Wrap-safe "has `now` reached `deadline`" comparison.
#[inline]
pub(crate) fn reached(now: u32, deadline: u32) -> bool {
    now.wrapping_sub(deadline) < u32::MAX / 2
}

/// A started timeout window.
///
/// Cheap to create and copy; every blocking primitive opens one at the
/// call boundary and polls [`Deadline::expired`] from its wait loop.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: u32,
    timeout_ms: u32,
}

impl Deadline {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            start: now_ms(),
            timeout_ms,
        }
    }

    /// True for a deadline opened with [`WAIT_FOREVER`].
    #[inline]
    pub fn is_forever(&self) -> bool {
        self.timeout_ms == WAIT_FOREVER
    }

    /// Milliseconds elapsed since the window opened.
    pub fn elapsed_ms(&self) -> u32 {
        now_ms().wrapping_sub(self.start)
    }

    /// Milliseconds left in the window; `u32::MAX` when unbounded.
    pub fn remaining_ms(&self) -> u32 {
        if self.is_forever() {
            return u32::MAX;
        }
        self.timeout_ms.saturating_sub(self.elapsed_ms())
    }

    pub fn expired(&self) -> bool {
        !self.is_forever() && self.elapsed_ms() >= self.timeout_ms
    }
}
