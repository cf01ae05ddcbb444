//! Build-time configuration constants.
//!
//! These are the consumption point for the external configuration
//! system; each constant can be retuned per product without touching
//! the subsystems that read it.

/// Highest valid task priority (0 is lowest).
pub const TASK_PRIORITY_MAX: u8 = 31;

/// Largest item size accepted by [`crate::queue::Queue::create`], in bytes.
pub const QUEUE_MAX_ITEM_SIZE: usize = 256;

/// Width of an event group bitmask in bits. The contract floor is 16.
pub const EVENT_BITS: u32 = 32;

const _: () = assert!(EVENT_BITS >= 16);

/// Soft tick rate for the cooperative backend, in Hz.
pub const TICK_HZ: u32 = 1000;

/// Heap budget used by the dynamic allocation mode when no explicit
/// [`crate::mem::MemConfig`] is supplied.
pub const MEM_HEAP_SIZE_DEFAULT: usize = 1024 * 1024;

/// Interval between timer service sweeps on the hosted backend, in ms.
pub const TIMER_SERVICE_PERIOD_MS: u32 = 1;
