//! Build-time configuration constants.

/// Device registry capacity.
pub const MAX_DEVICES: usize = 32;

/// Per-device reference ceiling.
pub const MAX_REF_COUNT: u8 = 255;

/// Slots per sync/async adapter kind.
pub const ADAPTER_POOL_SIZE: usize = 4;

/// Timeout applied by the sync-to-async TX adapter to each underlying
/// synchronous send, in milliseconds.
pub const ADAPTER_TX_TIMEOUT_MS: u32 = 100;
