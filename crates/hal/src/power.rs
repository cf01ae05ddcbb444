//! Process-wide power manager.
//!
//! Validates and records the requested mode; the actual hardware
//! transition is delegated to the `enter_power_mode` platform hook.

use core::sync::atomic::{AtomicU8, Ordering};

use strata_osal::status::{Result, Status};

/// System power mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerMode {
    Run = 0,
    Sleep = 1,
    Stop = 2,
}

impl PowerMode {
    /// Decode a raw mode value; anything past `Stop` is rejected.
    pub fn from_raw(raw: u8) -> Result<PowerMode> {
        match raw {
            0 => Ok(PowerMode::Run),
            1 => Ok(PowerMode::Sleep),
            2 => Ok(PowerMode::Stop),
            _ => Err(Status::InvalidParam),
        }
    }
}

static MODE: AtomicU8 = AtomicU8::new(PowerMode::Run as u8);

/// Transition to `mode`, delegating the hardware side to the platform
/// hook. The recorded mode changes only when the hook accepts.
pub fn enter_mode(mode: PowerMode) -> Result<()> {
    if let Some(hook) = crate::hooks().enter_power_mode {
        hook(mode)?;
    }
    MODE.store(mode as u8, Ordering::Release);
    log::info!("power: entered {:?} mode", mode);
    Ok(())
}

/// Currently recorded mode.
pub fn get_mode() -> PowerMode {
    match PowerMode::from_raw(MODE.load(Ordering::Acquire)) {
        Ok(mode) => mode,
        Err(_) => PowerMode::Run,
    }
}

pub(crate) fn reset() {
    MODE.store(PowerMode::Run as u8, Ordering::Release);
}
