//! Mock device implementations.
//!
//! In-memory drivers implementing the capability interfaces for
//! testing without hardware. Each mock registers through the ordinary
//! descriptor protocol, keeps its statistics in atomics, and supports
//! the same lifecycle/power/diagnostic surface a real driver would.

pub mod adc;
pub mod flash;
pub mod gpio;
pub mod i2c;
pub mod spi;
pub mod uart;

pub use adc::MockAdc;
pub use flash::{MockFlash, MockOptionBytes};
pub use gpio::MockGpio;
pub use i2c::MockI2c;
pub use spi::MockSpi;
pub use uart::MockUart;
