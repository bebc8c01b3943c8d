//! can-transport: frame types and driver seams for CAN controllers
//!
//! This crate defines the frame model shared by every backend and the two driver traits the
//! bridge dispatches to: [`PeripheralCan`] for controllers built into the MCU and [`SpiCan`] for
//! external chips on the SPI bus. The default build enables in-process `mock` drivers so that
//! binaries and tests run on any host without hardware.

mod types;
pub use types::{CanFrame, CanId, Timestamp, MAX_EXTENDED_ID, MAX_STANDARD_ID};

mod error;
pub use error::{Result, TransportError};

mod traits;
pub use traits::{status, PeripheralCan, SpiCan};

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockPeripheral, MockSpi, SentFrame};
