//! can-bridge: one CAN API over two kinds of controller
//!
//! Application code talks to a [`CanAdapter`]; at construction it is pointed at either an
//! on-chip controller or an external SPI controller, and every call is forwarded to the driver
//! for that kind. The bridge translates the requested bit rate into the unit each driver
//! expects and recovers the extended-identifier flag the SPI driver does not report. Bit timing,
//! SPI framing and interrupt handling stay inside the drivers.

pub mod baud;

mod adapter;
pub use adapter::{Backend, CanAdapter, ControllerKind};

mod config;
pub use config::{load_adapter_config, parse_adapter_config, AdapterConfig};

pub use can_transport::{CanFrame, CanId, PeripheralCan, Result, SpiCan, TransportError};
