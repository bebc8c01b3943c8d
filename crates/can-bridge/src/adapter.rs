use crate::baud;
use can_transport::status::{CAN_MSGAVAIL, CAN_OK};
use can_transport::{CanFrame, CanId, PeripheralCan, Result, SpiCan, Timestamp, TransportError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Which controller family the adapter drives. Fixed for the adapter's life.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    #[default]
    Peripheral,
    ExternalSpi,
}

/// The one driver an initialized adapter owns.
#[derive(Debug)]
pub enum Backend<P, S> {
    Peripheral(P),
    Spi { driver: S, baud_code: u8 },
}

/// Single call surface over an on-chip (`P`) or SPI-attached (`S`) controller.
///
/// Construction does no I/O. [`CanAdapter::initialize`] builds the driver for
/// the chosen [`ControllerKind`] and starts it; every other operation forwards
/// to that driver.
#[derive(Debug)]
pub struct CanAdapter<P, S> {
    kind: ControllerKind,
    chip_select: Option<u8>,
    backend: Option<Backend<P, S>>,
}

impl<P, S> Default for CanAdapter<P, S> {
    fn default() -> Self {
        Self::new(ControllerKind::default(), None)
    }
}

impl<P, S> CanAdapter<P, S> {
    /// `chip_select` is only kept for [`ControllerKind::ExternalSpi`].
    pub fn new(kind: ControllerKind, chip_select: Option<u8>) -> Self {
        let chip_select = match kind {
            ControllerKind::ExternalSpi => chip_select,
            ControllerKind::Peripheral => None,
        };
        Self {
            kind,
            chip_select,
            backend: None,
        }
    }

    pub fn peripheral() -> Self {
        Self::new(ControllerKind::Peripheral, None)
    }

    pub fn external_spi(chip_select: u8) -> Self {
        Self::new(ControllerKind::ExternalSpi, Some(chip_select))
    }

    pub fn kind(&self) -> ControllerKind {
        self.kind
    }

    pub fn chip_select(&self) -> Option<u8> {
        self.chip_select
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    /// Baud code handed to the SPI driver. `None` for on-chip controllers and
    /// before initialization.
    pub fn resolved_baud_code(&self) -> Option<u8> {
        match self.backend {
            Some(Backend::Spi { baud_code, .. }) => Some(baud_code),
            _ => None,
        }
    }

    pub fn backend(&self) -> Option<&Backend<P, S>> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut Backend<P, S>> {
        self.backend.as_mut()
    }

    pub fn into_backend(self) -> Option<Backend<P, S>> {
        self.backend
    }

    fn backend_or_err(&mut self) -> Result<&mut Backend<P, S>> {
        self.backend.as_mut().ok_or(TransportError::NotInitialized)
    }
}

impl<P, S> CanAdapter<P, S>
where
    P: PeripheralCan,
    S: SpiCan,
{
    /// Build and start the driver for this adapter's kind.
    ///
    /// `requested` is a baud code when `<= 13` and a bit rate otherwise; it is
    /// translated to whatever unit the selected driver expects. Returns the
    /// outcome of [`CanAdapter::startup`].
    pub fn initialize(&mut self, requested: u32) -> Result<()> {
        self.initialize_with(requested, P::open, S::open)
    }

    /// [`CanAdapter::initialize`] with caller-supplied driver constructors.
    ///
    /// Only the constructor matching the adapter's kind is called.
    pub fn initialize_with<FP, FS>(
        &mut self,
        requested: u32,
        open_peripheral: FP,
        open_spi: FS,
    ) -> Result<()>
    where
        FP: FnOnce(u32) -> P,
        FS: FnOnce(u8) -> S,
    {
        if self.backend.is_some() {
            return Err(TransportError::AlreadyInitialized);
        }

        let backend = match self.kind {
            ControllerKind::Peripheral => {
                let bitrate = baud::to_bitrate(requested);
                info!(requested, bitrate, "opening on-chip CAN controller");
                Backend::Peripheral(open_peripheral(bitrate))
            }
            ControllerKind::ExternalSpi => {
                let baud_code = baud::to_baud_code(requested);
                let chip_select = self.chip_select.unwrap_or(0);
                info!(
                    requested,
                    baud_code, chip_select, "opening SPI CAN controller"
                );
                Backend::Spi {
                    driver: open_spi(chip_select),
                    baud_code,
                }
            }
        };
        self.backend = Some(backend);

        self.startup()
    }

    /// Start (or restart) the driver.
    ///
    /// An on-chip controller always reports success; its own start status is
    /// not consulted. An SPI controller's start status is returned as
    /// [`TransportError::StartFailed`] unless it is `CAN_OK`.
    pub fn startup(&mut self) -> Result<()> {
        match self.backend_or_err()? {
            Backend::Peripheral(driver) => {
                let status = driver.begin();
                debug!(status, "on-chip controller started; status ignored");
                Ok(())
            }
            Backend::Spi { driver, baud_code } => {
                let status = driver.begin(*baud_code);
                if status == CAN_OK {
                    info!(baud_code = *baud_code, "SPI controller started");
                    Ok(())
                } else {
                    warn!(status, baud_code = *baud_code, "SPI controller failed to start");
                    Err(TransportError::StartFailed { status })
                }
            }
        }
    }

    /// Send one frame. Driver-side send failures are not reported.
    pub fn transmit(&mut self, frame: &CanFrame) -> Result<()> {
        let status = match self.backend_or_err()? {
            Backend::Peripheral(driver) => driver.write(frame),
            Backend::Spi { driver, .. } => driver.send_msg_buf(
                frame.id.raw(),
                frame.id.is_extended(),
                frame.len,
                frame.payload(),
            ),
        };
        debug!(%frame, status, "transmit");
        Ok(())
    }

    /// Read one frame into `out`.
    ///
    /// No availability check is made; call [`CanAdapter::pending`] first. With
    /// nothing to read, `out` holds whatever the driver leaves behind.
    ///
    /// The SPI driver does not expose the IDE bit, so for that backend the
    /// extended flag is inferred from the identifier: `>= 2048` is extended.
    pub fn receive(&mut self, out: &mut CanFrame) -> Result<()> {
        match self.backend_or_err()? {
            Backend::Peripheral(driver) => {
                driver.read(out);
            }
            Backend::Spi { driver, .. } => {
                let mut len = 0u8;
                let mut buf = [0u8; 8];
                driver.read_msg_buf(&mut len, &mut buf);
                out.data = buf;
                out.len = len;
                out.id = CanId::from_raw_inferred(driver.can_id());
                out.rtr = false;
                out.timestamp = Some(Timestamp::now());
            }
        }
        debug!(frame = %out, "receive");
        Ok(())
    }

    /// Whether the driver reports a received frame waiting.
    pub fn pending(&mut self) -> Result<bool> {
        Ok(match self.backend_or_err()? {
            Backend::Peripheral(driver) => driver.available(),
            Backend::Spi { driver, .. } => driver.check_receive() == CAN_MSGAVAIL,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use can_transport::{MockPeripheral, MockSpi};

    type Adapter = CanAdapter<MockPeripheral, MockSpi>;

    #[test]
    fn test_default_is_peripheral() {
        let adapter = Adapter::default();
        assert_eq!(adapter.kind(), ControllerKind::Peripheral);
        assert_eq!(adapter.chip_select(), None);
        assert!(!adapter.is_initialized());
    }

    #[test]
    fn test_chip_select_dropped_for_peripheral() {
        let adapter = Adapter::new(ControllerKind::Peripheral, Some(10));
        assert_eq!(adapter.chip_select(), None);
    }

    #[test]
    fn test_operations_before_initialize() {
        let mut adapter = Adapter::external_spi(10);
        let frame = CanFrame::default();
        let mut out = CanFrame::default();
        assert_eq!(adapter.startup(), Err(TransportError::NotInitialized));
        assert_eq!(adapter.transmit(&frame), Err(TransportError::NotInitialized));
        assert_eq!(adapter.receive(&mut out), Err(TransportError::NotInitialized));
        assert_eq!(adapter.pending(), Err(TransportError::NotInitialized));
        assert_eq!(adapter.resolved_baud_code(), None);
    }

    #[test]
    fn test_second_initialize_rejected() {
        let mut adapter = Adapter::external_spi(4);
        adapter.initialize(500_000).unwrap();
        assert_eq!(
            adapter.initialize(125_000),
            Err(TransportError::AlreadyInitialized)
        );
        assert_eq!(adapter.resolved_baud_code(), Some(baud::CAN_500KBPS));
    }

    #[test]
    fn test_only_matching_constructor_runs() {
        let mut adapter = Adapter::peripheral();
        adapter
            .initialize_with(
                baud::CAN_1000KBPS.into(),
                MockPeripheral::open,
                |_| -> MockSpi { panic!("SPI driver must not be built") },
            )
            .unwrap();
        match adapter.backend() {
            Some(Backend::Peripheral(bus)) => assert_eq!(bus.bitrate(), 1_000_000),
            other => panic!("unexpected backend: {other:?}"),
        }
    }

    #[test]
    fn test_missing_chip_select_defaults_to_zero() {
        let mut adapter = Adapter::new(ControllerKind::ExternalSpi, None);
        adapter.initialize(250_000).unwrap();
        match adapter.backend() {
            Some(Backend::Spi { driver, .. }) => assert_eq!(driver.chip_select(), 0),
            other => panic!("unexpected backend: {other:?}"),
        }
    }
}
