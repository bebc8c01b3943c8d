use crate::CanFrame;

/// Status codes returned by MCP2515-class SPI drivers.
pub mod status {
    pub const CAN_OK: u8 = 0;
    pub const CAN_FAILINIT: u8 = 1;
    pub const CAN_FAILTX: u8 = 2;
    pub const CAN_MSGAVAIL: u8 = 3;
    pub const CAN_NOMSG: u8 = 4;
    pub const CAN_CTRLERROR: u8 = 5;
    pub const CAN_GETTXBFTIMEOUT: u8 = 6;
    pub const CAN_SENDMSGTIMEOUT: u8 = 7;
    pub const CAN_FAIL: u8 = 0xFF;
}

/// Driver for a CAN controller built into the MCU.
///
/// Such drivers are configured in bits per second and exchange whole frames.
pub trait PeripheralCan {
    /// Construct a driver bound to `bitrate` bits per second. No bus traffic.
    fn open(bitrate: u32) -> Self
    where
        Self: Sized;

    /// Bring the controller onto the bus.
    fn begin(&mut self) -> u8;

    /// Queue one frame for transmission.
    fn write(&mut self, frame: &CanFrame) -> u8;

    /// Fill `frame` with the next received frame, if any.
    fn read(&mut self, frame: &mut CanFrame) -> u8;

    /// Whether a received frame is waiting.
    fn available(&mut self) -> bool;
}

/// Driver for an external controller chip reached over SPI.
///
/// These drivers take an enumerated baud code instead of a bit rate and work
/// with decomposed frames. The IDE bit of a received frame is not exposed,
/// only the identifier.
pub trait SpiCan {
    /// Construct a driver addressed through `chip_select`. No bus traffic.
    fn open(chip_select: u8) -> Self
    where
        Self: Sized;

    /// Reset and configure the chip for `baud_code`. Returns a [`status`] code.
    fn begin(&mut self, baud_code: u8) -> u8;

    fn send_msg_buf(&mut self, id: u32, ext: bool, len: u8, buf: &[u8]) -> u8;

    /// Copy the next received payload into `buf` and its length into `len`.
    fn read_msg_buf(&mut self, len: &mut u8, buf: &mut [u8; 8]) -> u8;

    /// Identifier of the frame last returned by [`SpiCan::read_msg_buf`].
    fn can_id(&self) -> u32;

    /// Poll the receive status register: `CAN_MSGAVAIL` or `CAN_NOMSG`.
    fn check_receive(&mut self) -> u8;
}
