use crate::traits::status::{CAN_MSGAVAIL, CAN_NOMSG, CAN_OK};
use crate::{CanFrame, PeripheralCan, SpiCan, Timestamp};
use std::collections::VecDeque;
use tracing::debug;

/// In-process stand-in for an on-chip CAN controller.
///
/// Written frames are looped back into the receive queue so flows are testable
/// without hardware.
#[derive(Debug, Default)]
pub struct MockPeripheral {
    bitrate: u32,
    begin_status: u8,
    starts: usize,
    loopback: bool,
    written: Vec<CanFrame>,
    rx: VecDeque<CanFrame>,
}

impl MockPeripheral {
    /// Status `begin` reports. The adapter ignores it for this backend.
    pub fn with_begin_status(mut self, status: u8) -> Self {
        self.begin_status = status;
        self
    }

    pub fn with_loopback(mut self, loopback: bool) -> Self {
        self.loopback = loopback;
        self
    }

    /// Place a frame in the receive queue as if it came off the bus.
    pub fn inject(&mut self, frame: CanFrame) {
        self.rx.push_back(frame);
    }

    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    pub fn starts(&self) -> usize {
        self.starts
    }

    pub fn written(&self) -> &[CanFrame] {
        &self.written
    }
}

impl PeripheralCan for MockPeripheral {
    fn open(bitrate: u32) -> Self {
        Self {
            bitrate,
            loopback: true,
            ..Self::default()
        }
    }

    fn begin(&mut self) -> u8 {
        self.starts += 1;
        debug!(bitrate = self.bitrate, status = self.begin_status, "mock peripheral begin");
        self.begin_status
    }

    fn write(&mut self, frame: &CanFrame) -> u8 {
        self.written.push(frame.clone());
        if self.loopback {
            let mut echo = frame.clone();
            echo.timestamp = Some(Timestamp::now());
            self.rx.push_back(echo);
        }
        1
    }

    fn read(&mut self, frame: &mut CanFrame) -> u8 {
        // An empty queue leaves the caller's buffer as it was.
        match self.rx.pop_front() {
            Some(next) => {
                *frame = next;
                1
            }
            None => 0,
        }
    }

    fn available(&mut self) -> bool {
        !self.rx.is_empty()
    }
}

/// A frame as the SPI driver was asked to send it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SentFrame {
    pub id: u32,
    pub ext: bool,
    pub len: u8,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug)]
struct RawFrame {
    id: u32,
    len: u8,
    data: [u8; 8],
}

/// In-process stand-in for an MCP2515-class controller.
///
/// Like the real chip driver it only reports the identifier of a received
/// frame, never its IDE bit.
#[derive(Debug, Default)]
pub struct MockSpi {
    chip_select: u8,
    begin_status: u8,
    begun_with: Option<u8>,
    receive_status: Option<u8>,
    loopback: bool,
    sent: Vec<SentFrame>,
    rx: VecDeque<RawFrame>,
    last_id: u32,
}

impl MockSpi {
    pub fn with_begin_status(mut self, status: u8) -> Self {
        self.begin_status = status;
        self
    }

    pub fn with_loopback(mut self, loopback: bool) -> Self {
        self.loopback = loopback;
        self
    }

    /// Force `check_receive` to report `status` regardless of the queue.
    pub fn with_receive_status(mut self, status: u8) -> Self {
        self.receive_status = Some(status);
        self
    }

    /// Queue a received frame given only what the chip would report.
    pub fn inject_raw(&mut self, id: u32, payload: &[u8]) {
        let mut data = [0u8; 8];
        let len = payload.len().min(8);
        data[..len].copy_from_slice(&payload[..len]);
        self.rx.push_back(RawFrame {
            id,
            len: len as u8,
            data,
        });
    }

    pub fn chip_select(&self) -> u8 {
        self.chip_select
    }

    /// Baud code of the most recent `begin`, if any.
    pub fn begun_with(&self) -> Option<u8> {
        self.begun_with
    }

    pub fn sent(&self) -> &[SentFrame] {
        &self.sent
    }
}

impl SpiCan for MockSpi {
    fn open(chip_select: u8) -> Self {
        Self {
            chip_select,
            begin_status: CAN_OK,
            loopback: true,
            ..Self::default()
        }
    }

    fn begin(&mut self, baud_code: u8) -> u8 {
        self.begun_with = Some(baud_code);
        debug!(
            chip_select = self.chip_select,
            baud_code,
            status = self.begin_status,
            "mock SPI begin"
        );
        self.begin_status
    }

    fn send_msg_buf(&mut self, id: u32, ext: bool, len: u8, buf: &[u8]) -> u8 {
        let n = usize::from(len).min(buf.len());
        debug!(id, ext, len, "mock SPI send");
        self.sent.push(SentFrame {
            id,
            ext,
            len,
            data: buf[..n].to_vec(),
        });
        if self.loopback {
            self.inject_raw(id, &buf[..n]);
        }
        CAN_OK
    }

    fn read_msg_buf(&mut self, len: &mut u8, buf: &mut [u8; 8]) -> u8 {
        match self.rx.pop_front() {
            Some(frame) => {
                *len = frame.len;
                *buf = frame.data;
                self.last_id = frame.id;
                CAN_OK
            }
            None => CAN_NOMSG,
        }
    }

    fn can_id(&self) -> u32 {
        self.last_id
    }

    fn check_receive(&mut self) -> u8 {
        if let Some(status) = self.receive_status {
            return status;
        }
        if self.rx.is_empty() {
            CAN_NOMSG
        } else {
            CAN_MSGAVAIL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CanId;

    #[test]
    fn test_peripheral_loopback() {
        let mut bus = MockPeripheral::open(500_000);
        assert_eq!(bus.bitrate(), 500_000);
        assert!(!bus.available());

        let frame = CanFrame::new(CanId::standard(0x100).unwrap(), &[1, 2]).unwrap();
        bus.write(&frame);
        assert!(bus.available());

        let mut out = CanFrame::default();
        assert_eq!(bus.read(&mut out), 1);
        assert_eq!(out.id, frame.id);
        assert_eq!(out.payload(), &[1, 2]);
        assert!(out.timestamp.is_some());
    }

    #[test]
    fn test_peripheral_read_empty_keeps_buffer() {
        let mut bus = MockPeripheral::open(250_000).with_loopback(false);
        let stale = CanFrame::new(CanId::standard(0x7).unwrap(), &[9]).unwrap();
        let mut out = stale.clone();
        assert_eq!(bus.read(&mut out), 0);
        assert_eq!(out, stale);
    }

    #[test]
    fn test_spi_receive_reports_id_only() {
        let mut chip = MockSpi::open(10);
        assert_eq!(chip.chip_select(), 10);
        assert_eq!(chip.check_receive(), CAN_NOMSG);

        chip.inject_raw(0x1234_5678, &[0xAA, 0xBB, 0xCC]);
        assert_eq!(chip.check_receive(), CAN_MSGAVAIL);

        let mut len = 0;
        let mut buf = [0u8; 8];
        assert_eq!(chip.read_msg_buf(&mut len, &mut buf), CAN_OK);
        assert_eq!(len, 3);
        assert_eq!(&buf[..3], &[0xAA, 0xBB, 0xCC]);
        assert_eq!(chip.can_id(), 0x1234_5678);
        assert_eq!(chip.check_receive(), CAN_NOMSG);
    }

    #[test]
    fn test_spi_scripted_receive_status() {
        let mut chip = MockSpi::open(3).with_receive_status(crate::status::CAN_CTRLERROR);
        chip.inject_raw(0x10, &[1]);
        assert_eq!(chip.check_receive(), crate::status::CAN_CTRLERROR);
    }

    #[test]
    fn test_spi_scripted_begin() {
        let mut chip = MockSpi::open(3).with_begin_status(crate::status::CAN_FAILINIT);
        assert_eq!(chip.begin(2), crate::status::CAN_FAILINIT);
        assert_eq!(chip.begun_with(), Some(2));
    }
}
