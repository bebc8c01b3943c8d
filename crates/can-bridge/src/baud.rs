//! Bit-rate translation between the two backend conventions.
//!
//! On-chip controllers are configured in bits per second, SPI controllers with
//! a small enumerated code. A requested value is read as a code when it is at
//! most [`MAX_BAUD_CODE`] and as a bit rate otherwise. Only the four common
//! rates translate; anything else falls back to 250 kbit/s.

/// Largest value interpreted as a baud code rather than a bit rate.
pub const MAX_BAUD_CODE: u32 = 13;

pub const CAN_125KBPS: u8 = 0;
pub const CAN_250KBPS: u8 = 1;
pub const CAN_500KBPS: u8 = 2;
pub const CAN_1000KBPS: u8 = 3;

/// Bit rate used when a request does not match a known rate.
pub const DEFAULT_BITRATE: u32 = 250_000;

const CANONICAL: [(u8, u32); 4] = [
    (CAN_125KBPS, 125_000),
    (CAN_250KBPS, 250_000),
    (CAN_500KBPS, 500_000),
    (CAN_1000KBPS, 1_000_000),
];

pub fn is_baud_code(requested: u32) -> bool {
    requested <= MAX_BAUD_CODE
}

/// Resolve a request to bits per second for an on-chip controller.
pub fn to_bitrate(requested: u32) -> u32 {
    if !is_baud_code(requested) {
        return requested;
    }
    CANONICAL
        .iter()
        .find(|(code, _)| u32::from(*code) == requested)
        .map_or(DEFAULT_BITRATE, |(_, hz)| *hz)
}

/// Resolve a request to a baud code for an SPI controller.
pub fn to_baud_code(requested: u32) -> u8 {
    if is_baud_code(requested) {
        return requested as u8;
    }
    CANONICAL
        .iter()
        .find(|(_, hz)| *hz == requested)
        .map_or(CAN_250KBPS, |(code, _)| *code)
}
