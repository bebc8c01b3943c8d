use core::fmt;
use time::OffsetDateTime;

/// Highest identifier that fits in an 11-bit standard frame.
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Highest identifier that fits in a 29-bit extended frame.
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// 11-bit or 29-bit CAN identifier
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct CanId {
    raw: u32,
    extended: bool,
}

impl CanId {
    pub fn standard(id11: u16) -> Option<Self> {
        if u32::from(id11) <= MAX_STANDARD_ID {
            Some(Self {
                raw: u32::from(id11),
                extended: false,
            })
        } else {
            None
        }
    }

    pub fn extended(id29: u32) -> Option<Self> {
        if id29 <= MAX_EXTENDED_ID {
            Some(Self {
                raw: id29,
                extended: true,
            })
        } else {
            None
        }
    }

    /// Classify a bare identifier by its magnitude.
    ///
    /// Some controllers hand back the received identifier without the IDE bit.
    /// Anything above the 11-bit range must have come from an extended frame,
    /// so values `>= 2048` are treated as extended and the rest as standard.
    /// An extended frame whose identifier happens to be below 2048 is reported
    /// as standard.
    ///
    /// The flag is decided on the value exactly as the driver reported it; only
    /// then is the stored identifier cut to 29 bits.
    pub fn from_raw_inferred(raw: u32) -> Self {
        Self {
            raw: raw & MAX_EXTENDED_ID,
            extended: raw > MAX_STANDARD_ID,
        }
    }

    pub fn raw(&self) -> u32 {
        self.raw
    }
    pub fn is_extended(&self) -> bool {
        self.extended
    }
}

impl fmt::Display for CanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extended {
            write!(f, "0x{raw:08X}", raw = self.raw)
        } else {
            write!(f, "0x{raw:03X}", raw = self.raw)
        }
    }
}

/// A classic CAN data frame: identifier, up to 8 payload bytes.
///
/// The payload buffer is always 8 bytes; `len` says how many are meaningful.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CanFrame {
    pub id: CanId,
    pub len: u8,
    pub data: [u8; 8],
    pub rtr: bool,
    pub timestamp: Option<Timestamp>,
}

impl CanFrame {
    pub fn new(id: CanId, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let mut buf = [0u8; 8];
        buf[..data.len()].copy_from_slice(data);
        Some(Self {
            id,
            len: data.len() as u8,
            data: buf,
            rtr: false,
            timestamp: None,
        })
    }

    /// The meaningful part of the payload. A corrupt `len` is clamped to 8.
    pub fn payload(&self) -> &[u8] {
        let len = usize::from(self.len).min(self.data.len());
        &self.data[..len]
    }
}

impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.id, self.len)?;
        for b in self.payload() {
            write!(f, " {b:02X}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timestamp(pub OffsetDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_id_range() {
        assert!(CanId::standard(0x7FF).is_some());
        assert!(CanId::standard(0x800).is_none());
    }

    #[test]
    fn test_extended_id_range() {
        assert!(CanId::extended(0x1FFF_FFFF).is_some());
        assert!(CanId::extended(0x2000_0000).is_none());
    }

    #[test]
    fn test_inferred_extended_boundary() {
        let below = CanId::from_raw_inferred(2047);
        assert!(!below.is_extended());
        assert_eq!(below.raw(), 2047);

        let at = CanId::from_raw_inferred(2048);
        assert!(at.is_extended());
        assert_eq!(at.raw(), 2048);
    }

    #[test]
    fn test_inferred_high_bits_are_extended() {
        let id = CanId::from_raw_inferred(0x8000_0100);
        assert!(id.is_extended());
        assert_eq!(id.raw(), 0x100);

        let all = CanId::from_raw_inferred(u32::MAX);
        assert!(all.is_extended());
        assert_eq!(all.raw(), MAX_EXTENDED_ID);
    }

    #[test]
    fn test_frame_rejects_long_payload() {
        let id = CanId::standard(0x123).unwrap();
        assert!(CanFrame::new(id, &[0u8; 9]).is_none());
        let frame = CanFrame::new(id, &[1, 2, 3]).unwrap();
        assert_eq!(frame.len, 3);
        assert_eq!(frame.payload(), &[1, 2, 3]);
        assert_eq!(frame.data[3..], [0u8; 5]);
    }

    #[test]
    fn test_display() {
        let std = CanFrame::new(CanId::standard(0x12).unwrap(), &[0xAB]).unwrap();
        assert_eq!(std.to_string(), "0x012 [1] AB");
        let ext = CanId::extended(0x18FF_0001).unwrap();
        assert_eq!(ext.to_string(), "0x18FF0001");
    }
}
