use byteorder::{BigEndian, ByteOrder};

use crate::PacketError;

/// Primary header length.
pub const PRIMARY_HEADER_LEN: usize = 6;
/// Primary + command secondary header (function code, checksum).
pub const COMMAND_HEADER_LEN: usize = 8;
/// Primary + telemetry secondary header (seconds u32, subseconds u16).
pub const TELEMETRY_HEADER_LEN: usize = 12;

const TYPE_COMMAND: u16 = 0x1000;
const SEQ_MASK: u16 = 0x3FFF;
const SEQ_UNSEGMENTED: u16 = 0xC000;

/// Packet timestamp. `subseconds` is a 32-bit binary fraction of a second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct PacketTime {
    pub seconds: u32,
    pub subseconds: u32,
}

impl PacketTime {
    pub fn new(seconds: u32, subseconds: u32) -> Self {
        Self {
            seconds,
            subseconds,
        }
    }
}

/// What the archiving engine needs to know about a message.
pub trait Packet {
    fn message_id(&self) -> u32;

    /// 14-bit source sequence counter.
    fn sequence_count(&self) -> u16;

    /// Packet time; zero when the packet carries none.
    fn time(&self) -> PacketTime;

    /// Command function code, `None` for telemetry.
    fn command_code(&self) -> Option<u8>;

    /// Bytes after the (primary and secondary) headers.
    fn payload(&self) -> &[u8];

    /// The whole packet as it is archived.
    fn as_bytes(&self) -> &[u8];

    fn total_len(&self) -> usize {
        self.as_bytes().len()
    }
}

/// Owned CCSDS space packet with a cFE-style secondary header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcsdsPacket {
    bytes: Vec<u8>,
}

impl CcsdsPacket {
    /// Wraps raw bytes, checking the primary header length field.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PacketError> {
        if bytes.len() < PRIMARY_HEADER_LEN {
            return Err(PacketError::Truncated {
                len: bytes.len(),
                need: PRIMARY_HEADER_LEN,
            });
        }
        let declared = BigEndian::read_u16(&bytes[4..6]) as usize + PRIMARY_HEADER_LEN + 1;
        if declared != bytes.len() {
            return Err(PacketError::LengthMismatch {
                declared,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    /// Builds a telemetry packet.
    pub fn telemetry(mid: u16, seq: u16, time: PacketTime, data: &[u8]) -> Self {
        let mut bytes = vec![0u8; TELEMETRY_HEADER_LEN + data.len()];
        Self::write_primary(&mut bytes, mid, seq);
        BigEndian::write_u32(&mut bytes[6..10], time.seconds);
        BigEndian::write_u16(&mut bytes[10..12], (time.subseconds >> 16) as u16);
        bytes[TELEMETRY_HEADER_LEN..].copy_from_slice(data);
        Self { bytes }
    }

    /// Builds a command packet. `mid` should carry the command type bit.
    pub fn command(mid: u16, code: u8, payload: &[u8]) -> Self {
        let mut bytes = vec![0u8; COMMAND_HEADER_LEN + payload.len()];
        Self::write_primary(&mut bytes, mid, 0);
        bytes[6] = code & 0x7F;
        bytes[COMMAND_HEADER_LEN..].copy_from_slice(payload);
        Self { bytes }
    }

    fn write_primary(bytes: &mut [u8], mid: u16, seq: u16) {
        let len = bytes.len();
        BigEndian::write_u16(&mut bytes[0..2], mid);
        BigEndian::write_u16(&mut bytes[2..4], SEQ_UNSEGMENTED | (seq & SEQ_MASK));
        BigEndian::write_u16(&mut bytes[4..6], (len - PRIMARY_HEADER_LEN - 1) as u16);
    }

    pub fn is_command(&self) -> bool {
        BigEndian::read_u16(&self.bytes[0..2]) & TYPE_COMMAND != 0
    }

    fn header_len(&self) -> usize {
        if self.is_command() {
            COMMAND_HEADER_LEN
        } else {
            TELEMETRY_HEADER_LEN
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Packet for CcsdsPacket {
    fn message_id(&self) -> u32 {
        u32::from(BigEndian::read_u16(&self.bytes[0..2]))
    }

    fn sequence_count(&self) -> u16 {
        BigEndian::read_u16(&self.bytes[2..4]) & SEQ_MASK
    }

    fn time(&self) -> PacketTime {
        if self.is_command() || self.bytes.len() < TELEMETRY_HEADER_LEN {
            return PacketTime::default();
        }
        PacketTime {
            seconds: BigEndian::read_u32(&self.bytes[6..10]),
            subseconds: u32::from(BigEndian::read_u16(&self.bytes[10..12])) << 16,
        }
    }

    fn command_code(&self) -> Option<u8> {
        if self.is_command() && self.bytes.len() >= COMMAND_HEADER_LEN {
            Some(self.bytes[6] & 0x7F)
        } else {
            None
        }
    }

    fn payload(&self) -> &[u8] {
        let start = self.header_len().min(self.bytes.len());
        &self.bytes[start..]
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
