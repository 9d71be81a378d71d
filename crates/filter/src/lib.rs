///! # Admission Filter
///!
///! Decides, for one packet and one filter, whether the packet passes.
///!
///! A filter is the triple N/X/O: of every group of X consecutive attribute
///! values starting at offset O, the first N pass. The attribute is either the
///! packet's 14-bit sequence counter (by-count) or a 16-bit value folded from
///! the low bits of its timestamp (by-time).
///!
///! ```text
///! x = 4, n = 1, o = 0        attr: 0 1 2 3 4 5 6 7 8
///!                            pass: P . . . P . . . P
///! ```
///!
///! Degenerate parameters (`n == 0`, `x == 0`, `n > x`, `o >= x`) and unknown
///! filter types always filter the packet out; [`evaluate`] never fails.
///!
///! ## Example
///!
///! ```rust
///! use filter::{evaluate, CcsdsPacket, PacketTime, Verdict};
///!
///! let pkt = CcsdsPacket::telemetry(0x0801, 8, PacketTime::default(), &[]);
///! assert_eq!(evaluate(&pkt, 1, 1, 4, 0), Verdict::Passed);
///! ```
mod packet;

use thiserror::Error;

pub use packet::{CcsdsPacket, Packet, PacketTime};

/// Which packet attribute a filter samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FilterType {
    /// 14-bit sequence counter.
    #[default]
    ByCount = 1,
    /// Folded timestamp bits.
    ByTime = 2,
}

impl TryFrom<u16> for FilterType {
    type Error = PacketError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::ByCount),
            2 => Ok(Self::ByTime),
            other => Err(PacketError::UnknownFilterType(other)),
        }
    }
}

/// Result of applying one filter to one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Filtered,
}

impl Verdict {
    #[must_use]
    pub fn passed(self) -> bool {
        self == Verdict::Passed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("packet truncated: {len} bytes, need {need}")]
    Truncated { len: usize, need: usize },

    #[error("packet length field says {declared} bytes, buffer holds {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("unknown filter type {0}")]
    UnknownFilterType(u16),
}

/// Evaluates a filter given as raw type code plus N/X/O.
pub fn evaluate<P: Packet + ?Sized>(packet: &P, filter_type: u16, n: u16, x: u16, o: u16) -> Verdict {
    match FilterType::try_from(filter_type) {
        Ok(kind) => admit(attribute(packet, kind), n, x, o),
        Err(_) => Verdict::Filtered,
    }
}

/// The value a filter of `kind` samples from `packet`.
pub fn attribute<P: Packet + ?Sized>(packet: &P, kind: FilterType) -> u16 {
    match kind {
        FilterType::ByCount => packet.sequence_count(),
        FilterType::ByTime => time_attribute(packet.time()),
    }
}

/// Folds a timestamp into 16 bits: the low 11 bits of seconds followed by
/// the top 4 bits of the 16-bit subsecond field (1/16 s resolution).
pub fn time_attribute(time: PacketTime) -> u16 {
    let secs = (time.seconds as u16 & 0x07FF) << 4;
    let frac = ((time.subseconds >> 16) as u16 & 0xF000) >> 12;
    secs | frac
}

/// Core N/X/O test on an already extracted attribute.
pub fn admit(attr: u16, n: u16, x: u16, o: u16) -> Verdict {
    if x == 0 || n == 0 || n > x || o >= x {
        return Verdict::Filtered;
    }
    if attr >= o && (attr - o) % x < n {
        Verdict::Passed
    } else {
        Verdict::Filtered
    }
}
