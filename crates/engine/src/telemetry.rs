//! Counters and the reports built from them.
//!
//! Counter widths follow the housekeeping layout: command and table counters
//! are 8 bits, file I/O counters 16 bits and packet counters 32 bits. All of
//! them wrap.
use byteorder::{BigEndian, WriteBytesExt};

/// Every counter the engine keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub cmd_accepted: u8,
    pub cmd_rejected: u8,
    pub dest_tbl_load: u8,
    pub dest_tbl_err: u8,
    pub filter_tbl_load: u8,
    pub filter_tbl_err: u8,
    pub file_write: u16,
    pub file_write_err: u16,
    pub file_update: u16,
    pub file_update_err: u16,
    pub disabled_pkt: u32,
    pub ignored_pkt: u32,
    pub filtered_pkt: u32,
    pub passed_pkt: u32,
}

/// Increments a counter, wrapping at its width.
macro_rules! bump {
    ($counter:expr) => {
        $counter = $counter.wrapping_add(1)
    };
}
pub(crate) use bump;

impl Counters {
    /// Zeroes everything a reset-counters command covers.
    pub fn reset(&mut self) {
        *self = Counters::default();
    }
}

/// Periodic housekeeping telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HousekeepingReport {
    pub counters: Counters,
    pub app_enabled: bool,
}

impl HousekeepingReport {
    /// Size of [`to_bytes`](Self::to_bytes) output.
    pub const ENCODED_LEN: usize = 8 + 4 * 2 + 4 * 4;

    /// Big-endian payload: 7 u8 fields + spare, 4 u16, 4 u32.
    pub fn to_bytes(&self) -> Vec<u8> {
        let c = &self.counters;
        let mut buf = Vec::with_capacity(Self::ENCODED_LEN);
        buf.extend_from_slice(&[
            c.cmd_accepted,
            c.cmd_rejected,
            c.dest_tbl_load,
            c.dest_tbl_err,
            c.filter_tbl_load,
            c.filter_tbl_err,
            u8::from(self.app_enabled),
            0,
        ]);
        // Writes into a Vec cannot fail.
        for v in [c.file_write, c.file_write_err, c.file_update, c.file_update_err] {
            let _ = buf.write_u16::<BigEndian>(v);
        }
        for v in [c.disabled_pkt, c.ignored_pkt, c.filtered_pkt, c.passed_pkt] {
            let _ = buf.write_u32::<BigEndian>(v);
        }
        buf
    }
}

/// One destination slot as reported by get-file-info.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    pub age: u32,
    pub size: u32,
    pub rate: u32,
    pub sequence_count: u32,
    pub enabled: bool,
    pub open: bool,
    /// Current file name, empty when closed.
    pub name: String,
}

/// Diagnostic telemetry covering every destination slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfoReport {
    pub files: Vec<FileInfo>,
}
