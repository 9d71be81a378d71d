use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::io::Cursor;

use crate::CdsError;

/// Destination slots covered by the record.
pub const DEST_SLOTS: usize = 16;
/// Words in a record body: one count per slot plus the enable flag.
pub const RECORD_WORDS: usize = DEST_SLOTS + 1;

const FRAME_HEADER_LEN: usize = 8;
const BODY_LEN: usize = RECORD_WORDS * 4;

/// Values kept across restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub sequence_counts: [u32; DEST_SLOTS],
    pub app_enabled: bool,
}

/// Serializes `state` into a framed record.
pub fn encode_record(state: &PersistedState) -> Vec<u8> {
    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + BODY_LEN);
    // Frame header is filled in once the body is known.
    buf.extend_from_slice(&[0u8; FRAME_HEADER_LEN]);

    for count in state.sequence_counts {
        // Writes into a Vec cannot fail.
        let _ = buf.write_u32::<LittleEndian>(count);
    }
    let _ = buf.write_u32::<LittleEndian>(u32::from(state.app_enabled));

    let mut hasher = Crc32::new();
    hasher.update(&buf[FRAME_HEADER_LEN..]);
    let crc = hasher.finalize();

    buf[0..4].copy_from_slice(&(BODY_LEN as u32).to_le_bytes());
    buf[4..8].copy_from_slice(&crc.to_le_bytes());
    buf
}

/// Parses and verifies a framed record.
pub fn decode_record(bytes: &[u8]) -> Result<PersistedState, CdsError> {
    if bytes.len() < FRAME_HEADER_LEN {
        return Err(CdsError::Corrupt("truncated frame header"));
    }
    let mut rdr = Cursor::new(bytes);
    let body_len = rdr.read_u32::<LittleEndian>()? as usize;
    let crc = rdr.read_u32::<LittleEndian>()?;

    if body_len != BODY_LEN || bytes.len() != FRAME_HEADER_LEN + body_len {
        return Err(CdsError::Corrupt("bad record length"));
    }

    let body = &bytes[FRAME_HEADER_LEN..];
    let mut hasher = Crc32::new();
    hasher.update(body);
    if hasher.finalize() != crc {
        return Err(CdsError::Corrupt("crc mismatch"));
    }

    let mut state = PersistedState::default();
    for count in state.sequence_counts.iter_mut() {
        *count = rdr.read_u32::<LittleEndian>()?;
    }
    state.app_enabled = rdr.read_u32::<LittleEndian>()? != 0;
    Ok(state)
}
