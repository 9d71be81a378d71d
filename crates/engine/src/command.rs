//! Ground command wire format.
//!
//! Every command is a command packet whose function code selects the
//! variant. Payloads are big-endian, fixed length, and padded to a multiple
//! of four bytes:
//!
//! ```text
//! code  command               payload
//! ----  --------------------  ------------------------------------------
//!  0    Noop                  -
//!  1    ResetCounters         -
//!  2    SetAppState           state u16, pad u16
//!  3    SetFilterFile         mid u16, filter u16, file u16, pad u16
//!  4    SetFilterType         mid u16, filter u16, type u16, pad u16
//!  5    SetFilterParms        mid u16, filter u16, n, x, o u16, pad u16
//!  6    SetDestType           file u16, type u16
//!  7    SetDestState          file u16, state u16
//!  8    SetDestPath           file u16, pad u16, path [64]
//!  9    SetDestBase           file u16, pad u16, base [64]
//! 10    SetDestExt            file u16, pad u16, ext [8]
//! 11    SetDestSize           file u16, pad u16, max_size u32
//! 12    SetDestAge            file u16, pad u16, max_age u32
//! 13    SetDestCount          file u16, pad u16, sequence u32
//! 14    CloseFile             file u16, pad u16
//! 15    GetFileInfo           -
//! 16    AddMessageId          mid u16, pad u16
//! 17    CloseAll              -
//! ```
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use thiserror::Error;

use config::limits::{BASENAME_BUFSIZE, EXTENSION_BUFSIZE, PATHNAME_BUFSIZE};
use config::TableError;
use filter::CcsdsPacket;

/// Why a command was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("message is not a command")]
    NotCommand,

    #[error("invalid command code = {0}")]
    UnknownCode(u8),

    #[error("invalid command length: code = {code}, expected = {expected}, actual = {actual}")]
    Length {
        code: u8,
        expected: usize,
        actual: usize,
    },

    #[error("invalid message ID = 0x{0:04X}")]
    MessageId(u32),

    #[error("filter parms index = {0}")]
    FilterIndex(u16),

    #[error(transparent)]
    Invalid(#[from] TableError),

    #[error("packet filter table is not loaded")]
    NoFilterTable,

    #[error("destination file table is not loaded")]
    NoDestTable,

    #[error("message ID 0x{0:04X} is not in filter table")]
    NotInTable(u32),

    #[error("message ID 0x{0:04X} is already in filter table")]
    AlreadyInTable(u32),

    #[error("filter table is full")]
    TableFull,
}

/// Function codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandKind {
    Noop = 0,
    ResetCounters = 1,
    SetAppState = 2,
    SetFilterFile = 3,
    SetFilterType = 4,
    SetFilterParms = 5,
    SetDestType = 6,
    SetDestState = 7,
    SetDestPath = 8,
    SetDestBase = 9,
    SetDestExt = 10,
    SetDestSize = 11,
    SetDestAge = 12,
    SetDestCount = 13,
    CloseFile = 14,
    GetFileInfo = 15,
    AddMessageId = 16,
    CloseAll = 17,
}

impl TryFrom<u8> for CommandKind {
    type Error = CommandError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        use CommandKind::*;
        Ok(match code {
            0 => Noop,
            1 => ResetCounters,
            2 => SetAppState,
            3 => SetFilterFile,
            4 => SetFilterType,
            5 => SetFilterParms,
            6 => SetDestType,
            7 => SetDestState,
            8 => SetDestPath,
            9 => SetDestBase,
            10 => SetDestExt,
            11 => SetDestSize,
            12 => SetDestAge,
            13 => SetDestCount,
            14 => CloseFile,
            15 => GetFileInfo,
            16 => AddMessageId,
            17 => CloseAll,
            other => return Err(CommandError::UnknownCode(other)),
        })
    }
}

impl CommandKind {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Payload length, command header excluded.
    pub fn payload_len(self) -> usize {
        use CommandKind::*;
        match self {
            Noop | ResetCounters | GetFileInfo | CloseAll => 0,
            SetAppState | SetDestType | SetDestState | CloseFile | AddMessageId => 4,
            SetFilterFile | SetFilterType | SetDestSize | SetDestAge | SetDestCount => 8,
            SetFilterParms => 12,
            SetDestPath => 4 + PATHNAME_BUFSIZE,
            SetDestBase => 4 + BASENAME_BUFSIZE,
            SetDestExt => 4 + EXTENSION_BUFSIZE,
        }
    }
}

/// A decoded ground command.
///
/// String payloads stay raw (`Vec<u8>` of the full fixed buffer) so that
/// terminator and character checks happen where every other field is
/// validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Noop,
    ResetCounters,
    SetAppState {
        state: u16,
    },
    SetFilterFile {
        message_id: u16,
        filter_index: u16,
        file_index: u16,
    },
    SetFilterType {
        message_id: u16,
        filter_index: u16,
        filter_type: u16,
    },
    SetFilterParms {
        message_id: u16,
        filter_index: u16,
        n: u16,
        x: u16,
        o: u16,
    },
    SetDestType {
        file_index: u16,
        filename_type: u16,
    },
    SetDestState {
        file_index: u16,
        state: u16,
    },
    SetDestPath {
        file_index: u16,
        pathname: Vec<u8>,
    },
    SetDestBase {
        file_index: u16,
        basename: Vec<u8>,
    },
    SetDestExt {
        file_index: u16,
        extension: Vec<u8>,
    },
    SetDestSize {
        file_index: u16,
        max_size: u32,
    },
    SetDestAge {
        file_index: u16,
        max_age: u32,
    },
    SetDestCount {
        file_index: u16,
        sequence_count: u32,
    },
    CloseFile {
        file_index: u16,
    },
    GetFileInfo,
    AddMessageId {
        message_id: u16,
    },
    CloseAll,
}

impl Command {
    /// Decodes `payload` (bytes after the command header) for function `code`.
    pub fn decode(code: u8, payload: &[u8]) -> Result<Self, CommandError> {
        let kind = CommandKind::try_from(code)?;
        let expected = kind.payload_len();
        if payload.len() != expected {
            return Err(CommandError::Length {
                code,
                expected,
                actual: payload.len(),
            });
        }

        let word = |i: usize| BigEndian::read_u16(&payload[i * 2..i * 2 + 2]);
        let long_at = |offset: usize| BigEndian::read_u32(&payload[offset..offset + 4]);

        Ok(match kind {
            CommandKind::Noop => Command::Noop,
            CommandKind::ResetCounters => Command::ResetCounters,
            CommandKind::SetAppState => Command::SetAppState { state: word(0) },
            CommandKind::SetFilterFile => Command::SetFilterFile {
                message_id: word(0),
                filter_index: word(1),
                file_index: word(2),
            },
            CommandKind::SetFilterType => Command::SetFilterType {
                message_id: word(0),
                filter_index: word(1),
                filter_type: word(2),
            },
            CommandKind::SetFilterParms => Command::SetFilterParms {
                message_id: word(0),
                filter_index: word(1),
                n: word(2),
                x: word(3),
                o: word(4),
            },
            CommandKind::SetDestType => Command::SetDestType {
                file_index: word(0),
                filename_type: word(1),
            },
            CommandKind::SetDestState => Command::SetDestState {
                file_index: word(0),
                state: word(1),
            },
            CommandKind::SetDestPath => Command::SetDestPath {
                file_index: word(0),
                pathname: payload[4..].to_vec(),
            },
            CommandKind::SetDestBase => Command::SetDestBase {
                file_index: word(0),
                basename: payload[4..].to_vec(),
            },
            CommandKind::SetDestExt => Command::SetDestExt {
                file_index: word(0),
                extension: payload[4..].to_vec(),
            },
            CommandKind::SetDestSize => Command::SetDestSize {
                file_index: word(0),
                max_size: long_at(4),
            },
            CommandKind::SetDestAge => Command::SetDestAge {
                file_index: word(0),
                max_age: long_at(4),
            },
            CommandKind::SetDestCount => Command::SetDestCount {
                file_index: word(0),
                sequence_count: long_at(4),
            },
            CommandKind::CloseFile => Command::CloseFile {
                file_index: word(0),
            },
            CommandKind::GetFileInfo => Command::GetFileInfo,
            CommandKind::AddMessageId => Command::AddMessageId {
                message_id: word(0),
            },
            CommandKind::CloseAll => Command::CloseAll,
        })
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Noop => CommandKind::Noop,
            Command::ResetCounters => CommandKind::ResetCounters,
            Command::SetAppState { .. } => CommandKind::SetAppState,
            Command::SetFilterFile { .. } => CommandKind::SetFilterFile,
            Command::SetFilterType { .. } => CommandKind::SetFilterType,
            Command::SetFilterParms { .. } => CommandKind::SetFilterParms,
            Command::SetDestType { .. } => CommandKind::SetDestType,
            Command::SetDestState { .. } => CommandKind::SetDestState,
            Command::SetDestPath { .. } => CommandKind::SetDestPath,
            Command::SetDestBase { .. } => CommandKind::SetDestBase,
            Command::SetDestExt { .. } => CommandKind::SetDestExt,
            Command::SetDestSize { .. } => CommandKind::SetDestSize,
            Command::SetDestAge { .. } => CommandKind::SetDestAge,
            Command::SetDestCount { .. } => CommandKind::SetDestCount,
            Command::CloseFile { .. } => CommandKind::CloseFile,
            Command::GetFileInfo => CommandKind::GetFileInfo,
            Command::AddMessageId { .. } => CommandKind::AddMessageId,
            Command::CloseAll => CommandKind::CloseAll,
        }
    }

    /// Encodes the payload. String buffers are zero-padded (or cut) to their
    /// fixed size.
    pub fn payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.kind().payload_len());
        // Writes into a Vec cannot fail.
        let words = |buf: &mut Vec<u8>, values: &[u16]| {
            for &v in values {
                let _ = buf.write_u16::<BigEndian>(v);
            }
        };
        match self {
            Command::Noop | Command::ResetCounters | Command::GetFileInfo | Command::CloseAll => {}
            Command::SetAppState { state } => words(&mut buf, &[*state, 0]),
            Command::SetFilterFile {
                message_id,
                filter_index,
                file_index,
            } => words(&mut buf, &[*message_id, *filter_index, *file_index, 0]),
            Command::SetFilterType {
                message_id,
                filter_index,
                filter_type,
            } => words(&mut buf, &[*message_id, *filter_index, *filter_type, 0]),
            Command::SetFilterParms {
                message_id,
                filter_index,
                n,
                x,
                o,
            } => words(&mut buf, &[*message_id, *filter_index, *n, *x, *o, 0]),
            Command::SetDestType {
                file_index,
                filename_type,
            } => words(&mut buf, &[*file_index, *filename_type]),
            Command::SetDestState { file_index, state } => {
                words(&mut buf, &[*file_index, *state])
            }
            Command::SetDestPath {
                file_index,
                pathname: text,
            }
            | Command::SetDestBase {
                file_index,
                basename: text,
            }
            | Command::SetDestExt {
                file_index,
                extension: text,
            } => {
                words(&mut buf, &[*file_index, 0]);
                let width = self.kind().payload_len() - 4;
                let mut fixed = vec![0u8; width];
                let n = text.len().min(width);
                fixed[..n].copy_from_slice(&text[..n]);
                buf.extend_from_slice(&fixed);
            }
            Command::SetDestSize {
                file_index,
                max_size: value,
            }
            | Command::SetDestAge {
                file_index,
                max_age: value,
            }
            | Command::SetDestCount {
                file_index,
                sequence_count: value,
            } => {
                words(&mut buf, &[*file_index, 0]);
                let _ = buf.write_u32::<BigEndian>(*value);
            }
            Command::CloseFile { file_index } => words(&mut buf, &[*file_index, 0]),
            Command::AddMessageId { message_id } => words(&mut buf, &[*message_id, 0]),
        }
        buf
    }

    /// Wraps the command in a command packet addressed to `mid`.
    pub fn to_packet(&self, mid: u16) -> CcsdsPacket {
        CcsdsPacket::command(mid, self.kind().code(), &self.payload())
    }

    pub fn set_path(file_index: u16, path: &str) -> Self {
        Command::SetDestPath {
            file_index,
            pathname: path.as_bytes().to_vec(),
        }
    }

    pub fn set_base(file_index: u16, base: &str) -> Self {
        Command::SetDestBase {
            file_index,
            basename: base.as_bytes().to_vec(),
        }
    }

    pub fn set_ext(file_index: u16, ext: &str) -> Self {
        Command::SetDestExt {
            file_index,
            extension: ext.as_bytes().to_vec(),
        }
    }
}
