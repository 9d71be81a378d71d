//! # Destination Files - Naming, Headers and Storage
//!
//! The I/O half of the destination file manager. The engine owns the per-slot
//! state machine; this crate knows how a destination file is named, what its
//! header looks like, and how files are created and moved.
//!
//! ## File name
//!
//! ```text
//! <path>[/]<base><token>[.]<ext>
//!            token = 8-digit sequence count  | YYYYDDDHHMMSS
//! ```
//!
//! The complete name must fit [`config::limits::TOTAL_FNAME_BUFSIZE`] with
//! its terminator. A name that does not fit is an error; it is never
//! truncated.
//!
//! ## Header layouts
//!
//! ```text
//! Structured (64 + 76 bytes)
//! ┌────────────────────────────── container header ─────────────────────┐
//! │ "cFE1" │ subtype │ hdr len │ sc id │ cpu id │ app id │ secs │ subsecs │
//! │ description[32]                                                     │
//! ├────────────────────────────── archive header ───────────────────────┤
//! │ close secs │ close subsecs │ dest index u16 │ name type u16 │ name[64] │
//! └─────────────────────────────────────────────────────────────────────┘
//!
//! Fixed-width text (48 bytes, space filled)
//! │ "SCHK" │ seq[8] │ start u32 │ stop u32 │ size[8] │ spare[20] │
//! ```
//!
//! All integers are big-endian.

mod header;
mod name;
mod storage;

use thiserror::Error;

pub use header::{
    convert_decimal8, initial_header, update_header, ClosingInfo, HeaderContext,
    ARCHIVE_HEADER_LEN, CONTAINER_HEADER_LEN, TEXT_HEADER_LEN,
};
pub use name::{build_filename, relocation_target, sequence_token, time_token};
pub use storage::{LocalStorage, Storage, WriteSeek};

/// Reasons a destination file name cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("missing path")]
    MissingPath,

    #[error("path + base too long ({len} bytes)")]
    PathAndBase { len: usize },

    #[error("path + base + sequence too long ({len} bytes)")]
    Sequence { len: usize },

    #[error("file name too long ({len} bytes)")]
    Total { len: usize },

    #[error("time {0} cannot be rendered")]
    Time(u32),

    #[error("move target too long ({len} bytes)")]
    MoveTarget { len: usize },
}
