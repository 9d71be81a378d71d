//! # CDS - Critical Data Store
//!
//! Keeps the destination sequence counters and the global enable flag alive
//! across restarts, so file names keep counting up instead of colliding with
//! files written before a reset.
//!
//! ## Record Format
//!
//! ```text
//! [body_len: u32 LE][crc32: u32 LE][body ...]
//! ```
//!
//! Body: `DEST_FILE_CNT` sequence counts followed by the enable flag, each a
//! little-endian `u32`. `body_len` counts the body only.
//!
//! ## Failure Model
//!
//! Persistence is best-effort. Any store error is logged and turns the
//! [`Persistence`] adapter inactive; an inactive adapter silently ignores
//! further updates and the engine carries on from its in-memory state.
//!
//! ## Example
//!
//! ```rust
//! use cds::{MemoryStore, Persistence};
//!
//! let mut p = Persistence::new(Box::new(MemoryStore::new()), "DS_CDS");
//! let mut counts = [1u32; 16];
//! let mut enabled = true;
//! p.create_or_restore(&mut counts, &mut enabled, true);
//! assert!(p.is_active());
//! ```

mod persistence;
mod record;
mod store;

use std::io;

use thiserror::Error;

pub use persistence::Persistence;
pub use record::{decode_record, encode_record, PersistedState, DEST_SLOTS, RECORD_WORDS};
pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Errors that can occur while reading or writing the store.
#[derive(Debug, Error)]
pub enum CdsError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record failed CRC validation or has the wrong length.
    #[error("corrupt record: {0}")]
    Corrupt(&'static str),

    /// The key cannot be used as a store name.
    #[error("invalid key {0:?}")]
    InvalidKey(String),
}
