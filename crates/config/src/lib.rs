//! # Config - Archive Tables and Platform Settings
//!
//! The data model shared by every crate in the workspace: the packet filter
//! table, the destination file table, the bounded strings used for file name
//! parts, the validators the host table service invokes before activating a
//! candidate table, and the run-time [`EngineConfig`].
//!
//! ## Tables
//!
//! ```text
//! FilterTable (256 entries)                DestFileTable (16 entries)
//! ┌──────────────────────────────┐         ┌──────────────────────────────┐
//! │ message_id │ filters[0..4]   │ ──idx──▶│ path │ base │ ext │ limits   │
//! └──────────────────────────────┘         └──────────────────────────────┘
//! ```
//!
//! Both tables are owned by the host table service. The engine receives an
//! owned snapshot on every reload and edits its working copy in response to
//! ground commands.
//!
//! ## Example
//!
//! ```rust
//! use config::{FilterTable, FilterParms, FilterType, verify_filter_table};
//!
//! let mut table = FilterTable::default();
//! table.entries[0].message_id = 0x0801;
//! table.entries[0].filters[0] = FilterParms {
//!     file_table_index: 2,
//!     filter_type: FilterType::ByCount,
//!     n: 1,
//!     x: 4,
//!     o: 0,
//! };
//! let report = verify_filter_table(&table).unwrap();
//! assert_eq!(report.good, 1);
//! ```

pub mod limits;
mod settings;
mod strings;
mod tables;
mod validate;

use thiserror::Error;

pub use filter::FilterType;
pub use settings::{EngineConfig, HeaderFormat};
pub use strings::{is_filename_text, BoundedString};
pub use tables::{
    DestFileTable, DestinationFileConfig, FileNameType, FilterParms, FilterTable,
    FilterTableEntry,
};
pub use validate::{
    verify_age, verify_count, verify_dest_entry, verify_dest_table, verify_file_index,
    verify_filter_entry, verify_filter_table, verify_parms, verify_size, verify_state,
    VerifyReport,
};

/// Path portion of a destination file name.
pub type Pathname = BoundedString<{ limits::PATHNAME_BUFSIZE }>;
/// Base portion of a destination file name.
pub type Basename = BoundedString<{ limits::BASENAME_BUFSIZE }>;
/// Extension portion of a destination file name.
pub type Extension = BoundedString<{ limits::EXTENSION_BUFSIZE }>;
/// Free-form table descriptor text.
pub type Descriptor = BoundedString<{ limits::DESCRIPTOR_BUFSIZE }>;

/// Errors produced while building or verifying table data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Text does not fit its fixed buffer (terminator included).
    #[error("text too long: {len} bytes (buffer holds {capacity} including terminator)")]
    TooLong { len: usize, capacity: usize },

    /// A fixed buffer had no terminator inside its bounds.
    #[error("text is not terminated within {capacity} bytes")]
    Unterminated { capacity: usize },

    /// Text contains characters that are not legal in a file name.
    #[error("invalid {field} text")]
    InvalidText { field: &'static str },

    /// Required text is empty.
    #[error("missing {field} text")]
    MissingText { field: &'static str },

    /// Destination index outside the destination table.
    #[error("file table index = {0}")]
    FileIndex(u16),

    /// Filter type code is neither by-count nor by-time.
    #[error("filter type = {0}")]
    FilterType(u16),

    /// File name type code is neither by-count nor by-time.
    #[error("filename type = {0}")]
    FileNameType(u16),

    /// Enable state code is neither enabled nor disabled.
    #[error("enable state = {0}")]
    EnableState(u16),

    /// N/X/O parameters violate `n <= x` or `o < x`.
    #[error("filter parms N = {n}, X = {x}, O = {o}")]
    FilterParms { n: u16, x: u16, o: u16 },

    /// Maximum file size below the platform minimum.
    #[error("max file size = {0}")]
    MaxSize(u32),

    /// Maximum file age below the platform minimum.
    #[error("max file age = {0}")]
    MaxAge(u32),

    /// Sequence count above the platform maximum.
    #[error("sequence count = {0}")]
    SequenceCount(u32),

    /// Table has the wrong number of entries.
    #[error("table has {actual} entries (expected {expected})")]
    EntryCount { expected: usize, actual: usize },

    /// One or more table entries failed verification.
    #[error("{table} table verify err: index = {index}, {source} ({bad} bad entries)")]
    Rejected {
        table: &'static str,
        index: usize,
        bad: usize,
        #[source]
        source: Box<TableError>,
    },
}
