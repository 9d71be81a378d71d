//! Platform limits. These size the fixed tables and buffers and are shared
//! with ground tooling, so they are compile-time constants rather than
//! run-time settings.

/// Number of destination file slots.
pub const DEST_FILE_CNT: usize = 16;

/// Number of entries in the packet filter table.
pub const PACKETS_IN_FILTER_TABLE: usize = 256;

/// Filters (destinations) per packet filter table entry.
pub const FILTERS_PER_PACKET: usize = 4;

/// Buffer sizes, terminator included.
pub const PATHNAME_BUFSIZE: usize = 64;
pub const BASENAME_BUFSIZE: usize = 64;
pub const EXTENSION_BUFSIZE: usize = 8;
pub const DESCRIPTOR_BUFSIZE: usize = 32;
pub const TOTAL_FNAME_BUFSIZE: usize = 64;

/// Width of the sequence-count token in file names.
pub const SEQUENCE_DIGITS: usize = 8;

/// Largest sequence count; the counter wraps past this value.
pub const MAX_SEQUENCE_COUNT: u32 = 99_999_999;

/// Smallest accepted `max_size` for a destination.
pub const FILE_MIN_SIZE_LIMIT: u32 = 1024;

/// Smallest accepted `max_age` (seconds) for a destination.
pub const FILE_MIN_AGE_LIMIT: u32 = 60;

/// Queue depth requested for every subscribed message id.
pub const PER_PACKET_PIPE_LIMIT: u16 = 50;

/// Message id and filter field value meaning "not in use".
pub const UNUSED: u32 = 0;
