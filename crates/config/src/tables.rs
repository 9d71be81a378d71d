use filter::FilterType;

use crate::limits::{DEST_FILE_CNT, FILTERS_PER_PACKET, PACKETS_IN_FILTER_TABLE, UNUSED};
use crate::{Basename, Descriptor, Extension, Pathname, TableError};

/// How a destination builds the variable part of its file names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FileNameType {
    /// 8-digit sequence count.
    #[default]
    ByCount = 1,
    /// `YYYYDDDHHMMSS` timestamp.
    ByTime = 2,
}

impl TryFrom<u16> for FileNameType {
    type Error = TableError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::ByCount),
            2 => Ok(Self::ByTime),
            other => Err(TableError::FileNameType(other)),
        }
    }
}

/// One admission rule: which destination, and the N/X/O parameters.
///
/// The all-zero value (destination 0, N = X = O = 0) is the unused filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterParms {
    pub file_table_index: u16,
    pub filter_type: FilterType,
    /// Pass this many...
    pub n: u16,
    /// ...out of every group of this many...
    pub x: u16,
    /// ...starting at this offset within the group.
    pub o: u16,
}

impl FilterParms {
    pub const UNUSED: FilterParms = FilterParms {
        file_table_index: 0,
        filter_type: FilterType::ByCount,
        n: 0,
        x: 0,
        o: 0,
    };

    #[must_use]
    pub fn is_unused(&self) -> bool {
        self.file_table_index == 0 && self.n == 0 && self.x == 0 && self.o == 0
    }
}

impl Default for FilterParms {
    fn default() -> Self {
        Self::UNUSED
    }
}

/// Filter table row: a message id and its per-destination filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterTableEntry {
    /// Message id, [`UNUSED`] for a free row.
    pub message_id: u32,
    pub filters: [FilterParms; FILTERS_PER_PACKET],
}

impl FilterTableEntry {
    #[must_use]
    pub fn is_unused(&self) -> bool {
        self.message_id == UNUSED
    }
}

/// The packet filter table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTable {
    pub descriptor: Descriptor,
    /// Always [`PACKETS_IN_FILTER_TABLE`] rows; unused rows have id 0.
    pub entries: Vec<FilterTableEntry>,
}

impl Default for FilterTable {
    fn default() -> Self {
        Self {
            descriptor: Descriptor::default(),
            entries: vec![FilterTableEntry::default(); PACKETS_IN_FILTER_TABLE],
        }
    }
}

impl FilterTable {
    /// Message ids of every used row, in table order.
    pub fn message_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries
            .iter()
            .filter(|e| !e.is_unused())
            .map(|e| e.message_id)
    }

    /// Index of the first free row, if any.
    #[must_use]
    pub fn first_unused(&self) -> Option<usize> {
        self.entries.iter().position(FilterTableEntry::is_unused)
    }
}

/// Destination file definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationFileConfig {
    /// Directory; required for a used entry.
    pub pathname: Pathname,
    pub basename: Basename,
    pub extension: Extension,
    /// Directory closed files are moved to (empty = leave in place).
    pub movename: Pathname,
    pub filename_type: FileNameType,
    pub enabled: bool,
    /// Bytes; a packet that would overflow this starts a new file.
    pub max_size: u32,
    /// Seconds a file may stay open.
    pub max_age: u32,
    /// Starting sequence count, and the wrap-around target.
    pub sequence_count: u32,
}

impl DestinationFileConfig {
    #[must_use]
    pub fn is_unused(&self) -> bool {
        *self == Self::default()
    }
}

/// The destination file table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestFileTable {
    pub descriptor: Descriptor,
    /// Always [`DEST_FILE_CNT`] entries.
    pub files: Vec<DestinationFileConfig>,
}

impl Default for DestFileTable {
    fn default() -> Self {
        Self {
            descriptor: Descriptor::default(),
            files: vec![DestinationFileConfig::default(); DEST_FILE_CNT],
        }
    }
}
