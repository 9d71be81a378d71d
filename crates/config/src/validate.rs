//! Table validators.
//!
//! The host table service calls [`verify_filter_table`] and
//! [`verify_dest_table`] on every candidate table before activating it; the
//! per-field checks are reused by the command processor so that a command
//! can never store a value a table load would have refused.
use tracing::{error, info};

use crate::limits::{
    DEST_FILE_CNT, FILE_MIN_AGE_LIMIT, FILE_MIN_SIZE_LIMIT, MAX_SEQUENCE_COUNT,
    PACKETS_IN_FILTER_TABLE,
};
use crate::strings::is_filename_text;
use crate::{DestFileTable, DestinationFileConfig, FilterTable, FilterTableEntry, TableError};

/// Outcome counts of a table verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub good: usize,
    pub bad: usize,
    pub unused: usize,
}

pub fn verify_file_index(index: u16) -> Result<(), TableError> {
    if usize::from(index) >= DEST_FILE_CNT {
        return Err(TableError::FileIndex(index));
    }
    Ok(())
}

/// All-zero parameters are valid (unused); otherwise `n <= x` and `o < x`.
pub fn verify_parms(n: u16, x: u16, o: u16) -> Result<(), TableError> {
    if n == 0 && x == 0 && o == 0 {
        return Ok(());
    }
    if n > x || o >= x {
        return Err(TableError::FilterParms { n, x, o });
    }
    Ok(())
}

/// Decodes a wire enable/disable code.
pub fn verify_state(state: u16) -> Result<bool, TableError> {
    match state {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(TableError::EnableState(other)),
    }
}

pub fn verify_size(max_size: u32) -> Result<(), TableError> {
    if max_size < FILE_MIN_SIZE_LIMIT {
        return Err(TableError::MaxSize(max_size));
    }
    Ok(())
}

pub fn verify_age(max_age: u32) -> Result<(), TableError> {
    if max_age < FILE_MIN_AGE_LIMIT {
        return Err(TableError::MaxAge(max_age));
    }
    Ok(())
}

pub fn verify_count(sequence_count: u32) -> Result<(), TableError> {
    if sequence_count > MAX_SEQUENCE_COUNT {
        return Err(TableError::SequenceCount(sequence_count));
    }
    Ok(())
}

fn verify_name_part(text: &str, field: &'static str, required: bool) -> Result<(), TableError> {
    if text.is_empty() {
        if required {
            return Err(TableError::MissingText { field });
        }
        return Ok(());
    }
    if !is_filename_text(text) {
        return Err(TableError::InvalidText { field });
    }
    Ok(())
}

/// Checks every used filter of a filter table row.
pub fn verify_filter_entry(entry: &FilterTableEntry) -> Result<(), TableError> {
    for parms in entry.filters.iter().filter(|p| !p.is_unused()) {
        verify_file_index(parms.file_table_index)?;
        verify_parms(parms.n, parms.x, parms.o)?;
    }
    Ok(())
}

/// Checks one used destination entry.
pub fn verify_dest_entry(entry: &DestinationFileConfig) -> Result<(), TableError> {
    verify_name_part(entry.pathname.as_str(), "pathname", true)?;
    verify_name_part(entry.basename.as_str(), "basename", false)?;
    verify_name_part(entry.extension.as_str(), "extension", false)?;
    verify_name_part(entry.movename.as_str(), "movename", false)?;
    verify_size(entry.max_size)?;
    verify_age(entry.max_age)?;
    verify_count(entry.sequence_count)?;
    Ok(())
}

/// Validates a candidate filter table. Unused rows are skipped.
pub fn verify_filter_table(table: &FilterTable) -> Result<VerifyReport, TableError> {
    if table.entries.len() != PACKETS_IN_FILTER_TABLE {
        return Err(TableError::EntryCount {
            expected: PACKETS_IN_FILTER_TABLE,
            actual: table.entries.len(),
        });
    }

    let mut report = VerifyReport::default();
    let mut first: Option<(usize, TableError)> = None;

    for (index, entry) in table.entries.iter().enumerate() {
        if entry.is_unused() {
            report.unused += 1;
            continue;
        }
        match verify_filter_entry(entry) {
            Ok(()) => report.good += 1,
            Err(e) => {
                // Only the first bad entry is reported individually.
                if first.is_none() {
                    error!(mid = entry.message_id, index, "filter table verify err: {}", e);
                    first = Some((index, e));
                }
                report.bad += 1;
            }
        }
    }

    info!(
        good = report.good,
        bad = report.bad,
        unused = report.unused,
        "filter table verify results"
    );

    match first {
        None => Ok(report),
        Some((index, source)) => Err(TableError::Rejected {
            table: "filter",
            index,
            bad: report.bad,
            source: Box::new(source),
        }),
    }
}

/// Validates a candidate destination file table. Unused entries are skipped.
pub fn verify_dest_table(table: &DestFileTable) -> Result<VerifyReport, TableError> {
    if table.files.len() != DEST_FILE_CNT {
        return Err(TableError::EntryCount {
            expected: DEST_FILE_CNT,
            actual: table.files.len(),
        });
    }

    let mut report = VerifyReport::default();
    let mut first: Option<(usize, TableError)> = None;

    for (index, entry) in table.files.iter().enumerate() {
        if entry.is_unused() {
            report.unused += 1;
            continue;
        }
        match verify_dest_entry(entry) {
            Ok(()) => report.good += 1,
            Err(e) => {
                if first.is_none() {
                    error!(index, "destination file table verify err: {}", e);
                    first = Some((index, e));
                }
                report.bad += 1;
            }
        }
    }

    info!(
        good = report.good,
        bad = report.bad,
        unused = report.unused,
        "destination file table verify results"
    );

    match first {
        None => Ok(report),
        Some((index, source)) => Err(TableError::Rejected {
            table: "destination file",
            index,
            bad: report.bad,
            source: Box::new(source),
        }),
    }
}
