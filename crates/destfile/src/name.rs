use chrono::DateTime;

use config::limits::TOTAL_FNAME_BUFSIZE;

use crate::NameError;

/// Seconds between the Unix epoch and the mission epoch (1980-001T00:00:00).
const MISSION_EPOCH_UNIX: i64 = 315_532_800;

/// 8 zero-padded decimal digits. Only the low 8 digits of `count` are kept.
pub fn sequence_token(count: u32) -> String {
    format!("{:08}", count % 100_000_000)
}

/// `YYYYDDDHHMMSS` for `seconds` past the mission epoch.
pub fn time_token(seconds: u32) -> Result<String, NameError> {
    let unix = MISSION_EPOCH_UNIX + i64::from(seconds);
    DateTime::from_timestamp(unix, 0)
        .map(|t| t.format("%Y%j%H%M%S").to_string())
        .ok_or(NameError::Time(seconds))
}

/// Joins the parts of a destination file name.
///
/// Each step is length-checked against the name buffer before the next
/// part is appended, so the first part that overflows is the one reported.
pub fn build_filename(path: &str, base: &str, token: &str, ext: &str) -> Result<String, NameError> {
    if path.is_empty() {
        return Err(NameError::MissingPath);
    }

    let mut name = String::with_capacity(TOTAL_FNAME_BUFSIZE * 2);
    name.push_str(path);
    if !path.ends_with('/') {
        name.push('/');
    }

    if name.len() + base.len() >= TOTAL_FNAME_BUFSIZE {
        return Err(NameError::PathAndBase {
            len: name.len() + base.len(),
        });
    }
    name.push_str(base);

    if name.len() + token.len() >= TOTAL_FNAME_BUFSIZE {
        return Err(NameError::Sequence {
            len: name.len() + token.len(),
        });
    }
    name.push_str(token);

    if !ext.is_empty() {
        if !ext.starts_with('.') {
            name.push('.');
        }
        name.push_str(ext);
    }

    if name.len() >= TOTAL_FNAME_BUFSIZE {
        return Err(NameError::Total { len: name.len() });
    }
    Ok(name)
}

/// Where a closed file lands when moved into `dir`: the directory (without a
/// trailing `/`) plus the file's own name.
pub fn relocation_target(dir: &str, file_name: &str) -> Result<String, NameError> {
    let dir = dir.strip_suffix('/').unwrap_or(dir);
    let leaf = match file_name.rfind('/') {
        Some(pos) => &file_name[pos..],
        None => file_name,
    };
    let mut target = String::with_capacity(dir.len() + leaf.len() + 1);
    target.push_str(dir);
    if !leaf.starts_with('/') {
        target.push('/');
    }
    target.push_str(leaf);

    if target.len() >= TOTAL_FNAME_BUFSIZE {
        return Err(NameError::MoveTarget { len: target.len() });
    }
    Ok(target)
}
