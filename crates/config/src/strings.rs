use std::fmt;

use crate::TableError;

/// An owned string that fits a fixed `N`-byte buffer, terminator included.
///
/// Construction fails instead of truncating, so at most `N - 1` bytes of text
/// are ever held.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BoundedString<const N: usize>(String);

impl<const N: usize> BoundedString<N> {
    /// Buffer size this string must fit, terminator included.
    pub const CAPACITY: usize = N;

    /// Wraps `text`, rejecting anything that would not fit the buffer or that
    /// carries an embedded NUL.
    pub fn new(text: impl Into<String>) -> Result<Self, TableError> {
        let text = text.into();
        if text.len() >= N {
            return Err(TableError::TooLong {
                len: text.len(),
                capacity: N,
            });
        }
        if text.contains('\0') {
            return Err(TableError::Unterminated { capacity: N });
        }
        Ok(Self(text))
    }

    /// Decodes a NUL-terminated fixed buffer as it arrives in a command
    /// payload. The terminator must appear inside the buffer.
    pub fn from_c_bytes(buf: &[u8]) -> Result<Self, TableError> {
        let window = &buf[..buf.len().min(N)];
        let end = window
            .iter()
            .position(|&b| b == 0)
            .ok_or(TableError::Unterminated { capacity: N })?;
        let text = std::str::from_utf8(&window[..end])
            .map_err(|_| TableError::InvalidText { field: "utf-8" })?;
        Self::new(text)
    }

    /// Encodes into a zero-padded `N`-byte buffer.
    pub fn to_c_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; N];
        out[..self.0.len()].copy_from_slice(self.0.as_bytes());
        out
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<const N: usize> fmt::Display for BoundedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const N: usize> AsRef<str> for BoundedString<N> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> TryFrom<&str> for BoundedString<N> {
    type Error = TableError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Returns `true` when every character is legal in an onboard file name:
/// ASCII alphanumerics plus `` ` ~ ! @ # $ ^ & _ - / . + = ``.
pub fn is_filename_text(text: &str) -> bool {
    text.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || matches!(
                c,
                '`' | '~' | '!' | '@' | '#' | '$' | '^' | '&' | '_' | '-' | '/' | '.' | '+' | '='
            )
    })
}
