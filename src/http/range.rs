//! HTTP Range request parsing module
//!
//! Single byte-range support. The header value is scanned for the first
//! `<digits>-<digits>` pair; the `bytes=` unit prefix is not required and
//! open-ended, suffix and multi-range forms are not recognised.

/// Inclusive byte window of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the window
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for a file of `total_size` bytes
    pub fn content_range(&self, total_size: u64) -> String {
        format!("bytes {}-{}/{total_size}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Valid range request
    Valid(ByteRange),
    /// Range lies outside the file - should return 416
    NotSatisfiable,
    /// No Range header or no recognisable pair (serve full content)
    None,
}

/// Parse the Range header against a file of `file_size` bytes
///
/// An end past the last byte is clamped to it.
///
/// # Examples
/// ```
/// use fserver::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=0-9"), 1000);
/// assert_eq!(result, RangeParseResult::Valid(ByteRange { start: 0, end: 9 }));
///
/// let result = parse_range_header(None, 1000);
/// assert_eq!(result, RangeParseResult::None);
/// ```
pub fn parse_range_header(range_header: Option<&str>, file_size: u64) -> RangeParseResult {
    let Some((start, end)) = range_header.and_then(find_digit_pair) else {
        return RangeParseResult::None;
    };

    if start >= file_size || start > end {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(ByteRange {
        start,
        end: end.min(file_size - 1),
    })
}

/// Find the leftmost `<digits>-<digits>` pair in `value`
fn find_digit_pair(value: &str) -> Option<(u64, u64)> {
    let bytes = value.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let start_from = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'-' {
            continue;
        }

        let end_from = i + 1;
        let mut j = end_from;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > end_from {
            // Runs too long for u64 are skipped
            if let (Ok(start), Ok(end)) = (value[start_from..i].parse(), value[end_from..j].parse()) {
                return Some((start, end));
            }
        }
    }

    None
}
