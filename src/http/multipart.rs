//! Minimal multipart/form-data helpers for the upload endpoint
//!
//! Only the first part of a body is ever looked at; this is not a general
//! form parser.

/// Split `bytes` on every occurrence of `separator`
///
/// Behaves like `str::split` over bytes: `n` separators give `n + 1`
/// slices, empty ones included. An empty separator yields the input whole.
pub fn split_bytes<'a>(bytes: &'a [u8], separator: &[u8]) -> Vec<&'a [u8]> {
    if separator.is_empty() {
        return vec![bytes];
    }

    let mut parts = Vec::new();
    let mut from = 0;
    let mut i = 0;
    while i + separator.len() <= bytes.len() {
        if &bytes[i..i + separator.len()] == separator {
            parts.push(&bytes[from..i]);
            i += separator.len();
            from = i;
        } else {
            i += 1;
        }
    }
    parts.push(&bytes[from..]);
    parts
}

/// Extract the `boundary=` parameter from a Content-Type value
pub fn boundary(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|param| {
        let value = param.trim().strip_prefix("boundary=")?;
        let value = value.trim_matches('"');
        (!value.is_empty()).then_some(value)
    })
}

/// First part of a multipart body
#[derive(Debug, PartialEq, Eq)]
pub struct Part<'a> {
    /// Everything between the first two boundary markers
    pub raw: &'a [u8],
    /// Header block of the part
    pub headers: &'a [u8],
    /// Part content, still carrying the CRLF that precedes the next marker
    pub payload: &'a [u8],
}

impl<'a> Part<'a> {
    /// Value of the `filename="..."` parameter, if the part declares one
    pub fn filename(&self) -> Option<String> {
        let headers = String::from_utf8_lossy(self.headers);
        let start = headers.find("filename=\"")? + "filename=\"".len();
        let len = headers[start..].find('"')?;
        Some(headers[start..start + len].to_string())
    }

    /// Payload without the trailing CRLF
    pub fn file_content(&self) -> &'a [u8] {
        let end = self.payload.len().saturating_sub(2);
        &self.payload[..end]
    }
}

/// Locate the first part of `body` delimited by `--boundary`
pub fn first_part<'a>(body: &'a [u8], boundary: &str) -> Option<Part<'a>> {
    let marker = format!("--{boundary}");
    let raw = *split_bytes(body, marker.as_bytes()).get(1)?;

    let (headers, payload) = match find(raw, b"\r\n\r\n") {
        Some(pos) => (&raw[..pos], &raw[pos + 4..]),
        None => (raw, &raw[raw.len()..]),
    };

    Some(Part {
        raw,
        headers,
        payload,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
