//! Request path decoding and resolution against the serving root

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::{Component, Path, PathBuf};

/// Characters escaped when a request path is turned back into a link
///
/// Covers every HTML-significant character, so the result can be placed in
/// an attribute without further escaping.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-decode a URI path
///
/// Multi-byte UTF-8 sequences decode to their characters; byte sequences that
/// are not valid UTF-8 are replaced rather than rejected.
pub fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Percent-encode a decoded path for use in an `href`
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_ESCAPE).to_string()
}

/// Join a decoded request path onto `root`
///
/// The join is lexical: `.` segments are dropped and `..` pops a segment.
/// Returns `None` when `..` would climb above `root`.
pub fn resolve(root: &Path, pathname: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    let mut depth = 0usize;

    for component in Path::new(pathname).components() {
        match component {
            Component::Normal(segment) => {
                resolved.push(segment);
                depth += 1;
            }
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                resolved.pop();
                depth -= 1;
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }

    Some(resolved)
}

/// Join a child name onto a request path with a single `/`
pub fn join_url_path(pathname: &str, name: &str) -> String {
    format!("{}/{name}", pathname.trim_end_matches('/'))
}
