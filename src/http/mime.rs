//! MIME type detection module
//!
//! Returns the Content-Type for a served file based on its extension.

use std::path::Path;

/// Get the Content-Type for a file path
///
/// `;charset=utf-8` is appended to every type, binary ones included.
///
/// # Examples
/// ```
/// use fserver::http::mime::get_content_type;
/// use std::path::Path;
/// assert_eq!(get_content_type(Path::new("a.html")), "text/html;charset=utf-8");
/// assert_eq!(get_content_type(Path::new("noext")), "application/octet-stream;charset=utf-8");
/// ```
pub fn get_content_type(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    format!("{};charset=utf-8", mime.essence_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(get_content_type(Path::new("index.html")), "text/html;charset=utf-8");
        assert_eq!(get_content_type(Path::new("site.css")), "text/css;charset=utf-8");
        assert_eq!(get_content_type(Path::new("data.json")), "application/json;charset=utf-8");
        assert_eq!(get_content_type(Path::new("notes.txt")), "text/plain;charset=utf-8");
    }

    #[test]
    fn test_binary_types_keep_charset() {
        assert_eq!(get_content_type(Path::new("logo.png")), "image/png;charset=utf-8");
        assert_eq!(get_content_type(Path::new("clip.mp4")), "video/mp4;charset=utf-8");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(
            get_content_type(Path::new("blob.zzzunknown")),
            "application/octet-stream;charset=utf-8"
        );
        assert_eq!(
            get_content_type(Path::new("Makefile")),
            "application/octet-stream;charset=utf-8"
        );
    }
}
