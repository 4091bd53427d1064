//! HTTP cache control module
//!
//! Provides `ETag` generation and the validator headers attached to every
//! served file.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, TimeDelta, Utc};
use md5::{Digest, Md5};
use std::time::SystemTime;

/// Freshness lifetime advertised through `Expires` and `Cache-Control`
pub const FRESHNESS_SECS: i64 = 86_400;

/// Historical `Cache-Control` text, kept byte-for-byte for old clients
pub const LEGACY_CACHE_CONTROL: &str = "max-age=3600 * 24";

/// Generate a content-addressed `ETag`
///
/// Base64 of the MD5 digest of the full content. Unquoted, matching what
/// existing clients send back in `if-none-match`.
pub fn content_etag(content: &[u8]) -> String {
    general_purpose::STANDARD.encode(Md5::digest(content))
}

/// Format a timestamp as an HTTP-date (RFC 7231 IMF-fixdate)
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// `Cache-Control` header value
pub fn cache_control(legacy: bool) -> String {
    if legacy {
        LEGACY_CACHE_CONTROL.to_string()
    } else {
        format!("max-age={FRESHNESS_SECS}")
    }
}

/// Validators computed for one file on one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheValidators {
    pub last_modified: String,
    pub etag: String,
    pub expires: String,
}

impl CacheValidators {
    pub fn compute(modified: SystemTime, content: &[u8], now: DateTime<Utc>) -> Self {
        Self {
            last_modified: http_date(DateTime::<Utc>::from(modified)),
            etag: content_etag(content),
            expires: http_date(now + TimeDelta::seconds(FRESHNESS_SECS)),
        }
    }

    /// Whether the client copy is still valid
    ///
    /// Both validators must be echoed back exactly. The date arrives in the
    /// `is-modified-since` header, not `If-Modified-Since`.
    pub fn is_fresh(&self, is_modified_since: Option<&str>, if_none_match: Option<&str>) -> bool {
        is_modified_since == Some(self.last_modified.as_str())
            && if_none_match == Some(self.etag.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_content_etag() {
        assert_eq!(content_etag(b"hello world"), "XrY7u+Ae7tCTyyK7j1rNww==");
        assert_eq!(content_etag(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
    }

    #[test]
    fn test_etag_difference() {
        assert_ne!(content_etag(b"content a"), content_etag(b"content b"));
    }

    #[test]
    fn test_http_date() {
        let time = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(http_date(time), "Tue, 14 Nov 2023 22:13:20 GMT");
    }

    #[test]
    fn test_cache_control() {
        assert_eq!(cache_control(false), "max-age=86400");
        assert_eq!(cache_control(true), "max-age=3600 * 24");
    }

    #[test]
    fn test_validators() {
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let v = CacheValidators::compute(modified, b"hello world", now);
        assert_eq!(v.last_modified, "Tue, 14 Nov 2023 22:13:20 GMT");
        assert_eq!(v.expires, "Wed, 15 Nov 2023 22:13:20 GMT");
        assert_eq!(v.etag, "XrY7u+Ae7tCTyyK7j1rNww==");
    }

    #[test]
    fn test_is_fresh_requires_both() {
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let v = CacheValidators::compute(modified, b"x", Utc::now());
        let date = Some(v.last_modified.as_str());
        let tag = Some(v.etag.as_str());
        assert!(v.is_fresh(date, tag));
        assert!(!v.is_fresh(date, None));
        assert!(!v.is_fresh(None, tag));
        assert!(!v.is_fresh(date, Some("other")));
        assert!(!v.is_fresh(Some("Mon, 01 Jan 2001 00:00:00 GMT"), tag));
    }
}
