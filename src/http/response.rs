//! HTTP response building module
//!
//! Provides builders for the fixed-shape responses of the server, decoupled
//! from the request handling that picks them.

use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Response, StatusCode};

use super::cache::CacheValidators;
use super::{empty_body, full_body, ResponseBody};

/// Body of every 404
pub const NOT_FOUND_BODY: &str = "not found";

/// Content type of generated HTML pages
pub const HTML_CONTENT_TYPE: &str = "text/html;charset=utf-8";

const PREFLIGHT_METHODS: &str = "PUT,DELETE,OPTIONS";
const PREFLIGHT_MAX_AGE: &str = "1800";
const PREFLIGHT_COOKIE: &str = "name=zhi;SameSite=None;Secure";

/// Add the cross-origin headers granted to `origin`
pub fn apply_cors_headers(headers: &mut HeaderMap, origin: &HeaderValue) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(PREFLIGHT_METHODS),
    );
    headers.insert(header::SET_COOKIE, HeaderValue::from_static(PREFLIGHT_COOKIE));
}

/// Build CORS preflight response (200, no body)
pub fn build_preflight_response(origin: &HeaderValue) -> Response<ResponseBody> {
    let mut response = Response::new(empty_body());
    apply_cors_headers(response.headers_mut(), origin);
    response
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "text/plain;charset=utf-8")
        .body(full_body(NOT_FOUND_BODY))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(full_body(NOT_FOUND_BODY))
        })
}

/// Build 304 Not Modified response carrying the validators
pub fn build_304_response(
    validators: &CacheValidators,
    cache_control: &str,
) -> Response<ResponseBody> {
    let builder = Response::builder().status(StatusCode::NOT_MODIFIED);
    with_validators(builder, validators, cache_control)
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(empty_body())
        })
}

/// Attach `Expires`, `Cache-Control`, `Last-Modified` and `Etag`
pub fn with_validators(
    builder: hyper::http::response::Builder,
    validators: &CacheValidators,
    cache_control: &str,
) -> hyper::http::response::Builder {
    builder
        .header(header::EXPIRES, validators.expires.as_str())
        .header(header::CACHE_CONTROL, cache_control)
        .header(header::LAST_MODIFIED, validators.last_modified.as_str())
        .header(header::ETAG, validators.etag.as_str())
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::PAYLOAD_TOO_LARGE)
        .header(header::CONTENT_TYPE, "text/plain;charset=utf-8")
        .body(full_body("payload too large"))
        .unwrap_or_else(|e| {
            log_build_error("413", &e);
            Response::new(full_body("payload too large"))
        })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(header::CONTENT_TYPE, "text/plain;charset=utf-8")
        .header(header::CONTENT_RANGE, format!("bytes */{file_size}"))
        .body(full_body("range not satisfiable"))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(full_body("range not satisfiable"))
        })
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "text/plain;charset=utf-8")
        .body(full_body("internal server error"))
        .unwrap_or_else(|e| {
            log_build_error("500", &e);
            Response::new(full_body("internal server error"))
        })
}

/// Build generic HTML response
pub fn build_html_response(content: String) -> Response<ResponseBody> {
    let content_length = content.len();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HTML_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, content_length)
        .body(full_body(content))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(empty_body())
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
