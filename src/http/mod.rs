//! HTTP protocol layer module
//!
//! Header computation, parsing and response building, decoupled from the
//! request dispatch in `handler`.

pub mod cache;
pub mod encoding;
pub mod mime;
pub mod multipart;
pub mod path;
pub mod range;
pub mod response;

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;

// Re-export commonly used types
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_404_response, build_413_response, build_416_response,
    build_500_response, build_html_response, build_preflight_response,
};

/// Body type of every response: fixed buffers and file streams alike
pub type ResponseBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// Body from an in-memory buffer
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed_unsync()
}

/// Body with no content
pub fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed_unsync()
}
