//! Static file serving module
//!
//! Builds file responses: validators and the 304 short-circuit, single byte
//! ranges, and negotiated compression over a streamed body.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::cache::{self, CacheValidators};
use crate::http::encoding::{compress_stream, ContentEncoding};
use crate::http::range::RangeParseResult;
use crate::http::response::with_validators;
use crate::http::{self, mime, ResponseBody};
use crate::logger;
use chrono::Utc;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::header;
use hyper::{Response, StatusCode};
use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::Path;
use std::time::SystemTime;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;

/// Serve a regular file
pub async fn serve_file(
    ctx: &RequestContext,
    abs_path: &Path,
    meta: &Metadata,
    state: &AppState,
) -> Response<ResponseBody> {
    let cache_control = cache::cache_control(state.config.http.legacy_cache_control);
    let Some(validators) = compute_validators(abs_path, meta).await else {
        return http::build_500_response();
    };

    if validators.is_fresh(
        ctx.header("is-modified-since"),
        ctx.header(header::IF_NONE_MATCH),
    ) {
        return http::build_304_response(&validators, &cache_control);
    }

    let total_size = meta.len();
    let builder = with_validators(
        Response::builder().header(header::CONTENT_TYPE, mime::get_content_type(abs_path)),
        &validators,
        &cache_control,
    );

    let (builder, start, len, encoding) =
        match http::parse_range_header(ctx.header(header::RANGE), total_size) {
            RangeParseResult::Valid(range) => (
                builder
                    .status(StatusCode::PARTIAL_CONTENT)
                    .header(header::CONTENT_RANGE, range.content_range(total_size))
                    .header(header::CONTENT_LENGTH, range.len()),
                range.start,
                range.len(),
                ContentEncoding::Identity,
            ),
            RangeParseResult::NotSatisfiable => return http::build_416_response(total_size),
            RangeParseResult::None => {
                let encoding = ContentEncoding::negotiate(ctx.header(header::ACCEPT_ENCODING));
                let builder = builder
                    .status(StatusCode::OK)
                    .header(header::ACCEPT_RANGES, "bytes")
                    .header(header::VARY, "Accept-Encoding");
                let builder = match encoding.header_value() {
                    Some(value) => builder.header(header::CONTENT_ENCODING, value),
                    None => builder.header(header::CONTENT_LENGTH, total_size),
                };
                (builder, 0, total_size, encoding)
            }
        };

    let reader = match open_window(abs_path, start, len).await {
        Ok(reader) => reader,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to open file '{}': {e}",
                abs_path.display()
            ));
            return http::build_500_response();
        }
    };

    let stream = compress_stream(ReaderStream::new(reader), encoding);
    let body = StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync();

    builder.body(body).unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build file response: {e}"));
        http::build_500_response()
    })
}

/// Read the whole file once to derive its validators
///
/// This is the only non-streaming read of a served file.
async fn compute_validators(abs_path: &Path, meta: &Metadata) -> Option<CacheValidators> {
    let content = match fs::read(abs_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                abs_path.display()
            ));
            return None;
        }
    };
    let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    Some(CacheValidators::compute(modified, &content, Utc::now()))
}

/// Open `len` bytes of a file starting at `start`
async fn open_window(abs_path: &Path, start: u64, len: u64) -> std::io::Result<Take<File>> {
    let mut file = File::open(abs_path).await?;
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }
    Ok(file.take(len))
}
