//! Upload endpoint
//!
//! Stores the file carried by the first part of a multipart body and echoes
//! that part back. Storage failures are logged and never change the reply.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, multipart, ResponseBody};
use crate::logger;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Handle a request to the upload path, whatever its method
pub async fn handle_upload<B>(
    ctx: &RequestContext,
    body: B,
    state: &AppState,
) -> Response<ResponseBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(state.config.http.max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_warning(&format!("Upload body exceeds {limit} bytes"));
            return http::build_413_response();
        }
        Err(e) => {
            logger::log_error(&format!("Failed to read upload body: {e}"));
            return http::build_500_response();
        }
    };

    let part = ctx
        .header(header::CONTENT_TYPE)
        .and_then(multipart::boundary)
        .and_then(|boundary| multipart::first_part(&body, boundary));

    let echo = match part {
        Some(part) => {
            if let Some(filename) = part.filename() {
                store(&state.upload_dir, &filename, part.file_content()).await;
            }
            String::from_utf8_lossy(part.raw).into_owned()
        }
        None => {
            logger::log_warning("Upload request without a multipart part");
            String::new()
        }
    };

    match state.renderer.render_upload_echo(&echo) {
        Ok(html) => http::build_html_response(html),
        Err(e) => {
            logger::log_error(&format!("Failed to render upload echo: {e}"));
            http::build_500_response()
        }
    }
}

/// Write an uploaded file, logging instead of failing
async fn store(upload_dir: &Path, filename: &str, content: &[u8]) {
    let Some(target) = upload_target(upload_dir, filename) else {
        logger::log_warning(&format!("Refusing upload file name '{filename}'"));
        return;
    };

    let result = match fs::create_dir_all(upload_dir).await {
        Ok(()) => fs::write(&target, content).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        logger::log_error(&format!(
            "Failed to store upload '{}': {e}",
            target.display()
        ));
    }
}

/// Path an upload is written to
///
/// Client-supplied names are reduced to their last path segment so a part
/// cannot write outside `upload_dir`.
fn upload_target(upload_dir: &Path, filename: &str) -> Option<PathBuf> {
    let name = filename.rsplit(['/', '\\']).next()?;
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(upload_dir.join(name))
}
