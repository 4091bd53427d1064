//! Request dispatch module
//!
//! Entry point for HTTP request processing: decodes the path and picks the
//! upload endpoint, a directory listing, a file, or the not-found fallback.

use crate::config::AppState;
use crate::handler::{listing, static_files, upload};
use crate::http::{self, path, response::apply_cors_headers, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;

/// Request context encapsulating information needed for request processing
pub struct RequestContext {
    pub method: Method,
    /// Percent-decoded request path
    pub pathname: String,
    pub headers: HeaderMap,
}

impl RequestContext {
    /// Header value as text, `None` when absent or not visible ASCII
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let ctx = RequestContext {
        method: parts.method,
        pathname: path::decode_path(parts.uri.path()),
        headers: parts.headers,
    };

    let mut response = if ctx.pathname == state.config.site.upload_path {
        upload::handle_upload(&ctx, body, &state).await
    } else {
        drop(body);
        dispatch(&ctx, &state).await
    };

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(header::SERVER, server);
    }

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            remote_addr.ip().to_string(),
            ctx.method.to_string(),
            parts.uri.path().to_string(),
        );
        entry.query = parts.uri.query().map(ToString::to_string);
        entry.http_version = version_label(parts.version).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        entry.referer = ctx.header(header::REFERER).map(ToString::to_string);
        entry.user_agent = ctx.header(header::USER_AGENT).map(ToString::to_string);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Stat the resolved path and hand off to the matching responder
async fn dispatch(ctx: &RequestContext, state: &AppState) -> Response<ResponseBody> {
    let Some(abs_path) = path::resolve(&state.root, &ctx.pathname) else {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {}",
            ctx.pathname
        ));
        return not_found(ctx);
    };

    match fs::metadata(&abs_path).await {
        Ok(meta) if meta.is_dir() => listing::serve_listing(ctx, &abs_path, state).await,
        Ok(meta) => static_files::serve_file(ctx, &abs_path, &meta, state).await,
        Err(_) => not_found(ctx),
    }
}

/// Fallback for unresolvable paths
///
/// With an `Origin` header the CORS grant is attached, and an `OPTIONS`
/// request is answered as a preflight instead of a 404.
fn not_found(ctx: &RequestContext) -> Response<ResponseBody> {
    let Some(origin) = ctx.headers.get(header::ORIGIN) else {
        return http::build_404_response();
    };

    if ctx.method == Method::OPTIONS {
        return http::build_preflight_response(origin);
    }

    let mut response = http::build_404_response();
    apply_cors_headers(response.headers_mut(), origin);
    response
}

const fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use flate2::read::GzDecoder;
    use http_body_util::{BodyExt, Full};
    use hyper::StatusCode;
    use std::collections::HashSet;
    use std::io::Read;
    use std::path::Path;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: std::path::PathBuf,
        state: Arc<AppState>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("www");
        std::fs::create_dir_all(&root).unwrap();

        let mut cfg = Config::default();
        cfg.site.root = root.clone();
        cfg.site.upload_dir = dir.path().join("assets");
        cfg.logging.access_log = false;

        let state = Arc::new(AppState::new(&cfg).unwrap());
        Fixture {
            _dir: dir,
            root,
            state,
        }
    }

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    async fn send(
        state: &Arc<AppState>,
        req: hyper::http::request::Builder,
        body: &'static [u8],
    ) -> (Response<ResponseBody>, Vec<u8>) {
        let req = req.body(Full::new(Bytes::from_static(body))).unwrap();
        let resp = handle_request(req, Arc::clone(state), "127.0.0.1:4000".parse().unwrap())
            .await
            .unwrap();
        let (parts, body) = resp.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes().to_vec();
        (Response::from_parts(parts, http::empty_body()), bytes)
    }

    async fn get(state: &Arc<AppState>, uri: &str) -> (Response<ResponseBody>, Vec<u8>) {
        send(state, Request::get(uri), b"").await
    }

    #[tokio::test]
    async fn test_file_served_byte_identical() {
        let fx = fixture();
        let content: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
        std::fs::write(fx.root.join("blob.bin"), &content).unwrap();

        let (resp, body) = get(&fx.state, "/blob.bin").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body, content);
        assert_eq!(resp.headers()["content-length"], "70000");
        assert_eq!(
            resp.headers()["content-type"],
            "application/octet-stream;charset=utf-8"
        );
        assert_eq!(resp.headers()["cache-control"], "max-age=86400");
        assert!(resp.headers().contains_key("expires"));
        assert!(resp.headers().contains_key("last-modified"));
        assert_eq!(
            resp.headers()["etag"],
            crate::http::cache::content_etag(&content).as_str()
        );
    }

    #[tokio::test]
    async fn test_legacy_cache_control() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", b"a");
        let mut cfg = Config::default();
        cfg.site.root = dir.path().to_path_buf();
        cfg.http.legacy_cache_control = true;
        cfg.logging.access_log = false;
        let state = Arc::new(AppState::new(&cfg).unwrap());

        let (resp, _) = get(&state, "/a.txt").await;
        assert_eq!(resp.headers()["cache-control"], "max-age=3600 * 24");
    }

    #[tokio::test]
    async fn test_conditional_request_yields_304() {
        let fx = fixture();
        write(&fx.root, "page.html", b"<h1>hi</h1>");

        let (first, _) = get(&fx.state, "/page.html").await;
        assert_eq!(first.status(), StatusCode::OK);
        let last_modified = first.headers()["last-modified"].clone();
        let etag = first.headers()["etag"].clone();

        let req = Request::get("/page.html")
            .header("is-modified-since", last_modified.clone())
            .header("if-none-match", etag.clone());
        let (second, body) = send(&fx.state, req, b"").await;
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
        assert!(body.is_empty());
        assert_eq!(second.headers()["etag"], etag);

        // Only one validator matching is not enough
        let req = Request::get("/page.html").header("if-none-match", etag);
        let (third, body) = send(&fx.state, req, b"").await;
        assert_eq!(third.status(), StatusCode::OK);
        assert_eq!(body, b"<h1>hi</h1>");
    }

    #[tokio::test]
    async fn test_standard_if_modified_since_is_not_consulted() {
        let fx = fixture();
        write(&fx.root, "a.txt", b"abc");
        let (first, _) = get(&fx.state, "/a.txt").await;

        let req = Request::get("/a.txt")
            .header("if-modified-since", first.headers()["last-modified"].clone())
            .header("if-none-match", first.headers()["etag"].clone());
        let (resp, _) = send(&fx.state, req, b"").await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_directory_listing() {
        let fx = fixture();
        write(&fx.root, "docs/a.txt", b"a");
        write(&fx.root, "docs/b.txt", b"b");
        std::fs::create_dir_all(fx.root.join("docs/c")).unwrap();

        let entries = listing::read_entries("/docs", &fx.root.join("docs"))
            .await
            .unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths.len(), 3);
        let unique: HashSet<&str> = paths.iter().copied().collect();
        let expected: HashSet<&str> = ["/docs/a.txt", "/docs/b.txt", "/docs/c"].into_iter().collect();
        assert_eq!(unique, expected);

        let (resp, body) = get(&fx.state, "/docs").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/html;charset=utf-8");
        let html = String::from_utf8(body).unwrap();
        for path in expected {
            assert!(html.contains(&format!("href=\"{path}\"")), "missing {path}");
        }
    }

    #[tokio::test]
    async fn test_root_listing_and_non_ascii_names() {
        let fx = fixture();
        write(&fx.root, "中文.txt", "你好".as_bytes());

        let (resp, body) = get(&fx.state, "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("href=\"/%E4%B8%AD%E6%96%87.txt\""));
        assert!(html.contains(">中文.txt<"));

        let (resp, body) = get(&fx.state, "/%E4%B8%AD%E6%96%87.txt").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body, "你好".as_bytes());
    }

    #[tokio::test]
    async fn test_range_request() {
        let fx = fixture();
        write(&fx.root, "digits.txt", b"0123456789abcdefghij");

        let req = Request::get("/digits.txt")
            .header("range", "bytes=0-9")
            .header("accept-encoding", "gzip");
        let (resp, body) = send(&fx.state, req, b"").await;
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()["content-range"], "bytes 0-9/20");
        assert!(!resp.headers().contains_key("content-encoding"));
        assert_eq!(body, b"0123456789");

        let req = Request::get("/digits.txt").header("range", "bytes=15-99");
        let (resp, body) = send(&fx.state, req, b"").await;
        assert_eq!(resp.headers()["content-range"], "bytes 15-19/20");
        assert_eq!(body, b"fghij");
    }

    #[tokio::test]
    async fn test_range_not_satisfiable() {
        let fx = fixture();
        write(&fx.root, "small.txt", b"abc");

        let req = Request::get("/small.txt").header("range", "bytes=10-20");
        let (resp, _) = send(&fx.state, req, b"").await;
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()["content-range"], "bytes */3");
    }

    #[tokio::test]
    async fn test_gzip_negotiation() {
        let fx = fixture();
        let content = "compress me ".repeat(1000);
        write(&fx.root, "big.txt", content.as_bytes());

        let req = Request::get("/big.txt").header("accept-encoding", "gzip, deflate");
        let (resp, body) = send(&fx.state, req, b"").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-encoding"], "gzip");
        assert!(!resp.headers().contains_key("content-length"));

        let mut decoded = String::new();
        GzDecoder::new(&body[..]).read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded, content);
    }

    #[tokio::test]
    async fn test_deflate_negotiation() {
        let fx = fixture();
        write(&fx.root, "a.txt", b"deflate body");

        let req = Request::get("/a.txt").header("accept-encoding", "deflate");
        let (resp, body) = send(&fx.state, req, b"").await;
        assert_eq!(resp.headers()["content-encoding"], "deflate");
        let mut decoded = Vec::new();
        flate2::read::ZlibDecoder::new(&body[..])
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, b"deflate body");
    }

    #[tokio::test]
    async fn test_unknown_encoding_is_identity() {
        let fx = fixture();
        write(&fx.root, "a.txt", b"plain");

        let req = Request::get("/a.txt").header("accept-encoding", "br");
        let (resp, body) = send(&fx.state, req, b"").await;
        assert!(!resp.headers().contains_key("content-encoding"));
        assert_eq!(body, b"plain");
    }

    #[tokio::test]
    async fn test_not_found() {
        let fx = fixture();
        let (resp, body) = get(&fx.state, "/missing.txt").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body, b"not found");
        assert!(!resp.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_preflight_on_missing_path() {
        let fx = fixture();
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/missing")
            .header("origin", "http://example.com");
        let (resp, body) = send(&fx.state, req, b"").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body.is_empty());
        assert_eq!(resp.headers()["access-control-allow-origin"], "http://example.com");
        assert_eq!(resp.headers()["access-control-allow-methods"], "PUT,DELETE,OPTIONS");
        assert_eq!(resp.headers()["access-control-max-age"], "1800");
    }

    #[tokio::test]
    async fn test_cors_headers_on_404_with_origin() {
        let fx = fixture();
        let req = Request::get("/missing").header("origin", "http://example.com");
        let (resp, body) = send(&fx.state, req, b"").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body, b"not found");
        assert_eq!(resp.headers()["access-control-allow-origin"], "http://example.com");
    }

    #[tokio::test]
    async fn test_traversal_is_not_found() {
        let fx = fixture();
        // Sibling of the root inside the temp dir
        write(fx.root.parent().unwrap(), "secret.txt", b"secret");

        let (resp, body) = get(&fx.state, "/../secret.txt").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body, b"not found");

        let (resp, _) = get(&fx.state, "/%2E%2E/secret.txt").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_server_header() {
        let fx = fixture();
        let (resp, _) = get(&fx.state, "/missing").await;
        assert_eq!(resp.headers()["server"], "fserver");
    }

    const UPLOAD_BODY: &[u8] = b"--XyZ\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"cat.png\"\r\n\
Content-Type: image/png\r\n\
\r\n\
PNGDATA\r\n\
--XyZ--\r\n";

    #[tokio::test]
    async fn test_upload_path_routes_without_file_under_root() {
        let fx = fixture();
        assert!(!fx.root.join("img").exists());

        let req = Request::post("/img").header("content-type", "multipart/form-data; boundary=XyZ");
        let (resp, body) = send(&fx.state, req, UPLOAD_BODY).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/html;charset=utf-8");
        assert_eq!(resp.headers()["server"], "fserver");
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("PNGDATA"));

        let stored = std::fs::read(fx.state.upload_dir.join("cat.png")).unwrap();
        assert_eq!(stored, b"PNGDATA");
    }

    #[tokio::test]
    async fn test_upload_path_accepts_any_method() {
        let fx = fixture();

        let req = Request::put("/img").header("content-type", "multipart/form-data; boundary=XyZ");
        let (resp, body) = send(&fx.state, req, UPLOAD_BODY).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("PNGDATA"));
        assert_eq!(std::fs::read(fx.state.upload_dir.join("cat.png")).unwrap(), b"PNGDATA");
    }
}
