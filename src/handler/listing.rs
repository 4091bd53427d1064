//! Directory listing module

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, path, ResponseBody};
use crate::logger;
use crate::templates::DirEntry;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Render the immediate children of a directory as an HTML page
pub async fn serve_listing(
    ctx: &RequestContext,
    abs_path: &Path,
    state: &AppState,
) -> Response<ResponseBody> {
    let entries = match read_entries(&ctx.pathname, abs_path).await {
        Ok(entries) => entries,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read directory '{}': {e}",
                abs_path.display()
            ));
            return http::build_500_response();
        }
    };

    match state.renderer.render_listing(&ctx.pathname, &entries) {
        Ok(html) => http::build_html_response(html),
        Err(e) => {
            logger::log_error(&format!("Failed to render listing for '{}': {e}", ctx.pathname));
            http::build_500_response()
        }
    }
}

/// Enumerate `dir` in filesystem order
pub async fn read_entries(pathname: &str, dir: &Path) -> std::io::Result<Vec<DirEntry>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(child) = reader.next_entry().await? {
        let name = child.file_name().to_string_lossy().into_owned();
        let path = path::join_url_path(pathname, &name);
        let href = path::encode_path(&path);
        entries.push(DirEntry { name, path, href });
    }

    Ok(entries)
}
