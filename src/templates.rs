//! HTML template rendering
//!
//! Templates are embedded at compile time and rendered through `minijinja`
//! with HTML auto-escaping, so entry names and echoed upload parts never
//! reach the page unescaped.

use minijinja::{context, Environment};
use serde::Serialize;

const LISTING_TEMPLATE: &str = "listing.html";
const UPLOAD_TEMPLATE: &str = "upload.html";

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    /// Bare name of the child
    pub name: String,
    /// Request path of the child (listed pathname joined with `name`)
    pub path: String,
    /// `path` percent-encoded for use as a link target
    pub href: String,
}

/// Template renderer shared by all requests
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(LISTING_TEMPLATE, include_str!("../templates/listing.html"))?;
        env.add_template(UPLOAD_TEMPLATE, include_str!("../templates/upload.html"))?;
        Ok(Self { env })
    }

    /// Render a directory listing page
    pub fn render_listing(
        &self,
        pathname: &str,
        entries: &[DirEntry],
    ) -> Result<String, minijinja::Error> {
        self.env
            .get_template(LISTING_TEMPLATE)?
            .render(context! { path => pathname, entries => entries })
    }

    /// Render the page echoing a received upload part
    pub fn render_upload_echo(&self, part: &str) -> Result<String, minijinja::Error> {
        self.env
            .get_template(UPLOAD_TEMPLATE)?
            .render(context! { part => part })
    }
}
