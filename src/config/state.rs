// Application state module
// Immutable state shared by every connection task

use std::path::PathBuf;

use super::types::Config;
use crate::templates::Renderer;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Absolute serving root
    pub root: PathBuf,
    /// Absolute upload directory
    pub upload_dir: PathBuf,
    pub renderer: Renderer,
}

impl AppState {
    /// Build the state, anchoring relative directories at the working directory
    pub fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let root = std::path::absolute(&config.site.root)?;
        let upload_dir = std::path::absolute(&config.site.upload_dir)?;

        Ok(Self {
            config: config.clone(),
            root,
            upload_dir,
            renderer: Renderer::new()?,
        })
    }
}
