use std::path::PathBuf;
use tracing::{debug, info};

pub use crate::front_matter::FrontMatterField;

pub const DEFAULT_CONTENT_DIR: &str = "content/posts";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Where exported pages and their assets go, and how metadata is mapped.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Root of the Hugo site.
    pub site_root: PathBuf,
    /// Posts directory, relative to `site_root`.
    pub content_dir: PathBuf,
    /// Static files directory, relative to `site_root`; served at `/`.
    pub static_dir: PathBuf,
    pub front_matter: Vec<FrontMatterField>,
    pub max_depth: usize,
}

impl ExportConfig {
    pub fn new(site_root: impl Into<PathBuf>) -> Self {
        Self {
            site_root: site_root.into(),
            content_dir: DEFAULT_CONTENT_DIR.into(),
            static_dir: DEFAULT_STATIC_DIR.into(),
            front_matter: FrontMatterField::defaults(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn content_root(&self) -> PathBuf {
        self.site_root.join(&self.content_dir)
    }

    pub fn static_root(&self) -> PathBuf {
        self.site_root.join(&self.static_dir)
    }

    pub fn trace_loaded(&self) {
        info!(
            site_root = %self.site_root.display(),
            content_dir = %self.content_dir.display(),
            static_dir = %self.static_dir.display(),
            front_matter_fields = self.front_matter.len(),
            max_depth = self.max_depth,
            "Loaded ExportConfig"
        );
        debug!(?self, "ExportConfig loaded (full debug)");
    }
}
