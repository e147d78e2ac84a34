/// `load_config` module: reads the static YAML config file into [`CliConfig`] and
/// maps it onto the core's [`ExportConfig`].
///
/// The file holds no secrets. API tokens come from the environment (`NOTION_API_KEY`,
/// `GH_TOKEN`) and are read by the clients that need them.
///
/// # Accepted schema
/// ```yaml
/// site:
///   root: ./blog
///   content_dir: content/posts   # optional
///   static_dir: static           # optional
/// pages:
///   - https://www.notion.so/My-Post-0123456789abcdef0123456789abcdef
/// front_matter:                  # optional, ordered
///   - { property: Name, key: title }
/// render:
///   max_depth: 32                # optional
/// pull_request:                  # optional
///   owner: me
///   repo: blog
///   base: master                 # optional
///   head: dev                    # optional
/// ```
///
/// # Errors
/// Read and parse failures are returned as `anyhow::Error` naming the file.
use anyhow::Result;
use notion2hugo_core::config::{
    ExportConfig, FrontMatterField, DEFAULT_CONTENT_DIR, DEFAULT_MAX_DEPTH, DEFAULT_STATIC_DIR,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub site: SiteSection,
    #[serde(default)]
    pub pages: Vec<String>,
    #[serde(default)]
    pub front_matter: Option<Vec<FrontMatterField>>,
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub pull_request: Option<PullRequestSection>,
}

#[derive(Debug, Deserialize)]
pub struct SiteSection {
    pub root: PathBuf,
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct RenderSection {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Repository the exported posts are proposed to.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PullRequestSection {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_base")]
    pub base: String,
    #[serde(default = "default_head")]
    pub head: String,
}

fn default_content_dir() -> PathBuf {
    DEFAULT_CONTENT_DIR.into()
}

fn default_static_dir() -> PathBuf {
    DEFAULT_STATIC_DIR.into()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_base() -> String {
    "master".to_string()
}

fn default_head() -> String {
    "dev".to_string()
}

impl CliConfig {
    pub fn export_config(&self) -> ExportConfig {
        let mut config = ExportConfig::new(&self.site.root);
        config.content_dir = self.site.content_dir.clone();
        config.static_dir = self.site.static_dir.clone();
        config.max_depth = self.render.max_depth;
        if let Some(fields) = &self.front_matter {
            config.front_matter = fields.clone();
        }
        config
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!(
                "Failed to parse config YAML {:?}: {e}",
                path_ref
            ));
        }
    };

    info!(
        config_path = ?path_ref,
        pages = config.pages.len(),
        pull_request = config.pull_request.is_some(),
        "Parsed config YAML successfully"
    );
    Ok(config)
}
