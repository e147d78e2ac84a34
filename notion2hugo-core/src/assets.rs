//! Per-document image assets.
//!
//! Images hosted by the content API sit behind expiring URLs, so they are
//! downloaded into the document's asset directory and referenced from there.
//! Names come from the final URL path segment. Two different URLs with the same
//! final segment in one document get the second name prefixed with a short
//! hash of its path; the same path seen twice is downloaded once.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Url;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::contract::{AssetFetcher, SourceError};
use crate::error::RenderError;

/// Owns one document's asset directory for the duration of its render.
pub struct AssetStore<'a> {
    fetcher: &'a dyn AssetFetcher,
    dir: PathBuf,
    public_root: String,
    // file name -> url path it was stored for
    names: HashMap<String, String>,
    // url path -> public reference
    stored: HashMap<String, String>,
}

impl<'a> AssetStore<'a> {
    /// `dir` is created on the first download; `public_root` is the site path
    /// the directory is served under (e.g. `/my-post`).
    pub fn new(fetcher: &'a dyn AssetFetcher, dir: PathBuf, public_root: impl Into<String>) -> Self {
        Self {
            fetcher,
            dir,
            public_root: public_root.into(),
            names: HashMap::new(),
            stored: HashMap::new(),
        }
    }

    /// Number of distinct files written so far.
    pub fn len(&self) -> usize {
        self.stored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stored.is_empty()
    }

    /// Downloads `url` into the asset directory and returns its public path.
    pub async fn persist(&mut self, url: &str) -> Result<String, RenderError> {
        let (key, base_name) = asset_key_and_name(url)?;
        if let Some(reference) = self.stored.get(&key) {
            debug!(url, reference = %reference, "Asset already stored for this document");
            return Ok(reference.clone());
        }

        let name = match self.names.get(&base_name) {
            Some(owner) if *owner != key => format!("{}-{base_name}", short_hash(&key)),
            _ => base_name,
        };

        let bytes = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|source| RenderError::AssetFetch {
                url: url.to_string(),
                source,
            })?;

        fs::create_dir_all(&self.dir).map_err(|source| RenderError::AssetWrite {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(&name);
        fs::write(&path, &bytes).map_err(|source| RenderError::AssetWrite {
            path: path.clone(),
            source,
        })?;
        info!(url, path = %path.display(), size = bytes.len(), "Image file downloaded");

        let reference = format!("{}/{name}", self.public_root.trim_end_matches('/'));
        self.names.insert(name, key.clone());
        self.stored.insert(key, reference.clone());
        Ok(reference)
    }
}

/// Identity of an asset (host + path, ignoring signed query strings) and the
/// file name it would be stored under.
fn asset_key_and_name(url: &str) -> Result<(String, String), RenderError> {
    let invalid = || RenderError::InvalidAssetUrl {
        url: url.to_string(),
    };
    let parsed = Url::parse(url).map_err(|_| invalid())?;
    let name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(invalid)?
        .to_string();
    let key = format!("{}{}", parsed.host_str().unwrap_or_default(), parsed.path());
    Ok((key, name))
}

fn short_hash(key: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(key.as_bytes()));
    digest[..8].to_string()
}

/// Plain HTTP GET fetcher for source-hosted assets.
#[derive(Clone, Default)]
pub struct HttpAssetFetcher {
    http: reqwest::Client,
}

impl HttpAssetFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
