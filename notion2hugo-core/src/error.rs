//! Error taxonomy for a page export.
//!
//! Only fatal conditions live here. Recoverable ones (a malformed rich-text
//! entry, an unsupported caption directive shape, an unknown style key) are
//! logged where they happen and processing carries on.

use std::path::PathBuf;

use crate::contract::SourceError;

/// Fatal errors raised while rendering a block tree.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The block vocabulary is closed; an unknown tag aborts the document.
    #[error("unsupported block type `{tag}` in block {block_id}: {payload}")]
    UnsupportedBlockType {
        block_id: String,
        tag: String,
        payload: serde_json::Value,
    },

    #[error("block {block_id} is nested deeper than the limit of {limit} levels")]
    DepthExceeded { block_id: String, limit: usize },

    #[error("failed to list children of block {block_id}: {source}")]
    Children {
        block_id: String,
        #[source]
        source: SourceError,
    },

    #[error("failed to fetch asset {url}: {source}")]
    AssetFetch {
        url: String,
        #[source]
        source: SourceError,
    },

    #[error("failed to write asset {}: {source}", path.display())]
    AssetWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset url {url} has no usable file name")]
    InvalidAssetUrl { url: String },
}

#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("page has no metadata property `{property}`")]
    MissingMetadataProperty { property: String },
}

/// Errors that abort the export of a single page.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("`{input}` does not contain a page id")]
    InvalidPageId { input: String },

    #[error("failed to retrieve page {page_id}: {source}")]
    Source {
        page_id: String,
        #[source]
        source: SourceError,
    },

    #[error("page {page_id}: {source}")]
    FrontMatter {
        page_id: String,
        #[source]
        source: FrontMatterError,
    },

    #[error("page {page_id}: {source}")]
    Render {
        page_id: String,
        #[source]
        source: RenderError,
    },

    #[error("page {page_id}: `{value}` cannot be used as a file or directory name")]
    InvalidPath { page_id: String, value: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
