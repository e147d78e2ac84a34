//! # contract: collaborator interfaces of the export pipeline
//!
//! The conversion engine never talks to the network directly. It reads pages
//! and blocks through [`ContentSource`], downloads hosted images through
//! [`AssetFetcher`] and hands the batch summary to a [`ChangeRequester`].
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`; with the `test-export-mocks`
//!   feature the generated `Mock*` types are available to downstream crates.
//!
//! ## Errors
//! - Collaborator failures are boxed trait objects ([`SourceError`]); the
//!   engine wraps them in its own error types with the failing id attached.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::model::{Block, Page};

/// Error type returned by collaborator implementations.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Read access to pages and their block trees.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch a page's identity and metadata properties.
    async fn retrieve_page(&self, page_id: &str) -> Result<Page, SourceError>;

    /// All children of a page or block, in document order.
    ///
    /// Implementations handle pagination; the caller sees the complete list.
    async fn list_block_children(&self, block_id: &str) -> Result<Vec<Block>, SourceError>;
}

/// Downloads the bytes behind an asset URL.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// A change request to publish exported pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    pub title: String,
    pub body: String,
}

/// Opens a change request (e.g. a pull request) on the site repository.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ChangeRequester: Send + Sync {
    /// Returns a URL for the opened request.
    async fn open_change_request(&self, request: &ChangeRequest) -> Result<String, SourceError>;
}
