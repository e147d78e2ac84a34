//! `ContentSource` backed by the Notion REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::contract::{ContentSource, SourceError};
use crate::model::{Block, Page};

pub const NOTION_API_URL: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";
pub const PAGE_SIZE: usize = 100;

/// One page of a paginated block-children listing.
#[derive(Debug, Deserialize)]
pub struct BlockChildren {
    pub results: Vec<Block>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl BlockChildren {
    /// Cursor of the next batch, if the listing continues.
    pub fn continuation(&self) -> Option<&str> {
        match (self.has_more, &self.next_cursor) {
            (true, Some(cursor)) if !cursor.is_empty() => Some(cursor),
            _ => None,
        }
    }
}

pub struct NotionClient {
    http: Client,
    base_url: String,
    token: String,
}

impl NotionClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: NOTION_API_URL.to_string(),
            token: token.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reads the integration token from `NOTION_API_KEY`.
    pub fn new_from_env() -> Result<Self, SourceError> {
        match std::env::var("NOTION_API_KEY") {
            Ok(token) if !token.trim().is_empty() => {
                info!("Initialized NotionClient from environment");
                Ok(Self::new(token))
            }
            Ok(_) => {
                error!("NOTION_API_KEY is empty");
                Err("NOTION_API_KEY is empty".into())
            }
            Err(e) => {
                error!(error = ?e, "NOTION_API_KEY missing in environment");
                Err(Box::new(e))
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            error!(status = %status, url, "Notion API returned error. Response body: {body}");
            return Err(format!("Notion API error {status} for {url}: {body}").into());
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ContentSource for NotionClient {
    async fn retrieve_page(&self, page_id: &str) -> Result<Page, SourceError> {
        let url = format!("{}/pages/{page_id}", self.base_url);
        let page: Page = self.get_json(&url, &[]).await?;
        info!(page_id, properties = page.properties.len(), "Retrieved page");
        Ok(page)
    }

    async fn list_block_children(&self, block_id: &str) -> Result<Vec<Block>, SourceError> {
        let url = format!("{}/blocks/{block_id}/children", self.base_url);
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut query = vec![("page_size", PAGE_SIZE.to_string())];
            if let Some(cursor) = &cursor {
                query.push(("start_cursor", cursor.clone()));
            }
            let page: BlockChildren = self.get_json(&url, &query).await?;
            debug!(block_id, batch = page.results.len(), has_more = page.has_more, "Fetched block children batch");
            cursor = page.continuation().map(str::to_string);
            blocks.extend(page.results);
            if cursor.is_none() {
                break;
            }
        }
        Ok(blocks)
    }
}
