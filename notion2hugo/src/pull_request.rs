//! # Pull request integration
//!
//! [`GitHubClient`] implements the core's [`ChangeRequester`] against the GitHub
//! REST API: the exported posts are expected to be committed on `head`, and the
//! client proposes merging them into `base`.
//!
//! Construct it with [`GitHubClient::new_from_env`] (`GH_TOKEN`) and the
//! `pull_request` section of the config file.

use async_trait::async_trait;
use notion2hugo_core::contract::{ChangeRequest, ChangeRequester, SourceError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;

use crate::load_config::PullRequestSection;

pub const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("notion2hugo/", env!("CARGO_PKG_VERSION"));

pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    target: PullRequestSection,
}

#[derive(Debug, Deserialize)]
struct CreatedPullRequest {
    html_url: String,
}

/// JSON body of the create-pull-request call.
pub fn pull_request_payload(target: &PullRequestSection, request: &ChangeRequest) -> Value {
    json!({
        "title": request.title,
        "body": request.body,
        "head": format!("{}:{}", target.owner, target.head),
        "base": target.base,
    })
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, target: PullRequestSection) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: GITHUB_API_URL.to_string(),
            token: token.into(),
            target,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn new_from_env(target: PullRequestSection) -> Result<Self, SourceError> {
        match env::var("GH_TOKEN") {
            Ok(token) => {
                tracing::info!(
                    owner = %target.owner,
                    repo = %target.repo,
                    "Initialized GitHubClient from environment"
                );
                Ok(Self::new(token, target))
            }
            Err(e) => {
                tracing::error!(error = ?e, "GH_TOKEN missing in environment");
                Err(Box::new(e))
            }
        }
    }

    fn pulls_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/pulls",
            self.base_url, self.target.owner, self.target.repo
        )
    }
}

#[async_trait]
impl ChangeRequester for GitHubClient {
    async fn open_change_request(&self, request: &ChangeRequest) -> Result<String, SourceError> {
        let url = self.pulls_url();
        tracing::info!(url = %url, title = %request.title, "Opening pull request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT)
            .json(&pull_request_payload(&self.target, request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            tracing::error!(status = %status, "Pull request creation failed. Response body: {text}");
            return Err(format!("GitHub API error {status}: {text}").into());
        }

        let created: CreatedPullRequest = response.json().await?;
        tracing::info!(url = %created.html_url, "Pull request opened");
        Ok(created.html_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> PullRequestSection {
        PullRequestSection {
            owner: "me".into(),
            repo: "blog".into(),
            base: "master".into(),
            head: "dev".into(),
        }
    }

    #[test]
    fn payload_qualifies_head_with_owner() {
        let request = ChangeRequest {
            title: "Publish 2 post(s) from Notion".into(),
            body: "Exported 2 page(s):\n".into(),
        };
        assert_eq!(
            pull_request_payload(&target(), &request),
            json!({
                "title": "Publish 2 post(s) from Notion",
                "body": "Exported 2 page(s):\n",
                "head": "me:dev",
                "base": "master"
            })
        );
    }

    #[test]
    fn pulls_url_targets_the_repository() {
        let client = GitHubClient::new("t", target()).with_base_url("http://localhost:8080/");
        assert_eq!(client.pulls_url(), "http://localhost:8080/repos/me/blog/pulls");
    }
}
