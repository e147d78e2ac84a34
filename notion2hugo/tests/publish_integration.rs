use notion2hugo::cli::publish;
use notion2hugo::load_config::PullRequestSection;
use notion2hugo::pull_request::GitHubClient;
use notion2hugo_core::contract::MockChangeRequester;
use notion2hugo_core::{ExportReport, ExportedPage};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

fn report_with(slugs: &[&str]) -> ExportReport {
    ExportReport {
        exported: slugs
            .iter()
            .map(|slug| ExportedPage {
                page_id: format!("id-{slug}"),
                slug: slug.to_string(),
                path: PathBuf::from(format!("content/posts/{slug}.md")),
                assets: 0,
            })
            .collect(),
        failed: Vec::new(),
    }
}

#[tokio::test]
async fn exported_pages_open_one_change_request() {
    let mut requester = MockChangeRequester::new();
    requester
        .expect_open_change_request()
        .withf(|request| {
            request.title == "Publish 2 post(s) from Notion"
                && request.body.contains("- first (content/posts/first.md)")
                && request.body.contains("- second (content/posts/second.md)")
        })
        .times(1)
        .returning(|_| Ok("https://github.com/me/blog/pull/7".to_string()));

    let url = publish(&report_with(&["first", "second"]), &requester)
        .await
        .unwrap();
    assert_eq!(url.as_deref(), Some("https://github.com/me/blog/pull/7"));
}

#[tokio::test]
async fn empty_batch_opens_nothing() {
    let requester = MockChangeRequester::new();
    let url = publish(&report_with(&[]), &requester).await.unwrap();
    assert!(url.is_none());
}

#[tokio::test]
async fn requester_failure_is_surfaced() {
    let mut requester = MockChangeRequester::new();
    requester
        .expect_open_change_request()
        .returning(|_| Err("422 Unprocessable Entity".into()));

    let err = publish(&report_with(&["first"]), &requester)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("422"), "{err}");
}

fn target() -> PullRequestSection {
    PullRequestSection {
        owner: "me".into(),
        repo: "blog".into(),
        base: "master".into(),
        head: "dev".into(),
    }
}

#[test]
#[serial]
fn github_client_requires_token() {
    env::remove_var("GH_TOKEN");
    assert!(GitHubClient::new_from_env(target()).is_err());
}

#[test]
#[serial]
fn github_client_reads_token_from_env() {
    env::set_var("GH_TOKEN", "ghp_test");
    let client = GitHubClient::new_from_env(target());
    env::remove_var("GH_TOKEN");
    assert!(client.is_ok());
}
