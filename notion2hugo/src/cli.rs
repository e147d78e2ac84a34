/// CLI glue for notion2hugo: argument parsing, collaborator wiring and the
/// optional pull request.
///
/// All conversion logic lives in [`notion2hugo-core`]; this module only turns the
/// config file and flags into an [`ExportConfig`] and a page list, runs the batch
/// export and reports on it.
///
/// ## How To Use
/// - From the shell: `notion2hugo export --config notion2hugo.yaml`.
/// - From tests: call [`run`] with a constructed [`Cli`].
///
/// [`notion2hugo-core`]: ../../notion2hugo_core/
/// [`ExportConfig`]: notion2hugo_core::config::ExportConfig
use crate::load_config::load_config;
use crate::pull_request::GitHubClient;
use anyhow::Result;
use clap::{Parser, Subcommand};
use notion2hugo_core::assets::HttpAssetFetcher;
use notion2hugo_core::contract::ChangeRequester;
use notion2hugo_core::export::export_pages;
use notion2hugo_core::notion::NotionClient;
use notion2hugo_core::ExportReport;
use std::path::PathBuf;

/// CLI for notion2hugo: export Notion pages as Hugo posts.
#[derive(Parser)]
#[clap(
    name = "notion2hugo",
    version,
    about = "Export Notion pages as Hugo posts and propose them in a pull request"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export pages into the Hugo site described by the config file
    Export {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Page URL or id to export instead of the configured list (repeatable)
        #[clap(long = "page")]
        pages: Vec<String>,
        /// Do not open a pull request even if one is configured
        #[clap(long)]
        no_pull_request: bool,
    },
}

/// Opens the change request for a finished batch, if anything was exported.
///
/// Returns the request URL, or `None` when there was nothing to propose.
pub async fn publish(
    report: &ExportReport,
    requester: &dyn ChangeRequester,
) -> Result<Option<String>> {
    if report.exported.is_empty() {
        tracing::info!("Nothing exported, skipping pull request");
        return Ok(None);
    }
    let request = report.change_request();
    let url = requester
        .open_change_request(&request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open pull request: {e}"))?;
    Ok(Some(url))
}

pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Export {
            config,
            pages,
            no_pull_request,
        } => {
            let cli_config = load_config(&config)?;
            let export_config = cli_config.export_config();
            export_config.trace_loaded();

            let pages = if pages.is_empty() {
                cli_config.pages.clone()
            } else {
                tracing::info!(pages = pages.len(), "Using pages given on the command line");
                pages
            };
            if pages.is_empty() {
                anyhow::bail!("No pages to export: configure `pages` or pass --page");
            }

            let source = NotionClient::new_from_env()
                .map_err(|e| anyhow::anyhow!("Failed to construct Notion client: {e}"))?;
            let fetcher = HttpAssetFetcher::new();

            tracing::info!(command = "export", "Starting export");
            let report = export_pages(&export_config, &source, &fetcher, &pages).await;
            print!("{}", report.summary());

            match (&cli_config.pull_request, no_pull_request) {
                (Some(target), false) => {
                    let requester = GitHubClient::new_from_env(target.clone())
                        .map_err(|e| anyhow::anyhow!("Failed to construct GitHub client: {e}"))?;
                    if let Some(url) = publish(&report, &requester).await? {
                        println!("Pull request: {url}");
                    }
                }
                (Some(_), true) => tracing::info!("Pull request disabled on the command line"),
                (None, _) => tracing::debug!("No pull_request section configured"),
            }

            if !report.is_success() {
                tracing::error!(
                    command = "export",
                    failed = report.failed.len(),
                    "Export finished with failures"
                );
                anyhow::bail!("{} page(s) failed to export", report.failed.len());
            }
            tracing::info!(command = "export", "Export complete");
            Ok(())
        }
    }
}
