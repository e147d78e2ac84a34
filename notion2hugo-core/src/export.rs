//! Page export: front matter + rendered body → one Hugo post on disk.
//!
//! # Pipeline (per page)
//! 1. Normalise the page reference (URL or id) into a page id
//! 2. Retrieve the page and assemble its front matter
//! 3. Render the block tree, downloading hosted images into `static/<slug>/`
//! 4. Write `<content>/[<series>/]<slug>-<id>.md`
//!
//! A page is only written once it has been rendered completely, so a fatal
//! error never leaves a partial post behind. [`export_pages`] keeps going after
//! a failed page and reports every outcome in an [`ExportReport`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::assets::AssetStore;
use crate::config::ExportConfig;
use crate::contract::{AssetFetcher, ChangeRequest, ContentSource};
use crate::error::{ExportError, FrontMatterError};
use crate::front_matter::{assemble_front_matter, FrontMatter, FrontMatterField};
use crate::model::{Page, PropertyValue};
use crate::render::{BlockRenderer, Fragment};

/// A page that was written successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPage {
    pub page_id: String,
    pub slug: String,
    pub path: PathBuf,
    /// Number of asset files downloaded for the page.
    pub assets: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPage {
    /// The reference as given by the caller.
    pub page: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub exported: Vec<ExportedPage>,
    pub failed: Vec<FailedPage>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Human-readable list of what was exported (and what failed).
    pub fn summary(&self) -> String {
        let mut summary = format!("Exported {} page(s):\n", self.exported.len());
        for page in &self.exported {
            summary.push_str(&format!("- {} ({})\n", page.slug, page.path.display()));
        }
        if !self.failed.is_empty() {
            summary.push_str(&format!("\nFailed {} page(s):\n", self.failed.len()));
            for failure in &self.failed {
                summary.push_str(&format!("- {}: {}\n", failure.page, failure.error));
            }
        }
        summary
    }

    pub fn change_request(&self) -> ChangeRequest {
        ChangeRequest {
            title: format!("Publish {} post(s) from Notion", self.exported.len()),
            body: self.summary(),
        }
    }
}

fn page_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([0-9a-fA-F]{32}|[0-9a-fA-F]{8}(?:-[0-9a-fA-F]{4}){3}-[0-9a-fA-F]{12})$")
            .expect("page id pattern is a valid regex")
    })
}

/// Extracts the page id from a page URL or bare id, in hyphenated form.
///
/// Page URLs end in `<title>-<32 hex digits>`; query strings and fragments are
/// ignored.
pub fn normalise_page_id(input: &str) -> Result<String, ExportError> {
    let invalid = || ExportError::InvalidPageId {
        input: input.to_string(),
    };
    let without_query = input
        .trim()
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let segment = without_query.rsplit('/').next().unwrap_or_default();
    let raw = page_id_pattern()
        .captures(segment)
        .and_then(|captures| captures.get(1))
        .ok_or_else(invalid)?;
    let id = Uuid::try_parse(raw.as_str()).map_err(|_| invalid())?;
    Ok(id.hyphenated().to_string())
}

/// Turns a metadata value into a single safe path component.
///
/// Path separators and characters reserved on common filesystems become `_`;
/// leading and trailing `.`/`_` are trimmed so the result can never name a
/// parent directory or a hidden file. Returns `None` when nothing is left.
pub fn sanitise_path_component(raw: &str) -> Option<String> {
    let replaced = raw
        .trim()
        .replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'], "_");
    let trimmed = replaced.trim_matches(|c: char| c == '.' || c == '_' || c.is_whitespace());
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `<slug>-<id>.md`, with the id's separators stripped so two pages sharing a
/// slug never collide.
pub fn page_file_name(slug: &str, page_id: &str) -> String {
    format!("{slug}-{}.md", page_id.replace('-', ""))
}

/// The series subdirectory when the page belongs to one, else the content root.
pub fn output_path(content_root: &Path, series: Option<&str>, slug: &str, page_id: &str) -> PathBuf {
    let dir = match series {
        Some(series) if !series.is_empty() => content_root.join(series),
        _ => content_root.to_path_buf(),
    };
    dir.join(page_file_name(slug, page_id))
}

/// Front matter, a blank line, then the fragments separated by blank lines.
pub fn assemble_document(front_matter: &FrontMatter, fragments: &[Fragment]) -> String {
    let body = fragments
        .iter()
        .flat_map(|fragment| fragment.lines().iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{front_matter}\n{body}")
}

/// Series label of a page: the first label of a multi-select, or a single
/// select's value.
fn series_label(page_id: &str, value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::MultiSelect(labels) => labels.first().cloned(),
        PropertyValue::SingleSelect(name) => Some(name.clone()),
        other => {
            warn!(page_id, value = ?other, "Series property is not a select, ignoring");
            None
        }
    }
}

fn mapped_property<'p>(page: &'p Page, fields: &[FrontMatterField], key: &str) -> Option<&'p PropertyValue> {
    fields
        .iter()
        .find(|field| field.key == key)
        .and_then(|field| page.properties.get(&field.property))
}

fn path_component(page_id: &str, raw: &str) -> Result<String, ExportError> {
    let component = sanitise_path_component(raw).ok_or_else(|| {
        error!(page_id, value = raw, "Metadata value cannot be used as a path");
        ExportError::InvalidPath {
            page_id: page_id.to_string(),
            value: raw.to_string(),
        }
    })?;
    if component != raw {
        warn!(page_id, value = raw, path = %component, "Sanitised metadata value for use as a path");
    }
    Ok(component)
}

/// Exports one page and returns what was written.
pub async fn export_page(
    config: &ExportConfig,
    source: &dyn ContentSource,
    fetcher: &dyn AssetFetcher,
    page_ref: &str,
) -> Result<ExportedPage, ExportError> {
    let page_id = normalise_page_id(page_ref)?;
    info!(page_id = %page_id, "Retrieving page");

    let page = source
        .retrieve_page(&page_id)
        .await
        .map_err(|source| ExportError::Source {
            page_id: page_id.clone(),
            source,
        })?;

    let front_matter_error = |source| ExportError::FrontMatter {
        page_id: page.id.clone(),
        source,
    };
    let front_matter =
        assemble_front_matter(&page.properties, &config.front_matter).map_err(front_matter_error)?;

    let raw_slug = mapped_property(&page, &config.front_matter, "slug")
        .and_then(PropertyValue::plain_text)
        .filter(|slug| !slug.trim().is_empty())
        .ok_or_else(|| {
            front_matter_error(FrontMatterError::MissingMetadataProperty {
                property: "slug".to_string(),
            })
        })?;
    let slug = path_component(&page.id, &raw_slug)?;
    let series = mapped_property(&page, &config.front_matter, "series")
        .and_then(|value| series_label(&page.id, value))
        .filter(|series| !series.trim().is_empty())
        .map(|series| path_component(&page.id, &series))
        .transpose()?;

    let assets = AssetStore::new(fetcher, config.static_root().join(&slug), format!("/{slug}"));
    let mut renderer = BlockRenderer::new(source, assets, config.max_depth);
    let fragments = renderer
        .render_page(&page.id)
        .await
        .map_err(|source| ExportError::Render {
            page_id: page.id.clone(),
            source,
        })?;

    let document = assemble_document(&front_matter, &fragments);
    let path = output_path(&config.content_root(), series.as_deref(), &slug, &page_id);
    fs::write(&path, document).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    info!(page_id = %page.id, slug = %slug, path = %path.display(), "Page extracted");
    if !renderer.assets().is_empty() {
        info!(page_id = %page.id, assets = renderer.assets().len(), "Page assets stored");
    }

    Ok(ExportedPage {
        assets: renderer.assets().len(),
        page_id: page.id,
        slug,
        path,
    })
}

/// Exports every page in order; one page failing does not stop the others.
pub async fn export_pages(
    config: &ExportConfig,
    source: &dyn ContentSource,
    fetcher: &dyn AssetFetcher,
    pages: &[String],
) -> ExportReport {
    info!(pages = pages.len(), "[EXPORT] Starting export");
    let mut report = ExportReport::default();
    for page_ref in pages {
        match export_page(config, source, fetcher, page_ref).await {
            Ok(exported) => report.exported.push(exported),
            Err(e) => {
                error!(page = %page_ref, error = %e, "[EXPORT][ERROR] Page export failed");
                report.failed.push(FailedPage {
                    page: page_ref.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    info!(
        exported = report.exported.len(),
        failed = report.failed.len(),
        "[EXPORT] Export finished"
    );
    report
}
