//! Block tree to markup.
//!
//! The renderer walks one sibling list at a time, depth first. Each list gets
//! its own [`RenderState`]: the ordered-list counter runs across contiguous
//! numbered items and restarts after anything else, and children are indented
//! exactly one unit deeper than their parent. Children are fetched from the
//! [`ContentSource`] only once their parent has been rendered.

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, error, warn};

use crate::assets::AssetStore;
use crate::contract::ContentSource;
use crate::directive::{escape_attribute, parse_caption, Directives};
use crate::error::RenderError;
use crate::model::{AnnotatedRun, Block, BlockKind, ImageBlock, ImageSource, RichTextEntry};
use crate::style::{apply_styles, join_rich_text};

pub const INDENT_UNIT: &str = "\t";
pub const DIVIDER: &str = "---";
pub const CAPTION_STYLE: &str = "font-size:9px";

/// Rendered output of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Line(String),
    /// One block that expands to several blank-line separated parts, such as
    /// an image followed by its captions.
    Lines(Vec<String>),
}

impl Fragment {
    pub fn lines(&self) -> &[String] {
        match self {
            Fragment::Line(line) => std::slice::from_ref(line),
            Fragment::Lines(lines) => lines,
        }
    }
}

/// Per-sibling-list state, threaded explicitly through the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderState {
    /// Number the next numbered list item gets.
    pub counter: usize,
    pub indent: String,
}

impl RenderState {
    pub fn new(indent: impl Into<String>) -> Self {
        Self {
            counter: 1,
            indent: indent.into(),
        }
    }

    pub fn root() -> Self {
        Self::new("")
    }

    /// State for the sibling after `kind`.
    pub fn advance(self, kind: &BlockKind) -> Self {
        let counter = match kind {
            BlockKind::NumberedListItem(_) => self.counter + 1,
            _ => 1,
        };
        Self { counter, ..self }
    }

    /// Fresh state for a child list, one indent unit deeper.
    pub fn child(&self) -> Self {
        Self::new(format!("{}{INDENT_UNIT}", self.indent))
    }
}

pub struct BlockRenderer<'a> {
    source: &'a dyn ContentSource,
    assets: AssetStore<'a>,
    max_depth: usize,
}

impl<'a> BlockRenderer<'a> {
    pub fn new(source: &'a dyn ContentSource, assets: AssetStore<'a>, max_depth: usize) -> Self {
        Self {
            source,
            assets,
            max_depth,
        }
    }

    pub fn assets(&self) -> &AssetStore<'a> {
        &self.assets
    }

    /// Renders the whole block tree under a page.
    pub async fn render_page(&mut self, page_id: &str) -> Result<Vec<Fragment>, RenderError> {
        let blocks = self.children_of(page_id).await?;
        self.render_siblings(blocks, RenderState::root(), 0).await
    }

    /// Renders one sibling list and, recursively, everything below it.
    pub fn render_siblings<'s>(
        &'s mut self,
        blocks: Vec<Block>,
        mut state: RenderState,
        depth: usize,
    ) -> BoxFuture<'s, Result<Vec<Fragment>, RenderError>> {
        async move {
            let mut fragments = Vec::new();
            for block in &blocks {
                if let Some(fragment) = self.render_block(block, &state).await? {
                    fragments.push(fragment);
                }

                if block.has_children {
                    if depth + 1 > self.max_depth {
                        error!(block_id = %block.id, limit = self.max_depth, "Block tree is nested too deeply");
                        return Err(RenderError::DepthExceeded {
                            block_id: block.id.clone(),
                            limit: self.max_depth,
                        });
                    }
                    let children = self.children_of(&block.id).await?;
                    let nested = self
                        .render_siblings(children, state.child(), depth + 1)
                        .await?;
                    fragments.extend(nested);
                }

                state = state.advance(&block.kind);
            }
            Ok(fragments)
        }
        .boxed()
    }

    async fn children_of(&self, block_id: &str) -> Result<Vec<Block>, RenderError> {
        let children = self
            .source
            .list_block_children(block_id)
            .await
            .map_err(|source| RenderError::Children {
                block_id: block_id.to_string(),
                source,
            })?;
        debug!(block_id, count = children.len(), "Fetched block children");
        Ok(children)
    }

    async fn render_block(
        &mut self,
        block: &Block,
        state: &RenderState,
    ) -> Result<Option<Fragment>, RenderError> {
        let indent = state.indent.as_str();
        let line = match &block.kind {
            BlockKind::Paragraph(text) => {
                format!("{indent}{}", join_rich_text(&text.rich_text, "paragraph"))
            }
            BlockKind::BulletedListItem(text) => {
                format!("{indent}- {}", join_rich_text(&text.rich_text, "bulleted_list_item"))
            }
            BlockKind::NumberedListItem(text) => format!(
                "{indent}{}. {}",
                state.counter,
                join_rich_text(&text.rich_text, "numbered_list_item")
            ),
            BlockKind::Heading { level, text } => heading_line(*level, &text.rich_text),
            BlockKind::Quote(text) => quote_lines(&text.rich_text),
            BlockKind::Divider => format!("{indent}{DIVIDER}"),
            BlockKind::Embed(embed) => format!("{indent}{}", script_tag(&embed.url)),
            BlockKind::Image(image) => return self.render_image(image).await.map(Some),
            BlockKind::Code(code) => {
                warn!(block_id = %block.id, language = ?code.language, "Code blocks are not implemented yet, skipping");
                return Ok(None);
            }
            BlockKind::Unsupported { tag, payload } => {
                error!(block_id = %block.id, tag = %tag, payload = %payload, "Unsupported block type");
                return Err(RenderError::UnsupportedBlockType {
                    block_id: block.id.clone(),
                    tag: tag.clone(),
                    payload: payload.clone(),
                });
            }
        };
        debug!(block_id = %block.id, tag = %block.kind.tag(), "Rendered block");
        Ok(Some(Fragment::Line(line)))
    }

    async fn render_image(&mut self, image: &ImageBlock) -> Result<Fragment, RenderError> {
        let mut directives = None;
        let mut captions = Vec::new();
        for entry in &image.caption {
            match entry {
                RichTextEntry::Run(run) => {
                    let parsed = parse_caption(run.content());
                    // Only the first usable caption carries layout directives.
                    if captions.is_empty() {
                        directives = parsed.directives;
                    }
                    captions.push(caption_shortcode(&parsed.display, run));
                }
                RichTextEntry::Malformed(raw) => {
                    warn!(field = "caption", entry = %raw, "Skipping malformed rich-text entry");
                }
            }
        }

        let src = match &image.source {
            ImageSource::Hosted { url } => self.assets.persist(url).await?,
            ImageSource::External { url } => url.clone(),
        };

        let mut lines = vec![figure_shortcode(&src, directives.as_ref())];
        lines.extend(captions);
        Ok(Fragment::Lines(lines))
    }
}

pub fn heading_line(level: u8, entries: &[RichTextEntry]) -> String {
    format!(
        "{} {}",
        "#".repeat(usize::from(level)),
        join_rich_text(entries, "heading")
    )
}

/// One `>` line per run.
pub fn quote_lines(entries: &[RichTextEntry]) -> String {
    entries
        .iter()
        .filter_map(|entry| match entry {
            RichTextEntry::Run(run) => Some(format!(">{}", apply_styles(run.content(), &run.annotations))),
            RichTextEntry::Malformed(raw) => {
                warn!(field = "quote", entry = %raw, "Skipping malformed rich-text entry");
                None
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn script_tag(url: &str) -> String {
    format!(r#"<script src="{url}"></script>"#)
}

/// Wraps inline HTML in a Hugo shortcode delimiter pair.
pub fn shortcode(html: &str) -> String {
    format!("{{{{{html}}}}}")
}

pub fn figure_shortcode(src: &str, directives: Option<&Directives>) -> String {
    let attributes = directives
        .filter(|directives| !directives.is_empty())
        .map(|directives| format!(" {}", directives.to_attributes()))
        .unwrap_or_default();
    shortcode(&format!(
        r#"<figure src="{}"{attributes}>"#,
        escape_attribute(src)
    ))
}

/// Small caption text, rendered as a link when the run carries one.
pub fn caption_shortcode(display: &str, run: &AnnotatedRun) -> String {
    let display = escape_attribute(display);
    let attributes = match run.link_url() {
        Some(url) => format!(
            r#"link_text="{display}" link_src="{}""#,
            escape_attribute(url)
        ),
        None => format!(r#"text="{display}""#),
    };
    shortcode(&format!(r#"<text style="{CAPTION_STYLE}" {attributes}>"#))
}
