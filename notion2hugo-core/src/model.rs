//! Typed view of the content API's JSON.
//!
//! Blocks arrive as `{"id", "type": "<tag>", "has_children", "<tag>": {payload}}`.
//! The payload is looked up under its own tag and parsed into the matching
//! [`BlockKind`] variant when the block is deserialized, so a payload can never
//! disagree with its tag later on. Unknown tags are kept as
//! [`BlockKind::Unsupported`] and rejected by the renderer.
//!
//! Rich-text entries are parsed leniently: anything that is not a text run
//! (mentions, equations, truncated entries) becomes [`RichTextEntry::Malformed`]
//! and is skipped, with a warning, when the field is joined.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

pub const DEFAULT_COLOR: &str = "default";

/// One run of text with its style flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnnotatedRun {
    pub text: TextContent,
    pub annotations: Annotations,
    #[serde(default)]
    pub href: Option<String>,
}

impl AnnotatedRun {
    /// Unstyled run, mostly useful for building fixtures.
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            text: TextContent {
                content: content.into(),
                link: None,
            },
            annotations: Annotations::default(),
            href: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.text.content
    }

    /// Link target of the run: the text link if set, otherwise the run href.
    pub fn link_url(&self) -> Option<&str> {
        self.text
            .link
            .as_ref()
            .map(|link| link.url.as_str())
            .or(self.href.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextContent {
    pub content: String,
    #[serde(default)]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Link {
    pub url: String,
}

/// Style flags of a run. Keys the markup cannot express are collected in
/// `unrecognised` so the composer can report them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(flatten)]
    pub unrecognised: BTreeMap<String, Value>,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strikethrough: false,
            underline: false,
            code: false,
            color: default_color(),
            unrecognised: BTreeMap::new(),
        }
    }
}

/// An entry of a rich-text array as delivered by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RichTextEntry {
    Run(AnnotatedRun),
    Malformed(Value),
}

impl From<AnnotatedRun> for RichTextEntry {
    fn from(run: AnnotatedRun) -> Self {
        RichTextEntry::Run(run)
    }
}

/// Concatenated raw content of the well-formed runs, without any styling.
pub fn plain_text(entries: &[RichTextEntry]) -> String {
    entries
        .iter()
        .filter_map(|entry| match entry {
            RichTextEntry::Run(run) => Some(run.content()),
            RichTextEntry::Malformed(_) => None,
        })
        .collect()
}

/// Payload shared by every block type that only carries text.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TextBlock {
    // Older API versions name the field `text`.
    #[serde(default, alias = "text")]
    pub rich_text: Vec<RichTextEntry>,
}

impl TextBlock {
    pub fn new(runs: impl IntoIterator<Item = AnnotatedRun>) -> Self {
        Self {
            rich_text: runs.into_iter().map(RichTextEntry::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbedBlock {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CodeBlock {
    #[serde(default)]
    pub language: Option<String>,
}

/// Where an image's binary lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Hosted by the content API behind an expiring URL; must be downloaded.
    Hosted { url: String },
    /// A durable external URL that can be referenced as is.
    External { url: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawImage")]
pub struct ImageBlock {
    pub caption: Vec<RichTextEntry>,
    pub source: ImageSource,
}

#[derive(Deserialize)]
struct RawImage {
    #[serde(default)]
    caption: Vec<RichTextEntry>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    file: Option<FileUrl>,
    #[serde(default)]
    external: Option<FileUrl>,
}

#[derive(Deserialize)]
struct FileUrl {
    url: String,
}

impl TryFrom<RawImage> for ImageBlock {
    type Error = String;

    fn try_from(raw: RawImage) -> Result<Self, Self::Error> {
        let source = match (raw.kind.as_str(), raw.file, raw.external) {
            ("file", Some(file), _) => ImageSource::Hosted { url: file.url },
            ("external", _, Some(external)) => ImageSource::External { url: external.url },
            (kind, _, _) => return Err(format!("image of type `{kind}` has no matching url")),
        };
        Ok(ImageBlock {
            caption: raw.caption,
            source,
        })
    }
}

/// Closed set of block types the renderer knows, each with its own payload.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph(TextBlock),
    BulletedListItem(TextBlock),
    NumberedListItem(TextBlock),
    Heading { level: u8, text: TextBlock },
    Quote(TextBlock),
    Divider,
    Embed(EmbedBlock),
    Image(ImageBlock),
    Code(CodeBlock),
    Unsupported { tag: String, payload: Value },
}

impl BlockKind {
    /// Builds the variant for `tag` from the payload stored under that tag.
    pub fn from_tagged(tag: &str, payload: Value) -> Result<Self, serde_json::Error> {
        let kind = match tag {
            "paragraph" => BlockKind::Paragraph(serde_json::from_value(payload)?),
            "bulleted_list_item" => BlockKind::BulletedListItem(serde_json::from_value(payload)?),
            "numbered_list_item" => BlockKind::NumberedListItem(serde_json::from_value(payload)?),
            "quote" => BlockKind::Quote(serde_json::from_value(payload)?),
            "divider" => BlockKind::Divider,
            "embed" => BlockKind::Embed(serde_json::from_value(payload)?),
            "image" => BlockKind::Image(serde_json::from_value(payload)?),
            "code" => BlockKind::Code(serde_json::from_value(payload)?),
            other => match heading_level(other) {
                Some(level) => BlockKind::Heading {
                    level,
                    text: serde_json::from_value(payload)?,
                },
                None => BlockKind::Unsupported {
                    tag: other.to_string(),
                    payload,
                },
            },
        };
        Ok(kind)
    }

    /// The API tag this kind was built from.
    pub fn tag(&self) -> String {
        match self {
            BlockKind::Paragraph(_) => "paragraph".into(),
            BlockKind::BulletedListItem(_) => "bulleted_list_item".into(),
            BlockKind::NumberedListItem(_) => "numbered_list_item".into(),
            BlockKind::Heading { level, .. } => format!("heading_{level}"),
            BlockKind::Quote(_) => "quote".into(),
            BlockKind::Divider => "divider".into(),
            BlockKind::Embed(_) => "embed".into(),
            BlockKind::Image(_) => "image".into(),
            BlockKind::Code(_) => "code".into(),
            BlockKind::Unsupported { tag, .. } => tag.clone(),
        }
    }
}

/// `heading_N` with N in 1..=6.
fn heading_level(tag: &str) -> Option<u8> {
    tag.strip_prefix("heading_")?
        .parse::<u8>()
        .ok()
        .filter(|level| (1..=6).contains(level))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawBlock")]
pub struct Block {
    pub id: String,
    pub has_children: bool,
    pub kind: BlockKind,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            has_children: false,
            kind,
        }
    }

    pub fn with_children(mut self) -> Self {
        self.has_children = true;
        self
    }
}

#[derive(Deserialize)]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    has_children: bool,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl TryFrom<RawBlock> for Block {
    type Error = String;

    fn try_from(mut raw: RawBlock) -> Result<Self, Self::Error> {
        let payload = raw.fields.remove(raw.tag.as_str()).unwrap_or(Value::Null);
        let kind = BlockKind::from_tagged(&raw.tag, payload)
            .map_err(|e| format!("block {} has an invalid `{}` payload: {e}", raw.id, raw.tag))?;
        Ok(Block {
            id: raw.id,
            has_children: raw.has_children,
            kind,
        })
    }
}

/// A page as returned by page retrieval: its identity and metadata properties.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

/// A typed metadata property. Payloads that do not match their declared kind
/// fall back to [`PropertyValue::Other`] instead of failing the page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawProperty")]
pub enum PropertyValue {
    /// The title column (`title` in the API).
    PlainText(Vec<RichTextEntry>),
    RichText(Vec<RichTextEntry>),
    SingleSelect(String),
    /// Start of a date or date range, as sent.
    Date(String),
    MultiSelect(Vec<String>),
    Other(Value),
}

impl PropertyValue {
    /// Unstyled text value, if the kind has one.
    pub fn plain_text(&self) -> Option<String> {
        match self {
            PropertyValue::PlainText(entries) | PropertyValue::RichText(entries) => {
                Some(plain_text(entries))
            }
            PropertyValue::SingleSelect(name) => Some(name.clone()),
            PropertyValue::Date(start) => Some(start.clone()),
            PropertyValue::MultiSelect(_) => None,
            PropertyValue::Other(Value::String(s)) => Some(s.clone()),
            PropertyValue::Other(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct RawProperty {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct SelectOption {
    name: String,
}

#[derive(Deserialize)]
struct DateValue {
    start: String,
}

impl From<RawProperty> for PropertyValue {
    fn from(mut raw: RawProperty) -> Self {
        let payload = raw.fields.remove(raw.kind.as_str()).unwrap_or(Value::Null);
        let typed = match raw.kind.as_str() {
            "title" => serde_json::from_value(payload.clone()).map(PropertyValue::PlainText),
            "rich_text" => serde_json::from_value(payload.clone()).map(PropertyValue::RichText),
            "select" | "status" => serde_json::from_value::<SelectOption>(payload.clone())
                .map(|option| PropertyValue::SingleSelect(option.name)),
            "date" => serde_json::from_value::<DateValue>(payload.clone())
                .map(|date| PropertyValue::Date(date.start)),
            "multi_select" => serde_json::from_value::<Vec<SelectOption>>(payload.clone())
                .map(|options| {
                    PropertyValue::MultiSelect(options.into_iter().map(|o| o.name).collect())
                }),
            _ => return PropertyValue::Other(payload),
        };
        match typed {
            Ok(value) => value,
            Err(e) => {
                warn!(kind = %raw.kind, error = %e, "Property payload does not match its kind, keeping raw value");
                PropertyValue::Other(payload)
            }
        }
    }
}
