//! Inline styling of rich-text runs.
//!
//! Markup styles are applied in a fixed order (bold, italic, code,
//! strikethrough) and an inline color span, when set, wraps the result of all
//! of them.

use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{Annotations, RichTextEntry, DEFAULT_COLOR};

/// A markup style that wraps text in a delimiter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineStyle {
    Bold,
    Italic,
    Code,
    Strikethrough,
}

impl InlineStyle {
    /// Application order, innermost first.
    pub const ORDER: [InlineStyle; 4] = [
        InlineStyle::Bold,
        InlineStyle::Italic,
        InlineStyle::Code,
        InlineStyle::Strikethrough,
    ];

    fn delimiter(self) -> &'static str {
        match self {
            InlineStyle::Bold => "**",
            InlineStyle::Italic => "*",
            InlineStyle::Code => "`",
            InlineStyle::Strikethrough => "~~",
        }
    }

    fn is_set(self, annotations: &Annotations) -> bool {
        match self {
            InlineStyle::Bold => annotations.bold,
            InlineStyle::Italic => annotations.italic,
            InlineStyle::Code => annotations.code,
            InlineStyle::Strikethrough => annotations.strikethrough,
        }
    }

    pub fn wrap(self, text: &str) -> String {
        let delimiter = self.delimiter();
        format!("{delimiter}{text}{delimiter}")
    }
}

/// Applies every style set in `annotations` to `content`.
pub fn apply_styles(content: &str, annotations: &Annotations) -> String {
    debug!(content, "Applying inline styles");

    let mut styled = InlineStyle::ORDER
        .iter()
        .filter(|style| style.is_set(annotations))
        .fold(content.to_string(), |text, style| style.wrap(&text));

    if annotations.underline {
        debug!(content, "underline is not supported in markdown, ignoring");
    }
    for (key, value) in &annotations.unrecognised {
        if is_active(value) {
            warn!(style = %key, value = %value, "Unsupported style, ignoring");
        }
    }

    let color = annotations.color.as_str();
    if !color.is_empty() && color != DEFAULT_COLOR {
        styled = format!(r#"<span style="color:{color}">{styled}</span>"#);
    }
    styled
}

fn is_active(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty() && s != DEFAULT_COLOR,
        _ => true,
    }
}

/// Joins the runs of one block field into a styled string.
///
/// Malformed entries are logged and contribute nothing; the remaining runs are
/// still joined.
pub fn join_rich_text(entries: &[RichTextEntry], field: &str) -> String {
    let mut joined = String::new();
    for entry in entries {
        match entry {
            RichTextEntry::Run(run) => joined.push_str(&apply_styles(run.content(), &run.annotations)),
            RichTextEntry::Malformed(raw) => {
                warn!(field, entry = %raw, "Skipping malformed rich-text entry");
            }
        }
    }
    joined
}
