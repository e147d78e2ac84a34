//! Layout directives embedded in image captions.
//!
//! A caption may start with `key1=val1;key2=val2` followed by
//! [`DIRECTIVE_DELIMITER`]; the rest is the text shown to readers. The
//! directives of an image's first caption become attributes of its figure.

use tracing::warn;

pub const DIRECTIVE_DELIMITER: &str = "|**|";

/// Ordered `key=value` pairs; a repeated key keeps its first position and its
/// last value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Directives(Vec<(String, String)>);

impl Directives {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `key="value"` pairs joined by single spaces.
    pub fn to_attributes(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!(r#"{key}="{}""#, escape_attribute(value)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Makes text safe inside a double-quoted shortcode attribute.
pub fn escape_attribute(value: &str) -> String {
    value.replace('"', "&quot;")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCaption {
    pub directives: Option<Directives>,
    pub display: String,
}

/// Splits raw caption text into its directives and display text.
///
/// Without a delimiter the whole text is display text. With more than one
/// delimiter the shape is not supported: a warning is logged and the whole
/// text is kept as display text.
pub fn parse_caption(raw: &str) -> ParsedCaption {
    let parts: Vec<&str> = raw.split(DIRECTIVE_DELIMITER).collect();
    match parts.as_slice() {
        [display] => ParsedCaption {
            directives: None,
            display: display.to_string(),
        },
        [attributes, display] => ParsedCaption {
            directives: Some(parse_directives(attributes)),
            display: display.to_string(),
        },
        _ => {
            warn!(
                caption = raw,
                parts = parts.len(),
                "Unsupported caption directive shape, using caption as plain text"
            );
            ParsedCaption {
                directives: None,
                display: raw.to_string(),
            }
        }
    }
}

fn parse_directives(attributes: &str) -> Directives {
    let mut directives = Directives::default();
    for pair in attributes.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
        match pair.split_once('=') {
            Some((key, value)) => directives.insert(key.trim(), value.trim()),
            None => warn!(pair, "Caption directive without `=`, skipping"),
        }
    }
    directives
}
