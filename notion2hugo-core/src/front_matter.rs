//! Page metadata to Hugo front matter.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::FrontMatterError;
use crate::model::PropertyValue;
use crate::style::join_rich_text;

pub const FENCE: &str = "+++";

/// Maps one source property to one front-matter key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrontMatterField {
    pub property: String,
    pub key: String,
}

impl FrontMatterField {
    pub fn new(property: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            key: key.into(),
        }
    }

    /// The mapping used by the blog this tool was written for, in output order.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Draft", "draft"),
            Self::new("Date", "date"),
            Self::new("Name", "title"),
            Self::new("Slug", "slug"),
            Self::new("Tags", "tags"),
            Self::new("Series", "series"),
        ]
    }
}

/// Renders one property value the way it appears after `key = `.
pub fn stringify_property(value: &PropertyValue) -> String {
    match value {
        PropertyValue::PlainText(entries) | PropertyValue::RichText(entries) => {
            quote(&join_rich_text(entries, "property"))
        }
        PropertyValue::SingleSelect(name) => quote(name),
        PropertyValue::Date(start) => start.clone(),
        PropertyValue::MultiSelect(labels) => Value::from(labels.clone()).to_string(),
        PropertyValue::Other(Value::String(raw)) => raw.to_lowercase(),
        PropertyValue::Other(raw) => raw.to_string().to_lowercase(),
    }
}

fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// Ordered front-matter entries, already stringified.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrontMatter {
    entries: Vec<(String, String)>,
}

impl FrontMatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for FrontMatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{FENCE}")?;
        for (key, value) in &self.entries {
            writeln!(f, "{key} = {value}")?;
        }
        writeln!(f, "{FENCE}")
    }
}

/// Resolves every mapped property. A property missing from the page is fatal.
pub fn assemble_front_matter(
    properties: &HashMap<String, PropertyValue>,
    fields: &[FrontMatterField],
) -> Result<FrontMatter, FrontMatterError> {
    let entries = fields
        .iter()
        .map(|field| {
            let value = properties.get(&field.property).ok_or_else(|| {
                FrontMatterError::MissingMetadataProperty {
                    property: field.property.clone(),
                }
            })?;
            let rendered = stringify_property(value);
            debug!(property = %field.property, key = %field.key, value = %rendered, "Resolved front matter entry");
            Ok((field.key.clone(), rendered))
        })
        .collect::<Result<Vec<_>, FrontMatterError>>()?;
    Ok(FrontMatter { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnnotatedRun, RichTextEntry};
    use serde_json::json;

    fn text(content: &str) -> Vec<RichTextEntry> {
        vec![AnnotatedRun::plain(content).into()]
    }

    fn blog_properties() -> HashMap<String, PropertyValue> {
        HashMap::from([
            ("Name".to_string(), PropertyValue::PlainText(text("T"))),
            ("Slug".to_string(), PropertyValue::RichText(text("t"))),
            ("Tags".to_string(), PropertyValue::MultiSelect(vec![])),
            ("Series".to_string(), PropertyValue::MultiSelect(vec![])),
            ("Date".to_string(), PropertyValue::Date("2024-01-01".into())),
            ("Draft".to_string(), PropertyValue::Other(json!(false))),
        ])
    }

    #[test]
    fn multi_select_is_a_json_array() {
        let value = PropertyValue::MultiSelect(vec!["a".into(), "b".into()]);
        assert_eq!(stringify_property(&value), r#"["a","b"]"#);
    }

    #[test]
    fn kinds_are_quoted_or_bare() {
        assert_eq!(stringify_property(&PropertyValue::RichText(text("hi"))), r#""hi""#);
        assert_eq!(stringify_property(&PropertyValue::SingleSelect("Go".into())), r#""Go""#);
        assert_eq!(stringify_property(&PropertyValue::Date("2024-02-03".into())), "2024-02-03");
        assert_eq!(stringify_property(&PropertyValue::Other(json!(true))), "true");
        assert_eq!(stringify_property(&PropertyValue::Other(json!(42))), "42");
        assert_eq!(stringify_property(&PropertyValue::Other(json!("MiXed"))), "mixed");
    }

    #[test]
    fn titles_keep_inline_styles_and_escape_quotes() {
        let mut bold = AnnotatedRun::plain("Big");
        bold.annotations.bold = true;
        let value = PropertyValue::PlainText(vec![bold.into(), AnnotatedRun::plain(r#" "idea""#).into()]);
        assert_eq!(stringify_property(&value), r#""**Big** \"idea\"""#);
    }

    #[test]
    fn header_follows_mapping_order() {
        let front_matter = assemble_front_matter(&blog_properties(), &FrontMatterField::defaults()).unwrap();
        assert_eq!(
            front_matter.to_string(),
            "+++\ndraft = false\ndate = 2024-01-01\ntitle = \"T\"\nslug = \"t\"\ntags = []\nseries = []\n+++\n"
        );
        assert_eq!(front_matter.get("slug"), Some("\"t\""));
    }

    #[test]
    fn missing_property_is_fatal() {
        let mut properties = blog_properties();
        properties.remove("Slug");
        let err = assemble_front_matter(&properties, &FrontMatterField::defaults()).unwrap_err();
        assert!(matches!(
            err,
            FrontMatterError::MissingMetadataProperty { ref property } if property == "Slug"
        ));
    }
}
