use crate::error::{RenderError, Result};
use crate::renderer::OutputFormat;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum HtmlFramework {
    Bootstrap,
    Tailwind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shape {
    Square,
    RoundedSquare,
    Circle,
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
    Double,
}

/// The structural element a slot's value is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RenderElementType {
    #[serde(rename = "heading")]
    Heading,
    #[serde(rename = "h1")]
    H1,
    #[serde(rename = "h2")]
    H2,
    #[serde(rename = "h3")]
    H3,
    #[serde(rename = "description_list")]
    DescriptionList,
    #[serde(rename = "simple_list")]
    SimpleList,
    #[serde(rename = "table")]
    Table,
    #[serde(rename = "TUPLE", alias = "tuple")]
    Tuple,
    #[serde(rename = "NO_ELEMENT", alias = "no_element")]
    NoElement,
}

impl fmt::Display for RenderElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderElementType::Heading => "heading",
            RenderElementType::H1 => "h1",
            RenderElementType::H2 => "h2",
            RenderElementType::H3 => "h3",
            RenderElementType::DescriptionList => "description_list",
            RenderElementType::SimpleList => "simple_list",
            RenderElementType::Table => "table",
            RenderElementType::Tuple => "TUPLE",
            RenderElementType::NoElement => "NO_ELEMENT",
        };
        write!(f, "{}", name)
    }
}

/// A rule for rendering a particular element.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderRule {
    pub name: Option<String>,
    /// Slots the rule applies to, by name.
    pub applies_to_slots: Vec<String>,
    /// Slots the rule applies to, by the CURIE they map to.
    pub applies_to_curies: Vec<String>,
    /// Output formats the rule is limited to; empty means every format.
    pub applies_to_render_types: Vec<OutputFormat>,
    pub render_as: Option<RenderElementType>,
    /// Format string for atomic values; `{value}` (or `{}`) is replaced.
    pub fstring: Option<String>,
    /// Template string. Accepted for compatibility; not evaluated.
    pub template: Option<String>,
}

impl RenderRule {
    pub fn for_slot(slot_name: &str, render_as: RenderElementType) -> Self {
        Self {
            applies_to_slots: vec![slot_name.to_string()],
            render_as: Some(render_as),
            ..Default::default()
        }
    }

    pub fn applies_to_format(&self, format: OutputFormat) -> bool {
        self.applies_to_render_types.is_empty() || self.applies_to_render_types.contains(&format)
    }

    /// Applies the format string, if any, to an atomic value's text.
    /// `{value}` is the placeholder; a bare `{}` is used only when `{value}`
    /// is absent. The value itself is never rescanned.
    pub fn format_value(&self, value: &str) -> Option<String> {
        self.fstring.as_ref().map(|f| {
            let placeholder = if f.contains("{value}") { "{value}" } else { "{}" };
            f.split(placeholder).collect::<Vec<_>>().join(value)
        })
    }
}

/// A configuration for rendering instances of a schema.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    /// Target frameworks. HTML output currently assumes Bootstrap.
    pub frameworks: Vec<HtmlFramework>,
    pub rules: Vec<RenderRule>,
    /// Include a diagram at the top of the document (HTML only).
    pub include_diagrams: bool,
}

impl Configuration {
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|e| RenderError::Configuration(e.to_string()))
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| RenderError::Configuration(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_configuration() {
        let config = Configuration::from_yaml_str(
            r#"
include_diagrams: true
frameworks: [Bootstrap]
rules:
  - name: jobs
    applies_to_slots: [has_employment_history]
    render_as: TUPLE
  - applies_to_slots: [classes]
    applies_to_render_types: [MARKDOWN]
    render_as: description_list
"#,
        )
        .unwrap();
        assert!(config.include_diagrams);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].render_as, Some(RenderElementType::Tuple));
        assert!(config.rules[1].applies_to_format(OutputFormat::Markdown));
        assert!(!config.rules[1].applies_to_format(OutputFormat::Html));
    }

    #[test]
    fn test_unknown_layout_names_the_directive() {
        let err = Configuration::from_yaml_str(
            r#"
rules:
  - applies_to_slots: [x]
    render_as: carousel
"#,
        )
        .unwrap_err();
        match err {
            RenderError::Configuration(message) => assert!(message.contains("carousel")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_format_value() {
        let rule = RenderRule {
            fstring: Some("<{value}>".to_string()),
            ..Default::default()
        };
        assert_eq!(rule.format_value("x"), Some("<x>".to_string()));
        assert_eq!(rule.format_value("a{}b"), Some("<a{}b>".to_string()));
        let bare = RenderRule {
            fstring: Some("{} units".to_string()),
            ..Default::default()
        };
        assert_eq!(bare.format_value("{value}"), Some("{value} units".to_string()));
        assert_eq!(RenderRule::default().format_value("x"), None);
    }
}
