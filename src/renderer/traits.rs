use crate::error::RenderError;
use crate::instance::EntryKey;
use crate::paths::{Context, TargetMarker};
use crate::style::RenderElementType;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Output format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "HTML", alias = "html")]
    Html,
    #[serde(rename = "MARKDOWN", alias = "markdown")]
    Markdown,
    #[serde(rename = "MERMAID", alias = "mermaid")]
    Mermaid,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Mermaid => "mermaid",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "mermaid" | "mmd" => Ok(OutputFormat::Mermaid),
            other => Err(RenderError::Configuration(format!(
                "unknown output format {}",
                other
            ))),
        }
    }
}

/// Shape used for a multivalued slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Table,
    SimpleList,
    DescriptionList,
    Tuple,
}

impl TryFrom<RenderElementType> for Layout {
    type Error = RenderError;

    fn try_from(value: RenderElementType) -> Result<Self, Self::Error> {
        match value {
            RenderElementType::Table => Ok(Layout::Table),
            RenderElementType::SimpleList => Ok(Layout::SimpleList),
            RenderElementType::DescriptionList => Ok(Layout::DescriptionList),
            RenderElementType::Tuple => Ok(Layout::Tuple),
            other => Err(RenderError::Configuration(format!(
                "unknown render_as {}",
                other
            ))),
        }
    }
}

/// Shape used for a single object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectLayout {
    Fields,
    Tuple,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub class_name: String,
    pub title: Option<String>,
    /// Mermaid source of the whole instance, when diagrams are requested.
    pub diagram: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub class_name: String,
    /// Value of the class's identifier slot.
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// One labelled slot of an object's field block, or one table column.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub label: String,
    /// Expanded URI the slot maps to.
    pub uri: String,
    pub description: Option<String>,
    /// The value is an embedded object (or collection of them).
    pub nested: bool,
    /// Target depth of the object owning the field.
    pub depth: usize,
}

#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub slot_name: String,
    /// Range of the slot, i.e. the type of every element.
    pub element_type: String,
    /// Elements are embedded objects.
    pub objects: bool,
    pub len: usize,
}

/// Format-specific emission, driven by the shared traversal.
///
/// The traversal decides what to render and in which order; an emitter only
/// decides how each construct looks. Methods come in begin/end pairs that
/// bracket the recursive rendering of their content.
pub trait Emitter {
    fn format(&self) -> OutputFormat;

    /// Maps a requested collection layout to one this format can express.
    fn collection_layout(&self, requested: Layout) -> Layout {
        requested
    }

    fn object_layout(&self, _ctx: &Context<'_>, requested: ObjectLayout) -> ObjectLayout {
        requested
    }

    /// Marker opened while a field's value is rendered.
    fn field_marker(&self, _field: &FieldInfo) -> Option<TargetMarker> {
        None
    }

    /// Whether the document should carry a diagram when one is configured.
    fn embeds_diagram(&self) -> bool {
        false
    }

    fn begin_document(&mut self, doc: &DocumentInfo);
    fn end_document(&mut self);

    fn begin_object(&mut self, ctx: &Context<'_>, object: &ObjectInfo);
    fn end_object(&mut self, ctx: &Context<'_>);
    fn begin_field(&mut self, ctx: &Context<'_>, field: &FieldInfo);
    fn end_field(&mut self, ctx: &Context<'_>, field: &FieldInfo);

    fn begin_table(&mut self, ctx: &Context<'_>, columns: &[FieldInfo]);
    fn begin_row(&mut self);
    fn begin_cell(&mut self);
    fn end_cell(&mut self);
    fn end_row(&mut self);
    fn end_table(&mut self);

    fn begin_list(&mut self, ctx: &Context<'_>, info: &CollectionInfo);
    fn begin_item(&mut self);
    fn end_item(&mut self);
    fn end_list(&mut self);

    fn begin_description_list(&mut self, ctx: &Context<'_>, info: &CollectionInfo, keys: &[EntryKey]);
    fn begin_entry(&mut self, info: &CollectionInfo, key: &EntryKey);
    fn end_entry(&mut self);
    fn end_description_list(&mut self);

    fn begin_tuples(&mut self, ctx: &Context<'_>, info: &CollectionInfo);
    fn tuple_separator(&mut self);
    fn end_tuples(&mut self);
    fn begin_tuple(&mut self, ctx: &Context<'_>);
    fn tuple_value_separator(&mut self);
    fn end_tuple(&mut self);

    fn atom(&mut self, ctx: &Context<'_>, text: &str, url: Option<&str>);
    fn reference(&mut self, ctx: &Context<'_>, id: &str, href: &str);

    /// Placeholder for content deliberately left out (nested tables, cycles).
    fn truncated(&mut self, ctx: &Context<'_>);

    fn finish(self) -> String
    where
        Self: Sized;
}
