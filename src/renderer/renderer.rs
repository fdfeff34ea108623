use crate::error::Result;
use crate::instance::InstanceView;
use crate::renderer::html::HtmlEmitter;
use crate::renderer::markdown::MarkdownEmitter;
use crate::renderer::mermaid::MermaidEmitter;
use crate::renderer::traits::OutputFormat;
use crate::renderer::walker::Walker;
use crate::schema::SchemaView;
use crate::style::StyleEngine;
use tracing::info;

/// Renders instances to one output format under a fixed style.
///
/// A renderer holds no per-render state. Each call to [`Renderer::render`]
/// builds a fresh traversal, so one renderer can be reused and the same
/// inputs always produce the same text.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pub format: OutputFormat,
    pub style: StyleEngine,
}

impl Renderer {
    pub fn new(format: OutputFormat, style: StyleEngine) -> Self {
        Self { format, style }
    }

    pub fn render<V: InstanceView + ?Sized>(
        &self,
        instance: &V,
        schema: &dyn SchemaView,
        root: Option<&str>,
    ) -> Result<String> {
        info!("Rendering {} (root: {:?})", self.format, root);
        match self.format {
            OutputFormat::Html => {
                Walker::new(schema, &self.style, HtmlEmitter::new()).render(instance, root)
            }
            OutputFormat::Markdown => {
                Walker::new(schema, &self.style, MarkdownEmitter::new()).render(instance, root)
            }
            OutputFormat::Mermaid => {
                Walker::new(schema, &self.style, MermaidEmitter::new()).render(instance, root)
            }
        }
    }
}
