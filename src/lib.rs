//! Schema-driven rendering of structured data.
//!
//! An instance (a tree of objects, collections and scalars) is walked
//! against a LinkML-style schema and written out as an HTML page, a Markdown
//! document or a Mermaid graph. Layout choices such as tables, lists or
//! tuples come from the schema and from an optional style configuration.

pub mod error;
pub mod instance;
pub mod paths;
pub mod renderer;
pub mod schema;
pub mod style;

pub use error::{RenderError, Result};
pub use instance::{InstanceView, TYPE_TAG};
pub use renderer::{OutputFormat, Renderer};
pub use schema::{SchemaDefinition, SchemaIndex, SchemaView};
pub use style::{Configuration, RenderElementType, RenderRule, StyleEngine};

#[cfg(test)]
mod tests;
