pub mod components;
pub mod html;
pub mod markdown;
pub mod mermaid;
pub mod renderer;
pub mod traits;
pub mod walker;

pub use components::*;
pub use html::HtmlEmitter;
pub use markdown::MarkdownEmitter;
pub use mermaid::MermaidEmitter;
pub use renderer::*;
pub use traits::*;
pub use walker::Walker;
