use crate::instance::EntryKey;
use crate::paths::Context;
use crate::renderer::traits::*;
use crate::style::{LineStyle, Shape};

const BAD_CHARS: &[char] = &['@', '[', ']', '>', '<', '{', '}', '|', '\\', '^', '~', '`', '*'];

/// Strips characters that break Mermaid node syntax.
pub fn escape(s: &str) -> String {
    s.chars().filter(|c| !BAD_CHARS.contains(c)).collect()
}

fn brackets(shape: Shape) -> (&'static str, &'static str) {
    match shape {
        Shape::RoundedSquare => ("(", ")"),
        Shape::Square => ("[", "]"),
        Shape::Diamond => ("{", "}"),
        Shape::Circle => ("((", "))"),
    }
}

#[derive(Debug, Default)]
pub struct MermaidWriter {
    out: String,
}

impl MermaidWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn line(&mut self, text: &str) {
        self.out.push_str(&format!("    {}\n", text));
    }

    pub fn entity(&mut self, id: &str, text: &str, shape: Shape, right_side_shape: Option<Shape>) {
        let (left, _) = brackets(shape);
        let (_, right) = brackets(right_side_shape.unwrap_or(shape));
        self.line(&format!("{}{}{}{}", id, left, text, right));
    }

    pub fn edge(&mut self, id: &str, rel: Option<&str>, obj: &str, style: LineStyle) {
        let line = match style {
            LineStyle::Dashed | LineStyle::Dotted => "-.-",
            LineStyle::Double => "==",
            LineStyle::Solid => "--",
        };
        let arrow = match rel {
            Some(rel) => format!("{} {} {}>", line, rel, line),
            None => format!("{}>", line),
        };
        self.line(&format!("{} {} {}", id, arrow, obj));
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[derive(Debug)]
struct NodeFrame {
    id: String,
    class_name: String,
    attributes: Vec<(String, String)>,
    field: Option<String>,
    /// Text collected for the open field from atoms and references.
    value: Option<String>,
}

#[derive(Debug)]
enum Frame {
    Node(NodeFrame),
    /// Hub node standing for a collection of objects.
    Diamond(String),
    /// A collection of atoms; its values accumulate on the enclosing node.
    Values,
}

/// Emits a `graph TB` flowchart: objects are nodes, object-valued slots are
/// edges, everything else becomes node attributes.
#[derive(Debug, Default)]
pub struct MermaidEmitter {
    writer: MermaidWriter,
    frames: Vec<Frame>,
    anonymous: usize,
}

impl MermaidEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn anonymous_id(&mut self, class_name: &str) -> String {
        self.anonymous += 1;
        format!("ANON__{}_{}", escape(class_name), self.anonymous)
    }

    fn node_mut(&mut self) -> Option<&mut NodeFrame> {
        self.frames.iter_mut().rev().find_map(|f| match f {
            Frame::Node(node) => Some(node),
            _ => None,
        })
    }

    /// Links a newly drawn node or diamond to whatever encloses it.
    fn link_to_parent(&mut self, child: &str) {
        match self.frames.last() {
            Some(Frame::Node(parent)) => {
                let rel = parent.field.clone();
                let parent = parent.id.clone();
                self.writer
                    .edge(&parent, rel.as_deref(), child, LineStyle::Solid);
            }
            Some(Frame::Diamond(hub)) => {
                let hub = hub.clone();
                self.writer.edge(&hub, None, child, LineStyle::Dashed);
            }
            _ => {}
        }
    }

    fn push_value(&mut self, text: &str) {
        if let Some(node) = self.node_mut() {
            match &mut node.value {
                Some(value) => {
                    value.push_str(", ");
                    value.push_str(text);
                }
                None => node.value = Some(text.to_string()),
            }
        }
    }
}

impl Emitter for MermaidEmitter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Mermaid
    }

    /// Every collection is drawn the same way.
    fn collection_layout(&self, _requested: Layout) -> Layout {
        Layout::SimpleList
    }

    fn object_layout(&self, _ctx: &Context<'_>, _requested: ObjectLayout) -> ObjectLayout {
        ObjectLayout::Fields
    }

    fn begin_document(&mut self, _doc: &DocumentInfo) {
        self.writer.header("graph TB");
    }

    fn end_document(&mut self) {}

    fn begin_object(&mut self, _ctx: &Context<'_>, object: &ObjectInfo) {
        let id = match &object.identifier {
            Some(identifier) => escape(identifier).replace(' ', "_"),
            None => self.anonymous_id(&object.class_name),
        };
        self.frames.push(Frame::Node(NodeFrame {
            id,
            class_name: object.class_name.clone(),
            attributes: Vec::new(),
            field: None,
            value: None,
        }));
    }

    fn end_object(&mut self, _ctx: &Context<'_>) {
        let Some(Frame::Node(node)) = self.frames.pop() else {
            return;
        };
        let mut text = node.class_name.clone();
        for (name, value) in &node.attributes {
            text.push_str(&format!("<br><b>{}</b> {}", name, escape(value)));
        }
        self.writer
            .entity(&node.id, &text, Shape::RoundedSquare, None);
        self.link_to_parent(&node.id);
    }

    fn begin_field(&mut self, _ctx: &Context<'_>, field: &FieldInfo) {
        if let Some(Frame::Node(node)) = self.frames.last_mut() {
            node.field = Some(field.name.clone());
            node.value = None;
        }
    }

    fn end_field(&mut self, _ctx: &Context<'_>, _field: &FieldInfo) {
        if let Some(Frame::Node(node)) = self.frames.last_mut() {
            if let (Some(name), Some(value)) = (node.field.take(), node.value.take()) {
                node.attributes.push((name, value));
            }
        }
    }

    fn begin_table(&mut self, _ctx: &Context<'_>, _columns: &[FieldInfo]) {}
    fn begin_row(&mut self) {}
    fn begin_cell(&mut self) {}
    fn end_cell(&mut self) {}
    fn end_row(&mut self) {}
    fn end_table(&mut self) {}

    fn begin_list(&mut self, _ctx: &Context<'_>, info: &CollectionInfo) {
        if !info.objects {
            self.frames.push(Frame::Values);
            return;
        }
        let hub = self.anonymous_id(&info.element_type);
        self.writer.entity(&hub, " ", Shape::Diamond, None);
        self.link_to_parent(&hub);
        self.frames.push(Frame::Diamond(hub));
    }

    fn begin_item(&mut self) {}
    fn end_item(&mut self) {}

    fn end_list(&mut self) {
        self.frames.pop();
    }

    fn begin_description_list(&mut self, _ctx: &Context<'_>, _info: &CollectionInfo, _keys: &[EntryKey]) {}
    fn begin_entry(&mut self, _info: &CollectionInfo, _key: &EntryKey) {}
    fn end_entry(&mut self) {}
    fn end_description_list(&mut self) {}

    fn begin_tuples(&mut self, _ctx: &Context<'_>, _info: &CollectionInfo) {}
    fn tuple_separator(&mut self) {}
    fn end_tuples(&mut self) {}
    fn begin_tuple(&mut self, _ctx: &Context<'_>) {}
    fn tuple_value_separator(&mut self) {}
    fn end_tuple(&mut self) {}

    fn atom(&mut self, _ctx: &Context<'_>, text: &str, _url: Option<&str>) {
        self.push_value(text);
    }

    fn reference(&mut self, _ctx: &Context<'_>, id: &str, _href: &str) {
        self.push_value(id);
    }

    fn truncated(&mut self, _ctx: &Context<'_>) {
        self.push_value("TRUNCATED");
    }

    fn finish(self) -> String {
        self.writer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_strips_syntax() {
        assert_eq!(escape("a<b>{c}|d"), "abcd");
        assert_eq!(escape("P:001"), "P:001");
    }

    #[test]
    fn test_writer_shapes_and_edges() {
        let mut w = MermaidWriter::new();
        w.header("graph TB");
        w.entity("a", "A", Shape::RoundedSquare, None);
        w.entity("hub", " ", Shape::Diamond, None);
        w.edge("a", Some("has"), "hub", LineStyle::Solid);
        w.edge("hub", None, "b", LineStyle::Dashed);
        assert_eq!(
            w.finish(),
            "graph TB\n    a(A)\n    hub{ }\n    a -- has --> hub\n    hub -.-> b\n"
        );
    }
}
