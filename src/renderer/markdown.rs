use crate::instance::EntryKey;
use crate::paths::{Context, TargetMarker};
use crate::renderer::traits::*;

/// Plain-text sink with a few Markdown helpers.
#[derive(Debug, Default)]
pub struct MarkdownWriter {
    out: String,
}

impl MarkdownWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Levels outside 1..=6 are clamped; GFM has no deeper headings.
    pub fn h(&mut self, level: usize, text: &str) {
        self.block(&format!("{} {}", "#".repeat(level.clamp(1, 6)), text));
    }

    pub fn h1(&mut self, text: &str) {
        self.h(1, text);
    }

    pub fn h3(&mut self, text: &str) {
        self.h(3, text);
    }

    pub fn w(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// A paragraph-level construct surrounded by blank lines.
    pub fn block(&mut self, text: &str) {
        self.out.push_str(&format!("\n{}\n\n", text));
    }

    pub fn link(&mut self, url: &str, text: &str) {
        self.out.push_str(&format!("[{}]({})", text, url));
    }

    pub fn table_header<S: AsRef<str>>(&mut self, cols: &[S]) {
        self.out.push('\n');
        self.table_row(cols);
        let rule = vec!["---"; cols.len()];
        self.table_row(rule.as_slice());
    }

    pub fn table_row<S: AsRef<str>>(&mut self, vals: &[S]) {
        let mut row = String::from("|");
        for v in vals {
            row.push_str(v.as_ref());
            row.push('|');
        }
        self.line(&row);
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Makes text safe to place in a single table cell.
pub fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace("\r\n", " ").replace('\n', " ")
}

fn inline(ctx: &Context<'_>) -> bool {
    ctx.in_target(TargetMarker::Table) || ctx.in_target(TargetMarker::Span)
}

#[derive(Debug)]
struct ObjectFrame {
    /// A `|Slot|Value|` table has been started and not interrupted.
    table_open: bool,
}

#[derive(Debug)]
struct ListFrame {
    inline: bool,
    items: usize,
}

/// Emits GitHub-flavored Markdown.
#[derive(Debug, Default)]
pub struct MarkdownEmitter {
    writer: MarkdownWriter,
    objects: Vec<ObjectFrame>,
    lists: Vec<ListFrame>,
    /// Open description lists; inline ones sit inside a table cell.
    entries: Vec<ListFrame>,
    tuples: Vec<bool>,
}

impl MarkdownEmitter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Emitter for MarkdownEmitter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }

    /// Pipe tables and bullets cannot hold a field block.
    fn object_layout(&self, ctx: &Context<'_>, requested: ObjectLayout) -> ObjectLayout {
        if ctx.in_target(TargetMarker::Table) || ctx.in_target(TargetMarker::ListItem) {
            ObjectLayout::Tuple
        } else {
            requested
        }
    }

    fn field_marker(&self, field: &FieldInfo) -> Option<TargetMarker> {
        if field.nested {
            Some(TargetMarker::DescriptionList)
        } else {
            Some(TargetMarker::Table)
        }
    }

    fn begin_document(&mut self, doc: &DocumentInfo) {
        if let Some(title) = &doc.title {
            self.writer.h1(title);
        }
    }

    fn end_document(&mut self) {}

    fn begin_object(&mut self, _ctx: &Context<'_>, _object: &ObjectInfo) {
        self.objects.push(ObjectFrame { table_open: false });
    }

    fn end_object(&mut self, _ctx: &Context<'_>) {
        self.objects.pop();
    }

    fn begin_field(&mut self, _ctx: &Context<'_>, field: &FieldInfo) {
        let Some(frame) = self.objects.last_mut() else {
            return;
        };
        if field.nested {
            frame.table_open = false;
            self.writer.h(field.depth + 1, &field.label);
            return;
        }
        if !frame.table_open {
            self.writer.table_header(&["Slot", "Value"]);
            frame.table_open = true;
        }
        self.writer.w("|");
        self.writer.w(&field.label);
        self.writer.link(&field.uri, "?");
        self.writer.w("|");
    }

    fn end_field(&mut self, _ctx: &Context<'_>, field: &FieldInfo) {
        if !field.nested {
            self.writer.w("|\n");
        }
    }

    fn begin_table(&mut self, _ctx: &Context<'_>, columns: &[FieldInfo]) {
        let labels: Vec<&str> = columns.iter().map(|c| c.label.as_str()).collect();
        self.writer.table_header(labels.as_slice());
    }

    fn begin_row(&mut self) {
        self.writer.w("|");
    }

    fn begin_cell(&mut self) {}

    fn end_cell(&mut self) {
        self.writer.w("|");
    }

    fn end_row(&mut self) {
        self.writer.w("\n");
    }

    fn end_table(&mut self) {
        self.writer.w("\n");
    }

    fn begin_list(&mut self, ctx: &Context<'_>, _info: &CollectionInfo) {
        let inline = inline(ctx);
        if !inline {
            self.writer.w("\n");
        }
        self.lists.push(ListFrame { inline, items: 0 });
    }

    fn begin_item(&mut self) {
        let Some(list) = self.lists.last_mut() else {
            return;
        };
        if !list.inline {
            self.writer.w("* ");
        } else if list.items > 0 {
            self.writer.w(", ");
        }
        list.items += 1;
    }

    fn end_item(&mut self) {
        if matches!(self.lists.last(), Some(list) if !list.inline) {
            self.writer.w("\n");
        }
    }

    fn end_list(&mut self) {
        if let Some(list) = self.lists.pop() {
            if !list.inline {
                self.writer.w("\n");
            }
        }
    }

    fn begin_description_list(&mut self, ctx: &Context<'_>, _info: &CollectionInfo, _keys: &[EntryKey]) {
        self.entries.push(ListFrame {
            inline: inline(ctx),
            items: 0,
        });
    }

    /// Headings cannot live in a table cell, so entries there become
    /// `key: value` pairs.
    fn begin_entry(&mut self, _info: &CollectionInfo, key: &EntryKey) {
        match self.entries.last_mut() {
            Some(frame) if frame.inline => {
                if frame.items > 0 {
                    self.writer.w(", ");
                }
                frame.items += 1;
                self.writer.w(&format!("{}: ", escape_cell(&key.to_string())));
            }
            _ => self.writer.h3(&key.to_string()),
        }
    }

    fn end_entry(&mut self) {}

    fn end_description_list(&mut self) {
        self.entries.pop();
    }

    fn begin_tuples(&mut self, ctx: &Context<'_>, _info: &CollectionInfo) {
        self.tuples.push(inline(ctx));
    }

    fn tuple_separator(&mut self) {
        self.writer.w(", ");
    }

    fn end_tuples(&mut self) {
        if self.tuples.pop() == Some(false) {
            self.writer.w("\n");
        }
    }

    fn begin_tuple(&mut self, _ctx: &Context<'_>) {}

    fn tuple_value_separator(&mut self) {
        self.writer.w(" ");
    }

    fn end_tuple(&mut self) {}

    fn atom(&mut self, _ctx: &Context<'_>, text: &str, url: Option<&str>) {
        let text = escape_cell(text);
        match url {
            Some(url) => self.writer.link(url, &text),
            None => self.writer.w(&text),
        }
    }

    fn reference(&mut self, _ctx: &Context<'_>, id: &str, href: &str) {
        self.writer.link(href, &escape_cell(id));
    }

    fn truncated(&mut self, _ctx: &Context<'_>) {
        self.writer.w("TRUNCATED");
    }

    fn finish(self) -> String {
        self.writer.finish()
    }
}
