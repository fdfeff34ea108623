use crate::instance::EntryKey;
use crate::paths::Context;
use crate::renderer::components::escape_html;
use crate::renderer::traits::*;

pub const BOOTSTRAP_VERSION: &str = "5.3.0-alpha1";
const MERMAID_SCRIPT: &str = "https://unpkg.com/mermaid@8.8.0/dist/mermaid.min.js";

/// Indenting HTML text sink. One tag or text run per line.
#[derive(Debug, Default)]
pub struct HtmlWriter {
    out: String,
    depth: usize,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn indent(&mut self) {
        self.out.push_str(&"  ".repeat(self.depth));
    }

    fn tag(name: &str, attrs: &[(&str, &str)]) -> String {
        let mut tag = format!("<{}", name);
        for (key, value) in attrs {
            tag.push_str(&format!(" {}=\"{}\"", key, escape_html(value)));
        }
        tag
    }

    pub fn open(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.indent();
        self.out.push_str(&Self::tag(name, attrs));
        self.out.push_str(">\n");
        self.depth += 1;
    }

    pub fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str(&format!("</{}>\n", name));
    }

    /// An element with no children, e.g. `<meta ... />`.
    pub fn void(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.indent();
        self.out.push_str(&Self::tag(name, attrs));
        self.out.push_str(" />\n");
    }

    /// An element whose only child is escaped text.
    pub fn element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) {
        self.indent();
        self.out.push_str(&Self::tag(name, attrs));
        self.out.push_str(&format!(">{}</{}>\n", escape_html(text), name));
    }

    pub fn text(&mut self, text: &str) {
        self.indent();
        self.out.push_str(&escape_html(text));
        self.out.push('\n');
    }

    /// Unescaped content, written line by line at the current indentation.
    pub fn raw(&mut self, content: &str) {
        for line in content.lines() {
            self.indent();
            self.out.push_str(line);
            self.out.push('\n');
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ListMode {
    Badges,
    Items,
}

/// Emits a Bootstrap-styled HTML page.
#[derive(Debug, Default)]
pub struct HtmlEmitter {
    writer: HtmlWriter,
    lists: Vec<ListMode>,
}

impl HtmlEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn anchor_id(element_type: &str, key: &str) -> String {
        format!("{}__{}", element_type, key)
    }
}

impl Emitter for HtmlEmitter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Html
    }

    fn embeds_diagram(&self) -> bool {
        true
    }

    fn begin_document(&mut self, doc: &DocumentInfo) {
        let w = &mut self.writer;
        let title = doc.title.as_deref().unwrap_or(&doc.class_name);
        let stylesheet = format!(
            "https://cdn.jsdelivr.net/npm/bootstrap@{}/dist/css/bootstrap.min.css",
            BOOTSTRAP_VERSION
        );
        let script = format!(
            "https://cdn.jsdelivr.net/npm/bootstrap@{}/dist/js/bootstrap.bundle.min.js",
            BOOTSTRAP_VERSION
        );

        w.raw("<!DOCTYPE html>");
        w.open("html", &[("lang", "en")]);
        w.open("head", &[]);
        w.void("meta", &[("charset", "utf-8")]);
        w.void(
            "meta",
            &[
                ("name", "viewport"),
                ("content", "width=device-width, initial-scale=1"),
            ],
        );
        w.void("link", &[("rel", "stylesheet"), ("href", stylesheet.as_str())]);
        w.element("title", &[], title);
        w.close("head");
        w.open("body", &[]);
        w.element("script", &[("src", script.as_str())], "");

        if let Some(diagram) = &doc.diagram {
            w.open("div", &[]);
            w.element("h3", &[], "Diagram");
            w.open("div", &[("class", "mermaid")]);
            w.raw(diagram);
            w.close("div");
            w.open("script", &[("src", MERMAID_SCRIPT)]);
            w.raw("mermaid.initialize({});");
            w.close("script");
            w.close("div");
        }
    }

    fn end_document(&mut self) {
        self.writer.close("body");
        self.writer.close("html");
    }

    fn begin_object(&mut self, _ctx: &Context<'_>, object: &ObjectInfo) {
        let w = &mut self.writer;
        w.open("div", &[]);
        if let Some(title) = &object.title {
            w.element("h2", &[], title);
        }
        if let Some(description) = &object.description {
            w.element("div", &[], description);
        }
        w.open("dl", &[("class", "row")]);
    }

    fn end_object(&mut self, _ctx: &Context<'_>) {
        self.writer.close("dl");
        self.writer.close("div");
    }

    fn begin_field(&mut self, _ctx: &Context<'_>, field: &FieldInfo) {
        let w = &mut self.writer;
        w.open("dt", &[("class", "col-sm-3")]);
        w.open("span", &[]);
        w.text(&field.label);
        w.open(
            "a",
            &[
                ("href", field.uri.as_str()),
                ("data-bs-toggle", "tooltip"),
                ("title", field.description.as_deref().unwrap_or("")),
            ],
        );
        w.element("sup", &[], "?");
        w.close("a");
        w.close("span");
        w.close("dt");
        w.open("dd", &[("class", "col-sm-9")]);
    }

    fn end_field(&mut self, _ctx: &Context<'_>, _field: &FieldInfo) {
        self.writer.close("dd");
    }

    fn begin_table(&mut self, _ctx: &Context<'_>, columns: &[FieldInfo]) {
        let w = &mut self.writer;
        w.open("div", &[]);
        w.open("table", &[("class", "table table-striped")]);
        w.open("tr", &[]);
        for column in columns {
            w.element("th", &[], &column.label);
        }
        w.close("tr");
    }

    fn begin_row(&mut self) {
        self.writer.open("tr", &[]);
    }

    fn begin_cell(&mut self) {
        self.writer.open("td", &[]);
    }

    fn end_cell(&mut self) {
        self.writer.close("td");
    }

    fn end_row(&mut self) {
        self.writer.close("tr");
    }

    fn end_table(&mut self) {
        self.writer.close("table");
        self.writer.close("div");
    }

    fn begin_list(&mut self, _ctx: &Context<'_>, info: &CollectionInfo) {
        self.writer.open("div", &[]);
        // Plain strings read better as a row of badges than as a list.
        let mode = if info.element_type == "string" {
            ListMode::Badges
        } else {
            self.writer.open("ul", &[("class", "list-group")]);
            ListMode::Items
        };
        self.lists.push(mode);
    }

    fn begin_item(&mut self) {
        match self.lists.last() {
            Some(ListMode::Badges) => self
                .writer
                .open("span", &[("class", "badge rounded-pill bg-light text-dark")]),
            _ => self.writer.open("li", &[("class", "list-group-item")]),
        }
    }

    fn end_item(&mut self) {
        match self.lists.last() {
            Some(ListMode::Badges) => self.writer.close("span"),
            _ => self.writer.close("li"),
        }
    }

    fn end_list(&mut self) {
        if self.lists.pop() == Some(ListMode::Items) {
            self.writer.close("ul");
        }
        self.writer.close("div");
    }

    fn begin_description_list(&mut self, _ctx: &Context<'_>, info: &CollectionInfo, keys: &[EntryKey]) {
        let w = &mut self.writer;
        w.open("div", &[]);
        w.open("div", &[]);
        w.element("a", &[("id", Self::anchor_id(&info.element_type, "TOC").as_str())], "");
        for key in keys {
            let href = format!("#{}", Self::anchor_id(&info.element_type, &key.to_string()));
            w.element(
                "a",
                &[("class", "btn btn-outline-primary"), ("href", href.as_str())],
                &key.to_string(),
            );
        }
        w.close("div");
    }

    fn begin_entry(&mut self, info: &CollectionInfo, key: &EntryKey) {
        let key = key.to_string();
        self.writer
            .element("a", &[("id", Self::anchor_id(&info.element_type, &key).as_str())], "");
        self.writer.element("h3", &[], &key);
    }

    fn end_entry(&mut self) {}

    fn end_description_list(&mut self) {
        self.writer.close("div");
    }

    fn begin_tuples(&mut self, _ctx: &Context<'_>, _info: &CollectionInfo) {
        self.writer.open("div", &[]);
    }

    fn tuple_separator(&mut self) {}

    fn end_tuples(&mut self) {
        self.writer.close("div");
    }

    fn begin_tuple(&mut self, _ctx: &Context<'_>) {
        self.writer.open("span", &[]);
    }

    fn tuple_value_separator(&mut self) {}

    fn end_tuple(&mut self) {
        self.writer.close("span");
    }

    fn atom(&mut self, _ctx: &Context<'_>, text: &str, url: Option<&str>) {
        match url {
            Some(url) => self.writer.element("a", &[("href", url)], text),
            None => self.writer.text(text),
        }
    }

    fn reference(&mut self, _ctx: &Context<'_>, id: &str, href: &str) {
        self.writer.element("a", &[("href", href)], id);
    }

    fn truncated(&mut self, _ctx: &Context<'_>) {
        self.writer.text("TRUNCATED");
    }

    fn finish(self) -> String {
        self.writer.finish()
    }
}
