use crate::error::RenderError;
use crate::instance::{InstanceView, Scalar};
use crate::renderer::{OutputFormat, Renderer};
use crate::schema::{SchemaDefinition, SchemaIndex};
use crate::style::{Configuration, RenderElementType, StyleEngine};
use serde_json::{json, Value};
use similar::TextDiff;

const FORMATS: [OutputFormat; 3] = [
    OutputFormat::Html,
    OutputFormat::Markdown,
    OutputFormat::Mermaid,
];

const PEOPLE: &str = r#"
name: people
default_prefix: t
prefixes:
  t: https://example.org/t/
  dcterms: http://purl.org/dc/terms/
  ROR: https://ror.org/
classes:
  Registry:
    tree_root: true
    attributes:
      persons:
        range: Person
        multivalued: true
        inlined_as_list: true
  Person:
    attributes:
      notes: {}
      age:
        range: integer
        rank: 5
      name:
        key: true
      id:
        identifier: true
      tags:
        multivalued: true
      employer:
        range: Organization
      addresses:
        range: Address
        multivalued: true
  Organization:
    attributes:
      id:
        identifier: true
  Address:
    attributes:
      street: {}
      city: {}
"#;

fn people() -> SchemaIndex {
    SchemaIndex::new(SchemaDefinition::from_yaml_str(PEOPLE).unwrap())
}

fn render(format: OutputFormat, instance: &Value, root: Option<&str>) -> String {
    render_styled(format, StyleEngine::default(), instance, root)
}

fn render_styled(
    format: OutputFormat,
    style: StyleEngine,
    instance: &Value,
    root: Option<&str>,
) -> String {
    Renderer::new(format, style)
        .render(instance, &people(), root)
        .unwrap()
}

fn assert_same_text(expected: &str, actual: &str) {
    if expected != actual {
        let diff = TextDiff::from_lines(expected, actual)
            .unified_diff()
            .header("expected", "actual")
            .to_string();
        panic!("outputs differ:\n{}", diff);
    }
}

/// Byte offset of each needle in `text`, panicking if one is missing.
fn positions(text: &str, needles: &[String]) -> Vec<usize> {
    needles
        .iter()
        .map(|n| {
            text.find(n.as_str())
                .unwrap_or_else(|| panic!("{:?} not found in:\n{}", n, text))
        })
        .collect()
}

fn slot_marker(format: OutputFormat, slot: &str) -> String {
    match format {
        OutputFormat::Mermaid => format!("<b>{}</b>", slot),
        _ => format!("https://example.org/t/{}", slot),
    }
}

#[test]
fn test_rendering_is_idempotent() {
    let instance = json!({
        "persons": [
            {"id": "P1", "name": "Ann", "tags": ["x", "y"], "employer": "ROR:1"},
            {"id": "P2", "name": "Bob", "addresses": [{"street": "Main", "city": "Ely"}]}
        ]
    });
    for format in FORMATS {
        let renderer = Renderer::new(format, StyleEngine::default());
        let first = renderer.render(&instance, &people(), None).unwrap();
        let second = renderer.render(&instance, &people(), None).unwrap();
        assert_same_text(&first, &second);
    }
}

#[test]
fn test_attribute_order_is_shared_by_every_format() {
    // Field order in the instance is deliberately the reverse of the
    // expected display order.
    let instance = json!({"notes": "n", "age": 40, "name": "Ann", "id": "P1"});
    for format in FORMATS {
        let out = render(format, &instance, Some("Person"));
        let needles: Vec<String> = ["name", "id", "age", "notes"]
            .iter()
            .map(|s| slot_marker(format, s))
            .collect();
        let found = positions(&out, &needles);
        let mut sorted = found.clone();
        sorted.sort();
        assert_eq!(found, sorted, "unexpected order for {}:\n{}", format, out);
    }
}

#[test]
fn test_end_to_end_person_with_tags() {
    let schema = SchemaIndex::new(
        SchemaDefinition::from_yaml_str(
            r#"
name: scenario
default_prefix: t
prefixes:
  t: https://example.org/t/
classes:
  Person:
    attributes:
      name: {}
      id:
        identifier: true
      tags:
        multivalued: true
"#,
        )
        .unwrap(),
    );
    let instance = json!({"id": "P1", "name": "Ann", "tags": ["x", "y"]});
    let render = |format| {
        Renderer::new(format, StyleEngine::default())
            .render(&instance, &schema, Some("Person"))
            .unwrap()
    };

    let html = render(OutputFormat::Html);
    assert_eq!(
        html.matches("badge rounded-pill bg-light text-dark").count(),
        2
    );
    let found = positions(&html, &["x\n".to_string(), "y\n".to_string()]);
    assert!(found[0] < found[1]);

    let markdown = render(OutputFormat::Markdown);
    assert!(markdown.contains("|tags[?](https://example.org/t/tags)|x, y|"));
    let found = positions(&markdown, &["|id[?]".to_string(), "|name[?]".to_string()]);
    assert!(found[0] < found[1]);
}

#[test]
fn test_collection_layout_defaults_to_table_for_objects() {
    let instance = json!({"persons": [{"id": "P1"}, {"id": "P2"}]});
    let html = render(OutputFormat::Html, &instance, None);
    assert!(html.contains("<table class=\"table table-striped\">"));
    assert!(!html.contains("list-group"));

    let mut style = StyleEngine::default();
    style.configure_slot("persons", RenderElementType::SimpleList);
    let html = render_styled(OutputFormat::Html, style, &instance, None);
    assert!(!html.contains("<table"));
    assert_eq!(html.matches("list-group-item").count(), 2);
}

#[test]
fn test_description_list_layout() {
    let instance = json!({"persons": [{"id": "P1", "name": "Ann"}]});
    let mut style = StyleEngine::default();
    style.configure_slot("persons", RenderElementType::DescriptionList);

    let html = render_styled(OutputFormat::Html, style.clone(), &instance, None);
    assert!(html.contains("<a id=\"Person__TOC\"></a>"));
    assert!(html.contains("href=\"#Person__0\""));
    assert!(html.contains("<h3>0</h3>"));

    let markdown = render_styled(OutputFormat::Markdown, style, &instance, None);
    assert!(markdown.contains("\n### 0\n"));
    assert!(markdown.contains("|name[?](https://example.org/t/name)|Ann|"));
}

#[test]
fn test_description_list_inside_field_row_stays_in_the_row() {
    let instance = json!({"id": "P1", "tags": ["x", "y"]});
    let mut style = StyleEngine::default();
    style.configure_slot("tags", RenderElementType::DescriptionList);

    let markdown = render_styled(OutputFormat::Markdown, style, &instance, Some("Person"));
    assert!(markdown.contains("|tags[?](https://example.org/t/tags)|0: x, 1: y|\n"));
    assert!(!markdown.contains("###"));
}

#[test]
fn test_fstring_rule_matched_by_curie() {
    let instance = json!({"id": "P1", "age": 40, "notes": "a{}b"});
    let style = StyleEngine::new(
        Configuration::from_yaml_str(
            r#"
rules:
  - applies_to_curies: [t:age]
    fstring: "{value} years"
  - applies_to_slots: [notes]
    fstring: "<{value}>"
"#,
        )
        .unwrap(),
    );

    let markdown = render_styled(OutputFormat::Markdown, style.clone(), &instance, Some("Person"));
    assert!(markdown.contains("|age[?](https://example.org/t/age)|40 years|"));
    assert!(markdown.contains("|notes[?](https://example.org/t/notes)|<a{}b>|"));

    let html = render_styled(OutputFormat::Html, style, &instance, Some("Person"));
    assert!(html.contains("40 years"));
}

#[test]
fn test_tuple_layout_omits_labels() {
    let instance = json!({
        "id": "P1",
        "addresses": [
            {"street": "Main", "city": "Ely"},
            {"street": "High", "city": "Bath"}
        ]
    });
    let mut style = StyleEngine::default();
    style.configure_slot("addresses", RenderElementType::Tuple);
    let markdown = render_styled(OutputFormat::Markdown, style, &instance, Some("Person"));
    assert!(markdown.contains("\n## addresses\n\nMain Ely, High Bath\n"));
    assert!(!markdown.contains("street"));
}

#[test]
fn test_table_columns_drop_only_when_empty_everywhere() {
    let instance = json!({"persons": [
        {"id": "P1", "tags": ["x", "y"], "age": null},
        {"id": "P2", "tags": []}
    ]});
    let markdown = render(OutputFormat::Markdown, &instance, None);
    assert!(markdown.contains("|id|tags|\n|---|---|\n"));
    assert!(markdown.contains("|P1|x, y|\n"));
    assert!(markdown.contains("|P2||\n"));
    assert!(!markdown.contains("|age"));
}

#[test]
fn test_nested_default_table_is_truncated() {
    let instance = json!({"persons": [
        {"id": "P1", "name": "Ann", "addresses": [{"street": "Main", "city": "Ely"}]}
    ]});
    let html = render(OutputFormat::Html, &instance, None);
    assert_eq!(html.matches("<table").count(), 1);
    assert!(html.contains("TRUNCATED"));
    assert!(html.contains("Ann"));
    assert!(!html.contains("Ely"));
}

#[test]
fn test_reference_and_forced_inline() {
    let instance = json!({
        "id": "P1",
        "employer": "ROR:1",
        "addresses": [{"street": "Main", "city": "Ely"}]
    });
    let html = render(OutputFormat::Html, &instance, Some("Person"));
    assert!(html.contains("<a href=\"https://ror.org/1\">ROR:1</a>"));
    // Address has no identifier, so it is embedded rather than linked.
    assert!(html.contains("Ely"));
    assert!(html.contains("<table class=\"table table-striped\">"));
}

#[test]
fn test_null_and_empty_values_are_suppressed() {
    let instance = json!({"id": "P1", "name": null, "tags": [], "notes": {}});
    for format in [OutputFormat::Html, OutputFormat::Markdown] {
        let out = render(format, &instance, Some("Person"));
        assert!(out.contains("https://example.org/t/id"));
        for slot in ["name", "tags", "notes"] {
            assert!(
                !out.contains(&slot_marker(format, slot)),
                "{} rendered for {}",
                slot,
                format
            );
        }
    }
}

#[test]
fn test_mermaid_graph_structure() {
    let instance = json!({"persons": [{"id": "P1", "name": "Ann", "employer": "ROR:1"}]});
    let mermaid = render(OutputFormat::Mermaid, &instance, None);
    assert_same_text(
        "graph TB\n    ANON__Person_2{ }\n    ANON__Registry_1 -- persons --> ANON__Person_2\n    P1(Person<br><b>name</b> Ann<br><b>id</b> P1<br><b>employer</b> ROR:1)\n    ANON__Person_2 -.-> P1\n    ANON__Registry_1(Registry)\n",
        &mermaid,
    );
}

#[test]
fn test_html_embeds_diagram_when_configured() {
    let instance = json!({"persons": [{"id": "P1"}]});
    let style = StyleEngine::new(Configuration {
        include_diagrams: true,
        ..Default::default()
    });
    let html = render_styled(OutputFormat::Html, style.clone(), &instance, None);
    assert!(html.contains("<h3>Diagram</h3>"));
    assert!(html.contains("graph TB"));
    assert!(html.contains("mermaid.initialize({});"));

    let markdown = render_styled(OutputFormat::Markdown, style, &instance, None);
    assert!(!markdown.contains("graph TB"));
}

#[test]
fn test_root_resolution() {
    let instance = json!({"id": "P1"});
    let schema = SchemaIndex::new(
        SchemaDefinition::from_yaml_str("name: t\nclasses:\n  A: {}\n  B: {}\n").unwrap(),
    );
    let renderer = Renderer::new(OutputFormat::Html, StyleEngine::default());
    assert!(matches!(
        renderer.render(&instance, &schema, None),
        Err(RenderError::AmbiguousRoot(_))
    ));

    let tagged = json!({"@type": "Person", "id": "P1"});
    let html = render(OutputFormat::Html, &tagged, None);
    assert!(html.contains("https://example.org/t/id"));

    assert!(matches!(
        Renderer::default().render(&instance, &people(), Some("Nobody")),
        Err(RenderError::SchemaResolution(_))
    ));
}

#[test]
fn test_shape_mismatches_are_errors() {
    let renderer = Renderer::new(OutputFormat::Html, StyleEngine::default());
    let not_a_list = json!({"persons": "P1"});
    assert!(matches!(
        renderer.render(&not_a_list, &people(), None),
        Err(RenderError::TypeMismatch { .. })
    ));

    let scalar_rows = json!({"persons": ["P1"]});
    match renderer.render(&scalar_rows, &people(), None) {
        Err(RenderError::TypeMismatch { path, .. }) => assert!(path.contains("persons")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_unsupported_layout_is_a_configuration_error() {
    let instance = json!({"persons": [{"id": "P1"}]});
    let config = Configuration::from_yaml_str(
        "rules:\n  - applies_to_slots: [persons]\n    render_as: heading\n",
    )
    .unwrap();
    let renderer = Renderer::new(OutputFormat::Html, StyleEngine::new(config));
    assert!(matches!(
        renderer.render(&instance, &people(), None),
        Err(RenderError::Configuration(_))
    ));
}

/// A value whose only field points back at itself.
struct Loop;

impl InstanceView for Loop {
    fn is_null(&self) -> bool {
        false
    }

    fn as_scalar(&self) -> Option<Scalar> {
        None
    }

    fn as_fields(&self) -> Option<Vec<(&str, &Self)>> {
        Some(vec![("next", self)])
    }

    fn as_entries(&self) -> Option<Vec<(crate::instance::EntryKey, &Self)>> {
        None
    }
}

#[test]
fn test_cycles_are_truncated() {
    let schema = SchemaIndex::new(
        SchemaDefinition::from_yaml_str(
            "name: t\nclasses:\n  Node:\n    attributes:\n      next:\n        range: Node\n",
        )
        .unwrap(),
    );
    let renderer = Renderer::new(OutputFormat::Markdown, StyleEngine::default());
    let out = renderer.render(&Loop, &schema, Some("Node")).unwrap();
    assert!(out.contains("\n## next\n\nTRUNCATED"));
}
