use schemadoc::{instance, Configuration, OutputFormat, Renderer, SchemaDefinition, SchemaIndex, StyleEngine};
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/personinfo")
        .join(name)
}

/// Run schemadoc on the personinfo container with the given extra arguments
fn run_schemadoc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schemadoc"))
        .arg(fixture("container.yaml"))
        .arg("--schema")
        .arg(fixture("schema.yaml"))
        .args(args)
        .output()
        .expect("Failed to execute schemadoc")
}

fn stdout_of(output: Output) -> String {
    if !output.status.success() {
        panic!(
            "schemadoc failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8(output.stdout).expect("schemadoc output is not valid UTF-8")
}

fn render_in_process(format: OutputFormat, with_config: bool) -> String {
    let schema = SchemaIndex::new(SchemaDefinition::from_path(&fixture("schema.yaml")).unwrap());
    let data = instance::from_path(&fixture("container.yaml")).unwrap();
    let configuration = if with_config {
        Configuration::from_path(&fixture("config.yaml")).unwrap()
    } else {
        Configuration::default()
    };
    Renderer::new(format, StyleEngine::new(configuration))
        .render(&data, &schema, None)
        .unwrap()
}

#[test]
fn test_html_page_for_container() {
    let html = stdout_of(run_schemadoc(&[]));

    assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
    assert!(html.contains("<title>Example registry</title>"));
    assert!(html.contains("bootstrap@5.3.0-alpha1"));
    assert!(html.contains("<table class=\"table table-striped\">"));
    // Non-inlined references become links to the expanded identifier.
    assert!(html.contains("<a href=\"https://ror.org/1\">ROR:1</a>"));
    assert!(html.contains("<a href=\"https://orcid.org/1234\">ORCID:1234</a>"));
    // Addresses are a table inside the persons table.
    assert!(html.contains("TRUNCATED"));
    assert!(!html.contains("Smallville"));
    assert!(!html.contains("<h3>Diagram</h3>"));
}

#[test]
fn test_config_changes_layout_and_formatting() {
    let html = stdout_of(run_schemadoc(&[
        "--config",
        fixture("config.yaml").to_str().unwrap(),
    ]));

    assert!(html.contains("<h3>Diagram</h3>"));
    assert!(html.contains("graph TB"));
    assert!(html.contains("32 years"));
    // Addresses switch to a description list, so they are no longer cut.
    assert!(html.contains("<a id=\"Address__TOC\"></a>"));
    assert!(html.contains("Smallville"));
    // Relationships render positionally.
    assert!(html.contains("SIBLING_OF"));
    assert!(html.contains("<a href=\"https://orcid.org/4567\">ORCID:4567</a>"));
}

#[test]
fn test_markdown_output_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("container.md");
    let output = run_schemadoc(&[
        "-t",
        "markdown",
        "--config",
        fixture("config.yaml").to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);
    assert!(stdout_of(output).is_empty());

    let markdown = fs::read_to_string(&out).unwrap();
    assert!(markdown.starts_with("\n# Example registry\n"));
    assert!(markdown.contains("\n## persons\n"));
    assert!(markdown.contains("|id|age_in_years|aliases|employed_at|"));
    assert!(markdown.contains("32 years"));
    assert!(markdown.contains("Superman, Kal-El"));
    // The address rule is HTML only; in Markdown the nested table is cut.
    assert!(markdown.contains("TRUNCATED"));
    assert!(!markdown.contains("graph TB"));
}

#[test]
fn test_mermaid_output() {
    let mermaid = stdout_of(run_schemadoc(&["--output-format", "mermaid"]));
    assert!(mermaid.starts_with("graph TB\n"));
    assert!(mermaid.contains("ANON__Container_1 -- persons --> ANON__Person_2"));
    assert!(mermaid.contains("ANON__Person_2 -.-> ORCID:1234"));
    assert!(mermaid.contains("<b>aliases</b> Superman, Kal-El"));
    assert!(mermaid.contains("<b>employed_at</b> ROR:1"));
}

#[test]
fn test_cli_matches_library() {
    for (flag, format) in [
        ("html", OutputFormat::Html),
        ("markdown", OutputFormat::Markdown),
        ("mermaid", OutputFormat::Mermaid),
    ] {
        let cli = stdout_of(run_schemadoc(&["-t", flag]));
        let library = render_in_process(format, false);
        if cli != library {
            panic!(
                "CLI and library differ for {}:\n{}",
                flag,
                TextDiff::from_lines(&library, &cli).unified_diff()
            );
        }
    }
}

#[test]
fn test_json_input_with_explicit_root() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("person.data");
    fs::write(
        &input,
        r#"{"id": "ORCID:1", "name": "Jimmy Olsen", "aliases": ["Jim"]}"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_schemadoc"))
        .arg(&input)
        .args(["-s", fixture("schema.yaml").to_str().unwrap()])
        .args(["-f", "json", "-r", "Person", "-t", "markdown"])
        .output()
        .expect("Failed to execute schemadoc");
    let markdown = stdout_of(output);
    assert!(markdown.starts_with("\n# Jimmy Olsen\n"));
    assert!(markdown.contains("|id[?](https://example.org/personinfo/id)|[ORCID:1](https://orcid.org/1)|"));
}

#[test]
fn test_unknown_root_fails() {
    let output = run_schemadoc(&["--root", "Spaceship"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Spaceship"));
}
