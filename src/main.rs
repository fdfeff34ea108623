use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, Command};
use schemadoc::instance;
use schemadoc::{Configuration, OutputFormat, Renderer, SchemaDefinition, SchemaIndex, StyleEngine};
use std::fs;
use std::path::Path;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("schemadoc")
        .about("Render schema-conformant data as HTML, Markdown or Mermaid")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("input")
                .help("Instance data file (YAML or JSON)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("schema")
                .short('s')
                .long("schema")
                .help("Schema file")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Style configuration file"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output file; stdout when omitted"),
        )
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .help("Class of the instance at the root of the tree"),
        )
        .arg(
            Arg::new("input-format")
                .short('f')
                .long("input-format")
                .help("Input format; inferred from the file extension when omitted")
                .value_parser(["yaml", "yml", "json"]),
        )
        .arg(
            Arg::new("output-format")
                .short('t')
                .long("output-format")
                .help("Output type")
                .value_parser(["html", "markdown", "mermaid"])
                .default_value("html"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue),
        )
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn input_format(path: &Path, specified: Option<&String>) -> Result<String> {
    let format = match specified {
        Some(format) => format.to_lowercase(),
        None => match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => ext.to_lowercase(),
            None => bail!(
                "Must pass --input-format or use a known file suffix: {}",
                path.display()
            ),
        },
    };
    Ok(match format.as_str() {
        "yml" => "yaml".to_string(),
        _ => format,
    })
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"), matches.get_flag("quiet"));

    let input = Path::new(
        matches
            .get_one::<String>("input")
            .context("missing input file")?,
    );
    let schema_path = Path::new(
        matches
            .get_one::<String>("schema")
            .context("missing schema file")?,
    );
    let format: OutputFormat = matches
        .get_one::<String>("output-format")
        .map(|s| s.as_str())
        .unwrap_or("html")
        .parse()?;

    let schema = SchemaDefinition::from_path(schema_path)
        .with_context(|| format!("Failed to load schema {}", schema_path.display()))?;
    let schema = SchemaIndex::new(schema);

    let configuration = match matches.get_one::<String>("config") {
        Some(config) => Configuration::from_path(Path::new(config))
            .with_context(|| format!("Failed to load configuration {}", config))?,
        None => Configuration::default(),
    };

    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let data = match input_format(input, matches.get_one::<String>("input-format"))?.as_str() {
        "yaml" => instance::from_yaml_str(&content),
        "json" => instance::from_json_str(&content),
        other => bail!("Unsupported input format: {}", other),
    }
    .with_context(|| format!("Failed to parse {}", input.display()))?;
    debug!("Loaded instance from {}", input.display());

    let renderer = Renderer::new(format, StyleEngine::new(configuration));
    let root = matches.get_one::<String>("root").map(|s| s.as_str());
    let output = renderer.render(&data, &schema, root)?;

    match matches.get_one::<String>("output") {
        Some(path) => fs::write(path, output)
            .with_context(|| format!("Failed to write {}", path))?,
        None => print!("{}", output),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn test_input_format_inference() {
        assert_eq!(input_format(Path::new("a.yml"), None).unwrap(), "yaml");
        assert_eq!(input_format(Path::new("a.JSON"), None).unwrap(), "json");
        assert_eq!(
            input_format(Path::new("a.txt"), Some(&"yaml".to_string())).unwrap(),
            "yaml"
        );
        assert!(input_format(Path::new("data"), None).is_err());
    }
}
