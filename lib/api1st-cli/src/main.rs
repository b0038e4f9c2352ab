#![allow(missing_docs)]
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{Level, info, warn};

use api1st_core::{DefaultLoader, DocumentRef, Format, HttpLoader, Resolver, Severity, ToYaml};

const USAGE: &str = "\
Flatten JSON Schema and OpenAPI documents by resolving their $refs.

Usage: api1st [OPTIONS] <FILE|URL>...

Options:
  -o, --output <DIR>        write each resolved document into DIR
  -f, --format <yaml|json>  output format [default: yaml]
      --timeout <SECS>      timeout of HTTP requests
      --strict              fail when a reference cannot be resolved
  -v, --verbose             debug logging
  -h, --help                print this help
";

fn main() -> Result<()> {
    let args = AppArgs::parse().context("parsing arguments")?;

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if !args.unused.is_empty() {
        warn!(unused = ?args.unused, "Warning: unused arguments left");
    }

    if args.help {
        std::io::stdout()
            .lock()
            .write_all(USAGE.as_bytes())
            .context("writing usage")?;
        return Ok(());
    }

    run(&args)?;

    info!("Bye!");
    Ok(())
}

#[derive(Debug)]
struct AppArgs {
    help: bool,
    verbose: bool,
    strict: bool,
    output: Option<PathBuf>,
    format: Format,
    timeout: Option<u64>,
    inputs: Vec<String>,
    unused: Vec<OsString>,
}

impl AppArgs {
    fn parse() -> Result<Self> {
        Self::from_arguments(pico_args::Arguments::from_env())
    }

    fn from_arguments(mut pargs: pico_args::Arguments) -> Result<Self> {
        let help = pargs.contains(["-h", "--help"]);
        let verbose = pargs.contains(["-v", "--verbose"]);
        let strict = pargs.contains("--strict");

        let output: Option<PathBuf> = pargs
            .opt_value_from_str(["-o", "--output"])
            .context("parsing output argument")?;

        let format: Option<Format> = pargs
            .opt_value_from_str(["-f", "--format"])
            .context("parsing format argument")?;

        let timeout: Option<u64> = pargs
            .opt_value_from_str("--timeout")
            .context("parsing timeout argument")?;

        let mut inputs = Vec::new();
        while let Some(input) = pargs
            .opt_free_from_str()
            .context("parsing input argument")?
        {
            inputs.push(input);
        }

        Ok(Self {
            help,
            verbose,
            strict,
            output,
            format: format.unwrap_or_default(),
            timeout,
            inputs,
            unused: pargs.finish(),
        })
    }
}

fn run(args: &AppArgs) -> Result<()> {
    if args.inputs.is_empty() {
        bail!("missing input document\n\n{USAGE}");
    }

    let mut loader = DefaultLoader::new();
    if let Some(timeout) = args.timeout {
        let http = HttpLoader::with_timeout(Duration::from_secs(timeout))
            .context("building HTTP client")?;
        loader = loader.with_http(http);
    }
    let mut resolver = Resolver::builder().with_loader(loader).build();

    let mut roots = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let root = resolver
            .load(input)
            .with_context(|| format!("loading '{input}'"))?;
        roots.push(root);
    }
    let resolved = resolver.resolve(roots).context("resolving references")?;

    match &args.output {
        Some(directory) => write_files(directory, &resolved, args.format)?,
        None => write_stdout(&resolved, args.format)?,
    }

    let unresolved = resolver
        .sink()
        .entries()
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .count();
    if unresolved > 0 {
        warn!(unresolved, "some references could not be resolved");
        if args.strict {
            bail!("{unresolved} reference(s) could not be resolved");
        }
    }
    Ok(())
}

fn render(document: &DocumentRef, format: Format) -> Result<String> {
    let document = document.borrow();
    let mut text = match format {
        Format::Json => serde_json::to_string_pretty(document.tree())
            .with_context(|| format!("serializing {} to JSON", document.locator()))?,
        Format::Yaml => document
            .tree()
            .to_yaml()
            .with_context(|| format!("serializing {} to YAML", document.locator()))?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

fn file_name(document: &DocumentRef, index: usize) -> String {
    document
        .borrow()
        .locator()
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map_or_else(|| format!("document-{index}"), str::to_string)
}

fn write_files(directory: &Path, documents: &[DocumentRef], format: Format) -> Result<()> {
    fs::create_dir_all(directory)
        .with_context(|| format!("creating output directory {}", directory.display()))?;

    for (index, document) in documents.iter().enumerate() {
        let path = directory.join(file_name(document, index));
        let text = render(document, format)?;
        fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "resolved document written");
    }
    Ok(())
}

fn write_stdout(documents: &[DocumentRef], format: Format) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    for (index, document) in documents.iter().enumerate() {
        if index > 0 {
            writeln!(stdout, "---")?;
        }
        stdout.write_all(render(document, format)?.as_bytes())?;
    }
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Result<AppArgs> {
        let raw = raw.iter().map(OsString::from).collect();
        AppArgs::from_arguments(pico_args::Arguments::from_vec(raw))
    }

    #[test]
    fn should_parse_defaults() -> Result<()> {
        let args = args(&["schemas/api.yaml"])?;

        assert!(!args.verbose);
        assert!(!args.strict);
        assert_eq!(args.output, None);
        assert_eq!(args.format, Format::Yaml);
        assert_eq!(args.timeout, None);
        assert_eq!(args.inputs, vec!["schemas/api.yaml".to_string()]);
        Ok(())
    }

    #[test]
    fn should_parse_all_options() -> Result<()> {
        let args = args(&[
            "-v",
            "--strict",
            "--output",
            "out",
            "-f",
            "json",
            "--timeout",
            "5",
            "a.yaml",
            "https://example.com/b.yaml",
        ])?;

        assert!(args.verbose);
        assert!(args.strict);
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert_eq!(args.format, Format::Json);
        assert_eq!(args.timeout, Some(5));
        assert_eq!(args.inputs, vec!["a.yaml", "https://example.com/b.yaml"]);
        Ok(())
    }

    #[test]
    fn should_reject_unknown_format() {
        let result = args(&["--format", "toml", "a.yaml"]);

        assert!(result.is_err());
    }

    #[test]
    fn should_write_resolved_documents() -> Result<()> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        fs::write(
            input.path().join("point.yaml"),
            "definitions:\n  Point:\n    x: number\n    y: number\n",
        )?;
        let root = input.path().join("root.json");
        fs::write(&root, r#"{"$ref": "point.yaml#/definitions/Point"}"#)?;

        let args = AppArgs {
            help: false,
            verbose: false,
            strict: true,
            output: Some(output.path().to_path_buf()),
            format: Format::Json,
            timeout: None,
            inputs: vec![root.display().to_string()],
            unused: Vec::new(),
        };
        run(&args)?;

        let written = fs::read_to_string(output.path().join("root.json"))?;
        let tree: serde_json::Value = serde_json::from_str(&written)?;
        assert_eq!(tree, serde_json::json!({"x": "number", "y": "number"}));
        Ok(())
    }

    #[test]
    fn should_fail_in_strict_mode_on_missing_reference() -> Result<()> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        let root = input.path().join("root.yaml");
        fs::write(&root, "a:\n  $ref: '#/definitions/Missing'\ndefinitions: {}\n")?;

        let args = AppArgs {
            help: false,
            verbose: false,
            strict: true,
            output: Some(output.path().to_path_buf()),
            format: Format::Yaml,
            timeout: None,
            inputs: vec![root.display().to_string()],
            unused: Vec::new(),
        };

        let error = run(&args).expect_err("should fail");
        assert_eq!(error.to_string(), "1 reference(s) could not be resolved");
        Ok(())
    }
}
