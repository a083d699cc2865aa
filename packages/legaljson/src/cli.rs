//! Command-line interface for the converter.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::parse_batch;
use crate::config::{ParseOptions, TEXT_WRAP_WIDTH};
use crate::error::{ParserError, Result};
use crate::legaljson::LegalJsonValidator;
use crate::parser::Parsed;
use crate::registry::{create_parser, detect, registry};
use crate::xml::schema::cached_validator;

/// LegalJSON converter - turn legal acts in XML and HTML dialects into LegalJSON.
#[derive(Parser)]
#[command(name = "legaljson")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert one document (a file, or a directory holding one).
    Parse {
        /// Input file or directory
        input: PathBuf,

        /// Format key (default: detected from the input)
        #[arg(short, long)]
        format: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// XML schema to validate the source against
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Schema language of --schema (xsd or relaxng)
        #[arg(long, default_value = "xsd", requires = "schema")]
        schema_kind: String,

        /// Check the result against the LegalJSON schema
        #[arg(long)]
        validate: bool,
    },

    /// Print the detected format key of an input.
    Detect {
        /// Input file or directory
        input: PathBuf,
    },

    /// Convert many inputs in parallel.
    Batch {
        /// Input files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory the JSON files are written to
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Format key for every input (default: detected per input)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Check a LegalJSON file against the schema.
    Validate {
        /// LegalJSON file
        json: PathBuf,
    },

    /// List the supported formats.
    Formats,
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            input,
            format,
            output,
            schema,
            schema_kind,
            validate,
        } => parse_command(
            &input,
            format.as_deref(),
            output.as_deref(),
            schema.as_deref().map(|path| (path, schema_kind.as_str())),
            validate,
        ),
        Commands::Detect { input } => {
            println!("{}", detect(&input)?);
            Ok(())
        }
        Commands::Batch {
            inputs,
            output_dir,
            format,
        } => batch_command(&inputs, &output_dir, format.as_deref()),
        Commands::Validate { json } => validate_command(&json),
        Commands::Formats => {
            formats_command();
            Ok(())
        }
    }
}

fn report_failures(parsed: &Parsed) {
    for failure in &parsed.failures {
        eprintln!(
            "  {} {}: {}",
            style("Skipped").yellow().bold(),
            failure.step,
            failure.message
        );
    }
    if parsed.valid == Some(false) {
        eprintln!(
            "  {} {} schema error(s)",
            style("Invalid source:").yellow().bold(),
            parsed.validation_errors.len()
        );
    }
}

fn check_legaljson(value: &serde_json::Value) -> Result<()> {
    let (ok, errors) = LegalJsonValidator::new()?.validate_value(value);
    if ok {
        eprintln!("{}", style("LegalJSON is valid").green().bold());
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  {} {error}", style("-").red());
        }
        Err(ParserError::SchemaValidation { errors })
    }
}

/// Execute the parse command.
fn parse_command(
    input: &Path,
    format: Option<&str>,
    output: Option<&Path>,
    schema: Option<(&Path, &str)>,
    validate: bool,
) -> Result<()> {
    let options = match schema {
        Some((path, kind)) => ParseOptions::with_schema(cached_validator(path, kind)?),
        None => ParseOptions::default(),
    };
    let parser = create_parser(format, input)?;

    let parsed = parser.parse_with_options(input, &options)?;
    report_failures(&parsed);

    let value = serde_json::to_value(&parsed.document)?;
    let json = serde_json::to_string_pretty(&value)?;
    match output {
        Some(path) => {
            fs::write(path, &json)?;
            eprintln!(
                "{} {} ({}, {} articles)",
                style("Saved to:").green().bold(),
                path.display(),
                style(parsed.dialect).cyan(),
                parsed.document.articles.len()
            );
        }
        None => println!("{json}"),
    }

    if validate {
        check_legaljson(&value)?;
    }
    Ok(())
}

/// Output file for `input` inside `output_dir`.
fn output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "document".into(), |s| s.to_string_lossy());
    output_dir.join(format!("{stem}.json"))
}

/// Execute the batch command.
fn batch_command(inputs: &[PathBuf], output_dir: &Path, format: Option<&str>) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    let pb = ProgressBar::new(inputs.len() as u64);
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Converting...");

    let report = parse_batch(inputs, format, &ParseOptions::default(), |_| pb.inc(1));
    pb.finish_and_clear();

    for outcome in &report.outcomes {
        if let Ok(parsed) = &outcome.result {
            fs::write(output_path(output_dir, &outcome.input), parsed.document.to_json()?)?;
        }
    }

    let summary = report.summary();
    println!(
        "{} {} of {} document(s) into {}",
        style("Converted").bold(),
        style(summary.succeeded).green(),
        summary.total,
        output_dir.display()
    );
    if summary.sections_failed > 0 {
        println!(
            "  Sections skipped: {}",
            style(summary.sections_failed).yellow().bold()
        );
    }
    for failed in &summary.failed_documents {
        match &failed.error {
            Some(error) => println!(
                "  {} {}: {error}",
                style("Failed").red().bold(),
                failed.input.display()
            ),
            None => {
                let sections: Vec<&str> = failed.sections.iter().map(|s| s.as_str()).collect();
                println!(
                    "  {} {}: {}",
                    style("Partial").yellow().bold(),
                    failed.input.display(),
                    sections.join(", ")
                );
            }
        }
    }
    Ok(())
}

/// Execute the validate command.
fn validate_command(json: &Path) -> Result<()> {
    let source = fs::read_to_string(json).map_err(|source| ParserError::FileLoad {
        path: json.to_path_buf(),
        source,
    })?;
    let value: serde_json::Value = serde_json::from_str(&source)?;
    check_legaljson(&value)
}

/// Execute the formats command.
fn formats_command() {
    let indent = "    ";
    let options = textwrap::Options::new(TEXT_WRAP_WIDTH)
        .initial_indent(indent)
        .subsequent_indent(indent);
    for (key, description) in registry().descriptions() {
        println!("{}", style(key).cyan().bold());
        for line in textwrap::wrap(description, &options) {
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["legaljson", "parse", "act.xml"]);

        let Commands::Parse {
            input,
            format,
            output,
            schema,
            schema_kind,
            validate,
        } = cli.command
        else {
            unreachable!("expected parse command");
        };
        assert_eq!(input, PathBuf::from("act.xml"));
        assert!(format.is_none());
        assert!(output.is_none());
        assert!(schema.is_none());
        assert_eq!(schema_kind, "xsd");
        assert!(!validate);
    }

    #[test]
    fn test_cli_parse_with_schema() {
        let cli = Cli::parse_from([
            "legaljson",
            "parse",
            "act.xml",
            "--format",
            "formex",
            "--schema",
            "formex.xsd",
            "--schema-kind",
            "relaxng",
            "--validate",
        ]);

        let Commands::Parse {
            format,
            schema,
            schema_kind,
            validate,
            ..
        } = cli.command
        else {
            unreachable!("expected parse command");
        };
        assert_eq!(format.as_deref(), Some("formex"));
        assert_eq!(schema, Some(PathBuf::from("formex.xsd")));
        assert_eq!(schema_kind, "relaxng");
        assert!(validate);
    }

    #[test]
    fn test_cli_schema_kind_requires_schema() {
        let result = Cli::try_parse_from(["legaljson", "parse", "act.xml", "--schema-kind", "xsd"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_batch() {
        let cli = Cli::parse_from(["legaljson", "batch", "a.xml", "b.html", "-o", "out"]);

        let Commands::Batch {
            inputs,
            output_dir,
            format,
        } = cli.command
        else {
            unreachable!("expected batch command");
        };
        assert_eq!(inputs, vec![PathBuf::from("a.xml"), PathBuf::from("b.html")]);
        assert_eq!(output_dir, PathBuf::from("out"));
        assert!(format.is_none());
    }

    #[test]
    fn test_output_path_uses_stem() {
        assert_eq!(
            output_path(Path::new("out"), Path::new("/data/act.fmx4")),
            PathBuf::from("out/act.json")
        );
    }
}
