//! Registry Schema CLI
//!
//! Command-line interface for importing and linting registry schemas.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use registry_schema::{
    collect_schema_files, import_resource, is_url, lint, load_schema_auto, validate_document,
    FileStatus, ImportOptions, LoadError, MemoryDatabase, ProblemLog, Severity,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "registry-schema")]
#[command(about = "Import resource provider registry schemas into a typed model")]
#[command(version)]
struct Cli {
    /// Enable verbose logging. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import schema documents and print the resulting model as JSON
    Import {
        /// Schema source: file, directory, or URL (http:// or https://)
        source: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Exit with status 1 if any problem was reported
        #[arg(long)]
        strict: bool,

        /// Skip the registry shape check before importing
        #[arg(long)]
        no_validate: bool,

        /// Tag collection property when a document does not declare one
        #[arg(long, default_value = "Tags")]
        tag_property: String,
    },

    /// Lint schema files (syntax, shape, broken refs, unmodelable constructs)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,

        /// Skip the registry shape check before importing
        #[arg(long)]
        no_validate: bool,

        /// Tag collection property when a document does not declare one
        #[arg(long, default_value = "Tags")]
        tag_property: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Import {
            source,
            output,
            pretty,
            strict,
            no_validate,
            tag_property,
        } => {
            let options = ImportOptions::new()
                .tag_property(tag_property)
                .strict(strict)
                .validate(!no_validate);
            run_import(&source, output, pretty, &options)
        }

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
            no_validate,
            tag_property,
        } => {
            let options = ImportOptions::new()
                .tag_property(tag_property)
                .strict(strict)
                .validate(!no_validate);
            run_lint(&path, &format, quiet, &options)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Documents named by a source: one URL, or every .json file under a path.
fn documents(source: &str) -> Result<Vec<(String, serde_json::Value)>, LoadError> {
    if is_url(source) {
        return Ok(vec![(source.to_string(), load_schema_auto(source)?)]);
    }
    let path = Path::new(source);
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    collect_schema_files(path)
        .into_iter()
        .map(|file| {
            let document = load_schema_auto(&file.to_string_lossy())?;
            Ok((file.display().to_string(), document))
        })
        .collect()
}

fn run_import(
    source: &str,
    output: Option<PathBuf>,
    pretty: bool,
    options: &ImportOptions,
) -> Result<(), u8> {
    let documents = documents(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    tracing::info!(source, documents = documents.len(), "importing");

    let mut db = MemoryDatabase::new();
    let mut problems = ProblemLog::new();
    let mut failure: Option<u8> = None;

    for (name, document) in &documents {
        if options.validate {
            if let Err(e) = validate_document(document) {
                eprintln!("Error: {}: {}", name, e);
                if let LoadError::MetaSchema { errors } = &e {
                    for error in errors {
                        eprintln!("  {}", error);
                    }
                }
                failure = failure.max(Some(e.exit_code() as u8));
                continue;
            }
        }
        if let Err(e) = import_resource(&mut db, document, options, &mut problems) {
            eprintln!("Error: {}: {}", name, e);
            failure = failure.max(Some(e.exit_code() as u8));
        }
    }

    for problem in problems.iter() {
        eprintln!("warning: {}", problem);
    }

    let json_output = if pretty {
        serde_json::to_string_pretty(&db)
    } else {
        serde_json::to_string(&db)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    if let Some(code) = failure {
        return Err(code);
    }
    if options.strict && !problems.is_empty() {
        return Err(1);
    }
    Ok(())
}

fn run_lint(path: &Path, format: &str, quiet: bool, options: &ImportOptions) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(3);
    }

    let strict = options.strict;
    let result = lint(path, options);

    if format == "json" {
        let json = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", json);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
