//! Command-line importer for flowdeck workflows.
//!
//! Reads a foreign workflow export, converts it into the internal model, and
//! either prints an import summary or writes the converted workflow as JSON.
//!
//! Exit status: 0 on a clean import, 2 when the import succeeded but needs
//! configuration (missing credentials or environment variables), 1 on error.

use clap::Parser;
use flowdeck_workflow::{Workflow, convert};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

/// Import an externally authored workflow into the flowdeck graph model.
#[derive(Parser)]
#[command(name = "flowdeck", version)]
struct Cli {
    /// Path to the foreign workflow JSON export
    input: PathBuf,

    /// Credential reference id known to this installation (repeatable)
    #[arg(short, long = "credential")]
    credentials: Vec<String>,

    /// Name for the imported workflow (defaults to the document's name,
    /// then the input file stem)
    #[arg(long)]
    name: Option<String>,

    /// Write the converted workflow as JSON to this path instead of
    /// printing a summary
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(needs_configuration) => {
            if needs_configuration {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<bool, String> {
    let raw = std::fs::read_to_string(&cli.input)
        .map_err(|e| format!("cannot read {}: {e}", cli.input.display()))?;

    // Syntax errors are the caller's problem, reported separately from
    // malformed-but-valid-JSON documents.
    let document: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid JSON in {}: {e}", cli.input.display()))?;

    let available: HashSet<String> = cli.credentials.iter().cloned().collect();
    let result = convert(&document, &available).map_err(|e| e.to_string())?;

    let name = cli
        .name
        .clone()
        .or_else(|| {
            document
                .get("name")
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        })
        .unwrap_or_else(|| {
            cli.input
                .file_stem()
                .map_or_else(|| "imported".to_string(), |stem| {
                    stem.to_string_lossy().into_owned()
                })
        });

    let needs_configuration = result.needs_configuration();
    print_summary(&name, &result);

    if let Some(output) = &cli.output {
        let workflow = Workflow::from_parts(name, result.nodes, result.connections)
            .map_err(|e| format!("converted workflow is inconsistent: {e}"))?;
        let json = serde_json::to_string_pretty(&workflow)
            .map_err(|e| format!("cannot serialize workflow: {e}"))?;
        std::fs::write(output, json)
            .map_err(|e| format!("cannot write {}: {e}", output.display()))?;
        println!("wrote {}", output.display());
    }

    Ok(needs_configuration)
}

fn print_summary(name: &str, result: &flowdeck_workflow::ImportResult) {
    println!(
        "imported '{name}': {} nodes, {} connections",
        result.nodes.len(),
        result.connections.len()
    );

    if !result.missing_credentials.is_empty() {
        println!("missing credentials:");
        for (service, reference) in &result.missing_credentials {
            println!("  {service} (referenced as {reference})");
        }
    }
    if !result.missing_env_vars.is_empty() {
        println!("missing environment variables:");
        for (variable, placeholder) in &result.missing_env_vars {
            println!("  {variable} (used as {placeholder})");
        }
    }
    if !result.needs_configuration() {
        println!("no missing credentials or environment variables");
    }
}
