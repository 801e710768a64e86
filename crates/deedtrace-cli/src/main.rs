//! Deedtrace CLI - reconcile confidence-scored document captures
//!
//! Feeds capture payload files through the reconciliation engine and prints
//! the threshold-gated projection, the merged record, or the field schema.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use deedtrace_core::{display_label, CaptureLog, EngineConfig, FieldKey};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "deedtrace")]
#[command(about = "Reconcile confidence-scored mortgage document captures")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile capture payloads and print the resulting field table
    Reconcile {
        /// Capture payload files (JSON), reconciled in the order given
        #[arg(value_name = "CAPTURE", required = true)]
        inputs: Vec<PathBuf>,

        /// Engine settings file with overrides for the built-in defaults
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Minimum display confidence, overriding the settings file
        #[arg(short, long, value_name = "0..1")]
        threshold: Option<f64>,

        /// Operator correction applied after reconciliation (repeatable)
        #[arg(long = "set", value_name = "LABEL=VALUE")]
        edits: Vec<String>,

        /// Print projection rows as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Print the full merged record as JSON instead of the projection
        #[arg(long, conflicts_with = "json")]
        record: bool,
    },

    /// List the schema fields with their display labels
    Fields {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "deedtrace_core=info"
                    .parse()
                    .expect("directive is compile-time constant"),
            ),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Reconcile {
            inputs,
            config,
            threshold,
            edits,
            json,
            record,
        } => reconcile_command(&inputs, config.as_deref(), threshold, &edits, json, record),
        Command::Fields { json } => fields_command(json),
    }
}

/// Build the engine configuration from defaults, an optional settings file,
/// and an optional threshold override.
fn load_config(settings: Option<&Path>, threshold: Option<f64>) -> Result<EngineConfig> {
    let mut config = match settings {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(threshold) = threshold {
        config.display_threshold = threshold;
        config.validate()?;
    }
    Ok(config)
}

/// Parse repeated `--set LABEL=VALUE` arguments into edit pairs.
fn parse_edits(edits: &[String]) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::with_capacity(edits.len());
    for edit in edits {
        let Some((label, value)) = edit.split_once('=') else {
            bail!("invalid edit {edit:?}, expected LABEL=VALUE");
        };
        pairs.push((label.to_owned(), value.to_owned()));
    }
    Ok(pairs)
}

fn reconcile_command(
    inputs: &[PathBuf],
    settings: Option<&Path>,
    threshold: Option<f64>,
    edits: &[String],
    as_json: bool,
    full_record: bool,
) -> Result<()> {
    let config = load_config(settings, threshold)?;
    let edits = parse_edits(edits)?;

    let mut log = CaptureLog::new(config);
    for path in inputs {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read capture file {}", path.display()))?;
        let payload: Value = serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON in capture file {}", path.display()))?;
        log.submit(&payload);
    }
    if !edits.is_empty() {
        log.apply_edits(&edits);
    }
    for line in log.error_lines() {
        eprintln!("{line}");
    }

    if full_record {
        println!("{}", serde_json::to_string_pretty(&log.reconcile())?);
        return Ok(());
    }

    let rows = log.project();
    if as_json {
        let rows: Vec<Value> = rows
            .iter()
            .map(|row| {
                json!({
                    "key": row.key.as_str(),
                    "label": row.label,
                    "value": row.value,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("No fields cleared the display threshold.");
    } else {
        let width = rows.iter().map(|row| row.label.len()).max().unwrap_or(0);
        for row in &rows {
            println!("{:<width$}  {}", row.label, row.value);
        }
    }
    Ok(())
}

fn fields_command(as_json: bool) -> Result<()> {
    let config = EngineConfig::default();
    if as_json {
        let rows: Vec<Value> = FieldKey::ALL
            .iter()
            .map(|key| {
                json!({
                    "key": key.as_str(),
                    "label": display_label(&config, *key),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let width = FieldKey::ALL
            .iter()
            .map(|key| key.as_str().len())
            .max()
            .unwrap_or(0);
        for key in FieldKey::ALL {
            println!("{:<width$}  {}", key.as_str(), display_label(&config, key));
        }
    }
    Ok(())
}
