//! `repair`: a thin command-line front end over the Tabular Adapter.
//!
//! `repair --in <path> --out <path> --schema <name> [--tenant <id>]` reads a
//! CSV file, repairs it against a bootstrap schema, and writes the
//! schema-ordered result. Exit `0` on success, `1` on unknown schema or
//! unreadable input.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use repair_core::schema::SchemaRegistry;

/// Repair a delimited file against a named schema.
#[derive(Parser)]
#[command(name = "repair", version, about)]
struct Args {
    /// Path to the input CSV file.
    #[arg(long = "in")]
    input: PathBuf,

    /// Path to write the repaired CSV file.
    #[arg(long = "out")]
    output: PathBuf,

    /// Name of a bootstrap schema (`contacts`, `transactions`, `products`).
    #[arg(long)]
    schema: String,

    /// Tenant identifier, threaded through to the summary for observability
    /// only; it has no effect on repair semantics.
    #[arg(long)]
    tenant: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "repair failed");
            eprintln!("repair: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let registry = SchemaRegistry::bootstrap();
    let schema = registry
        .get(&args.schema)
        .ok_or_else(|| anyhow::anyhow!("unsupported_schema:{}", args.schema))?;

    let input = std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;

    let result = repair_tabular::repair_csv(schema, &input)
        .map_err(|err| anyhow::anyhow!(err))
        .context("repairing input")?;

    std::fs::write(&args.output, &result.output_csv).with_context(|| format!("writing {}", args.output.display()))?;

    if let Some(tenant) = &args.tenant {
        tracing::info!(tenant, "tenant accepted, no effect on repair semantics");
    }
    tracing::info!(
        rows_in = result.repair.summary.rows_in,
        rows_out = result.repair.summary.rows_out,
        errors = result.repair.summary.error_counts.values().sum::<usize>(),
        "repair complete"
    );

    if result.repair.summary.rows_in == 0 {
        bail!("unreadable_input: no data rows in {}", args.input.display());
    }

    Ok(())
}
