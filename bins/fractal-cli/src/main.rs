//! Fractal Governance reporting binary.
//!
//! Reads an attendance table (a JSON array of attendance records), runs the
//! batch pipeline and prints the derived tables as JSON on stdout. Logs go
//! to stderr.

mod settings;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use fractal_core::timeline::meeting_timeline;
use fractal_core::types::{AttendanceRecord, AttendanceTable, MeetingId};
use fractal_supply::TokenSupplySchedule;

/// Fractal Governance token emission and Respect allocation.
#[derive(Parser, Debug)]
#[command(name = "fractal-cli", version)]
struct Cli {
    /// Configuration file (TOML). Defaults to `fractal/config.toml` under
    /// the user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// Pretty-print the JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the whole pipeline over an attendance table.
    Run(RunArgs),
    /// Print the token supply table.
    Supply(RangeArgs),
    /// Print the meeting id to date mapping.
    Timeline(RangeArgs),
    /// Print the effective configuration.
    Settings,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Attendance table as a JSON array of records.
    #[arg(short, long)]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct RangeArgs {
    /// Last meeting id to include.
    #[arg(short, long)]
    max_meeting_id: MeetingId,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let config = settings::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Run(args) => {
            let table = read_table(&args.input)?;
            let output = fractal_addendum::run(&table, &config).context("Pipeline failed")?;
            print_json(&output, cli.pretty)
        }
        Commands::Supply(args) => {
            let schedule = TokenSupplySchedule::new(config.supply.clone())
                .context("Invalid supply parameters")?;
            let table = schedule
                .table(args.max_meeting_id)
                .context("Failed to compute token supply")?;
            print_json(&table, cli.pretty)
        }
        Commands::Timeline(args) => {
            let timeline = meeting_timeline(args.max_meeting_id)
                .context("Failed to compute meeting timeline")?;
            print_json(&timeline, cli.pretty)
        }
        Commands::Settings => print_json(&config, cli.pretty),
    }
}

fn read_table(path: &Path) -> Result<AttendanceTable> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let records: Vec<AttendanceRecord> = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse attendance table {}", path.display()))?;
    info!(rows = records.len(), path = %path.display(), "attendance table loaded");
    AttendanceTable::new(records).context("Invalid attendance table")
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let mut stdout = io::stdout().lock();
    let written = if pretty {
        serde_json::to_writer_pretty(&mut stdout, value)
    } else {
        serde_json::to_writer(&mut stdout, value)
    };
    written.context("Failed to write JSON output")?;
    writeln!(stdout).context("Failed to write JSON output")?;
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value
/// defaults to human-readable text. `RUST_LOG` takes precedence over
/// `level_str`. Everything is written to stderr.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(io::stderr))
            .init();
    }
}
