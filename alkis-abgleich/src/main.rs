//! CLI entry point for alkis-abgleich

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use alkis_abgleich::cli::{self, RunArgs};

// Load .env at startup
fn load_env() {
    // Look for .env in the current directory or next to the binary
    if dotenvy::dotenv().is_err() {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Compare ALKIS cadastral addresses against OSM per German state
#[derive(Parser)]
#[command(name = "alkis-abgleich")]
#[command(author, version)]
#[command(about = "Compare ALKIS cadastral addresses against OSM per German state")]
#[command(
    long_about = "Reconciles the authoritative ALKIS address dataset against OSM for each state:\napplies manual corrections, expands composite house numbers, matches by\nnormalized key plus distance, and writes per-district missing-address exports\nand a coverage history."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    run: RunArgs,
}

fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    info!(date = %cli.run.date, "Starting reconciliation run");
    cli::cmd_run(cli.run)
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
