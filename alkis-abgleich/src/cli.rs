//! CLI argument definitions and the run command
//!
//! One command: reconcile every (or a selected set of) states. States are
//! isolated from each other; a failing state is logged and the run
//! continues.

use std::path::{Path, PathBuf};
use std::time::Instant;

use abgleich::matcher;
use anyhow::{Context, Result};
use clap::Args;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::report::RunReport;
use crate::state::{process_state, StateConfig, StateSummary};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Snapshot date label for the history (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: String,

    /// Data directory containing states/<state>/ inputs
    /// (default: $ABGLEICH_DATA_DIR or ./data)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Output directory (default: $ABGLEICH_OUT_DIR or ./out)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// States to process (default: every directory under data-dir/states)
    #[arg(long, value_delimiter = ',')]
    pub states: Vec<String>,

    /// Additionally propagate total/missing baseline shifts to all
    /// historical entries (after a change in address-processing logic)
    #[arg(long)]
    pub full_delta: bool,

    /// Matcher chunk size (memory/overhead trade-off, not correctness)
    #[arg(long, default_value_t = matcher::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Match distance tolerance in meters
    #[arg(long, default_value_t = matcher::DEFAULT_MAX_DISTANCE)]
    pub max_distance: f64,

    /// Maximum number of states processed concurrently
    #[arg(long, alias = "threads")]
    pub jobs: Option<usize>,
}

/// Executes the reconciliation run
pub fn cmd_run(args: RunArgs) -> Result<()> {
    validate_date_format(&args.date)?;

    let data_dir = resolve_dir(args.data_dir, "ABGLEICH_DATA_DIR", "data");
    let out_dir = resolve_dir(args.out_dir, "ABGLEICH_OUT_DIR", "out");

    let states = if args.states.is_empty() {
        discover_states(&data_dir)?
    } else {
        args.states.clone()
    };
    if states.is_empty() {
        anyhow::bail!("No states found under {}", data_dir.join("states").display());
    }

    let jobs = args.jobs.unwrap_or(1).max(1);

    println!("=== Abgleich {} ===", args.date);
    println!("Data: {}", data_dir.display());
    println!("Output: {}", out_dir.display());
    println!("States: {}", states.join(", "));
    println!("Full delta: {}", args.full_delta);
    println!("Chunk size: {}", args.chunk_size);
    println!("Jobs: {jobs}");

    let config = StateConfig {
        data_dir,
        out_dir: out_dir.clone(),
        date: args.date.clone(),
        full_delta: args.full_delta,
        chunk_size: args.chunk_size,
        max_distance: args.max_distance,
    };

    let started = Instant::now();
    let outcomes = run_states(&states, &config, jobs)?;

    let mut report = RunReport::new(&args.date);
    for (state, outcome) in outcomes {
        match outcome {
            Ok(summary) => {
                info!(state = %summary.state, "state processed");
                report.record_success(summary);
            }
            Err(e) => {
                warn!(state = %state, error = %e, "state failed, continuing");
                report.record_failure(&state, &format!("{e:#}"));
            }
        }
    }
    report.set_duration(started.elapsed());
    report.finalize();
    report.display();

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    report.save_to_file(&out_dir.join("report.json"))?;

    if report.states_processed == 0 {
        anyhow::bail!("Nothing processed: all {} states failed", states.len());
    }
    Ok(())
}

type StateOutcome = (String, Result<StateSummary>);

fn run_states(states: &[String], config: &StateConfig, jobs: usize) -> Result<Vec<StateOutcome>> {
    if jobs <= 1 {
        return Ok(states
            .iter()
            .map(|state| (state.clone(), process_state(state, config)))
            .collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to build worker pool")?;
    Ok(pool.install(|| {
        states
            .par_iter()
            .map(|state| (state.clone(), process_state(state, config)))
            .collect()
    }))
}

/// CLI flag, then environment, then default
fn resolve_dir(flag: Option<PathBuf>, env_var: &str, default: &str) -> PathBuf {
    flag.unwrap_or_else(|| {
        std::env::var(env_var)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(default))
    })
}

/// Every directory under `<data-dir>/states`, sorted
fn discover_states(data_dir: &Path) -> Result<Vec<String>> {
    let states_dir = data_dir.join("states");
    if !states_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut states = Vec::new();
    for entry in std::fs::read_dir(&states_dir)
        .with_context(|| format!("Failed to read {}", states_dir.display()))?
    {
        let entry = entry?;
        if entry.path().is_dir() {
            if let Ok(name) = entry.file_name().into_string() {
                states.push(name);
            }
        }
    }
    states.sort();
    Ok(states)
}

fn validate_date_format(date: &str) -> Result<()> {
    if date.len() != 10 || date.chars().nth(4) != Some('-') || date.chars().nth(7) != Some('-') {
        anyhow::bail!(
            "Invalid date format: '{}'. Expected YYYY-MM-DD (e.g., 2026-08-01)",
            date
        );
    }

    let year: u32 = date[0..4]
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid year in date: {}", date))?;
    let month: u32 = date[5..7]
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid month in date: {}", date))?;
    let day: u32 = date[8..10]
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid day in date: {}", date))?;

    if !(1900..=2100).contains(&year) {
        anyhow::bail!("Year out of range: {}", year);
    }
    if !(1..=12).contains(&month) {
        anyhow::bail!("Month must be 01-12, got: {:02}", month);
    }
    if !(1..=31).contains(&day) {
        anyhow::bail!("Day must be 01-31, got: {:02}", day);
    }

    Ok(())
}
