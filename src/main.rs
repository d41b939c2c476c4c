// src/main.rs
//! CLI entrypoint: fetch a broad US universe snapshot from the screener and
//! append selected ideas to the results queue.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{ensure, Result};
use clap::Parser;

use idea_screener::config::AppConfig;
use idea_screener::fetch::ScreenerClient;
use idea_screener::paths::RunPathArgs;
use idea_screener::pipeline::{self, PipelineOptions};
use idea_screener::run_id::RunId;
use idea_screener::scoring::{
    ScoreThresholds, MAX_DEBT_TO_EQUITY_DEFAULT, MAX_PE_DEFAULT, MIN_ROE_DEFAULT,
};
use idea_screener::snapshot::ascii_json;

#[derive(Parser, Debug)]
#[command(
    name = "idea-screener",
    version,
    about = "Fetch a broad US universe snapshot from the screener and append \
             selected ideas to the results queue."
)]
struct Cli {
    /// Maximum number of candidates to keep in the snapshot.
    #[arg(long, default_value_t = 150)]
    limit: usize,

    /// Maximum number of selected ideas to append to the queue.
    #[arg(long, default_value_t = 25)]
    idea_limit: usize,

    /// How many screener pages to scan for each exchange.
    #[arg(long, default_value_t = 4)]
    max_pages_per_exchange: u32,

    /// Delay between HTTP requests, in seconds, to reduce rate-limit risk.
    #[arg(long, default_value_t = 0.2)]
    request_delay: f64,

    /// Repository root used for resolving relative paths (default: auto-detected).
    #[arg(long)]
    base_dir: Option<String>,

    /// Override the preferences document path
    /// (default: <DATA_ROOT>/screener-preferences.toml).
    #[arg(long)]
    preferences_path: Option<String>,

    /// Skip the preference policy entirely.
    #[arg(long)]
    ignore_preferences: bool,

    /// Screen run id in strict YYYY-MM-DD-HHMMSS format.
    #[arg(long)]
    screen_run_id: Option<String>,

    /// Output path for the candidate snapshot JSON
    /// (default: <DATA_ROOT>/idea-screens/<RUN_ID>/screener-candidates.json).
    #[arg(long)]
    output_json: Option<String>,

    /// Output path for the results queue JSONL
    /// (default: <DATA_ROOT>/idea-screens/<RUN_ID>/screener-results.jsonl).
    #[arg(long)]
    ideas_log: Option<String>,

    /// Path to selected ideas JSON, or '-' for stdin.
    /// Accepted shape: {"ideas":[{"ticker","thesis",...}]}.
    #[arg(long, conflicts_with_all = ["fetch_only", "auto_select"])]
    selection_json: Option<String>,

    /// Select ideas by thresholds instead of an external selection document.
    #[arg(long, conflicts_with = "fetch_only")]
    auto_select: bool,

    /// Only fetch candidates and write the snapshot; do not touch the queue.
    #[arg(long)]
    fetch_only: bool,

    /// Keep run artifacts after a successful append (default: the run-local
    /// snapshot and selection files are cleaned up).
    #[arg(long)]
    keep_artifacts: bool,

    /// P/E ceiling for scoring and threshold selection.
    #[arg(long, default_value_t = MAX_PE_DEFAULT)]
    max_pe: f64,

    /// ROE floor (percent) for threshold selection.
    #[arg(long, default_value_t = MIN_ROE_DEFAULT)]
    min_roe: f64,

    /// Debt/equity ceiling for scoring and threshold selection.
    #[arg(long, default_value_t = MAX_DEBT_TO_EQUITY_DEFAULT)]
    max_debt_to_equity: f64,
}

fn validate(cli: &Cli) -> Result<()> {
    ensure!(cli.limit > 0, "--limit must be greater than 0");
    ensure!(cli.idea_limit > 0, "--idea-limit must be greater than 0");
    ensure!(
        cli.max_pages_per_exchange > 0,
        "--max-pages-per-exchange must be greater than 0"
    );
    ensure!(cli.request_delay >= 0.0, "--request-delay cannot be negative");
    if let Some(run_id) = cli.screen_run_id.as_deref() {
        RunId::validate(run_id, "--screen-run-id")?;
    }
    Ok(())
}

fn execute() -> Result<String> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut config = AppConfig::from_env();
    if let Some(base) = &cli.base_dir {
        let base = PathBuf::from(base);
        config.base_dir = if base.is_absolute() {
            base
        } else {
            std::env::current_dir()?.join(base)
        };
    }

    let options = PipelineOptions {
        limit: cli.limit,
        idea_limit: cli.idea_limit,
        max_pages_per_exchange: cli.max_pages_per_exchange,
        preferences_path: cli.preferences_path.clone(),
        ignore_preferences: cli.ignore_preferences,
        paths: RunPathArgs {
            output_json: cli.output_json.clone(),
            ideas_log: cli.ideas_log.clone(),
            screen_run_id: cli.screen_run_id.clone(),
        },
        selection_json: cli.selection_json.clone(),
        auto_select: cli.auto_select,
        fetch_only: cli.fetch_only,
        keep_artifacts: cli.keep_artifacts,
        thresholds: ScoreThresholds {
            max_pe: cli.max_pe,
            min_roe: cli.min_roe,
            max_debt_to_equity: cli.max_debt_to_equity,
        },
    };

    let client = ScreenerClient::new(Duration::from_secs_f64(cli.request_delay))?;
    let summary = pipeline::run(&config, &options, &client, &mut io::stdin().lock())?;
    ascii_json(&summary)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match execute() {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
