// src/pipeline.rs
//! End-to-end orchestration: preference gate, path resolution, fetch and
//! merge, score and rank, snapshot, then (optionally) selection, queue
//! append, and artifact cleanup.
//!
//! Ordering matters: every validation failure (bad run id, conflicting
//! paths, disallowed market) aborts before the first fetch; a selection
//! failure aborts after the snapshot is written and does not roll it back.

use std::io::Read;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;

use crate::aggregate::merge_exchange_rows;
use crate::candidate::{collect_candidates, MARKET};
use crate::config::AppConfig;
use crate::fetch::{PageFetcher, BASE_FILTERS, EXCHANGES, RESULT_ORDER};
use crate::paths::{resolve_run_paths, RunPathArgs};
use crate::prefs::Preferences;
use crate::queue::{append_ideas, cleanup_artifacts, QueueRecord};
use crate::scoring::{rank_candidates, select_ideas, ScoreThresholds};
use crate::selection::{normalize_selected, read_selection_payload, resolve_selection_path};
use crate::snapshot::{
    now_utc_seconds, write_snapshot, PreferencesInfo, Snapshot, SnapshotFilters, Universe,
};
use crate::table::RawRow;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum candidates kept in the snapshot, applied after ranking.
    pub limit: usize,
    /// Maximum selected ideas appended to the queue.
    pub idea_limit: usize,
    pub max_pages_per_exchange: u32,
    pub preferences_path: Option<String>,
    pub ignore_preferences: bool,
    pub paths: RunPathArgs,
    /// Path to a selection document, or `-` for stdin.
    pub selection_json: Option<String>,
    /// Select by thresholds instead of an external selection document.
    pub auto_select: bool,
    pub fetch_only: bool,
    pub keep_artifacts: bool,
    pub thresholds: ScoreThresholds,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            limit: 150,
            idea_limit: 25,
            max_pages_per_exchange: 4,
            preferences_path: None,
            ignore_preferences: false,
            paths: RunPathArgs::default(),
            selection_json: None,
            auto_select: false,
            fetch_only: false,
            keep_artifacts: false,
            thresholds: ScoreThresholds::default(),
        }
    }
}

/// The structured summary printed to stdout after a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub output_json: String,
    pub ideas_log: String,
    pub screen_run_id: String,
    pub candidate_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appended_count: Option<usize>,
    pub fetch_only: bool,
    pub selection_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts_cleaned: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_artifacts: Option<bool>,
}

pub fn run(
    config: &AppConfig,
    options: &PipelineOptions,
    fetcher: &dyn PageFetcher,
    selection_input: &mut dyn Read,
) -> Result<RunSummary> {
    // Preferences and the market gate come first; a disallowed market fails
    // the run before any fetch.
    let preferences_path = options
        .preferences_path
        .as_deref()
        .map(|p| config.resolve_path(p))
        .unwrap_or_else(|| config.default_preferences_path());
    let preferences = if options.ignore_preferences {
        None
    } else {
        Preferences::load(&preferences_path)?
    };

    if let Some(prefs) = &preferences {
        if !prefs.market_is_allowed(MARKET) {
            bail!(
                "market '{MARKET}' is not allowed by preferences at {}",
                preferences_path.display()
            );
        }
    }

    let run_paths = resolve_run_paths(config, &options.paths)?;
    info!(run_id = %run_paths.run_id, "screen run resolved");

    // Fetch and reconcile every exchange, in fixed order.
    let mut raw_rows: Vec<RawRow> = Vec::new();
    for (exchange_name, exchange_filter) in EXCHANGES {
        let mut rows = merge_exchange_rows(
            fetcher,
            exchange_name,
            exchange_filter,
            options.max_pages_per_exchange,
        )?;
        raw_rows.append(&mut rows);
    }

    let mut candidates = collect_candidates(&raw_rows);
    if let Some(prefs) = &preferences {
        candidates.retain(|c| prefs.matches_sector_industry(&c.sector, &c.industry));
    }
    let mut candidates = rank_candidates(candidates, &options.thresholds);
    candidates.truncate(options.limit);
    info!(candidates = candidates.len(), "screen complete");

    let snapshot = Snapshot {
        fetched_at_utc: now_utc_seconds(),
        screen_run_id: run_paths.run_id.to_string(),
        output_json: run_paths.output_json.display().to_string(),
        universe: Universe {
            country: "USA".to_string(),
            exchanges: EXCHANGES.iter().map(|(name, _)| name.to_string()).collect(),
        },
        filters: SnapshotFilters {
            base_filters: BASE_FILTERS.iter().map(|f| f.to_string()).collect(),
            max_pages_per_exchange: options.max_pages_per_exchange,
            order: RESULT_ORDER.to_string(),
        },
        preferences: PreferencesInfo {
            applied: !options.ignore_preferences,
            path: preferences
                .as_ref()
                .map(|_| config.scoped_path(&preferences_path)),
        },
        candidate_count: candidates.len(),
        candidates: candidates.clone(),
    };
    write_snapshot(&run_paths.output_json, &snapshot)?;

    let selecting = options.selection_json.is_some() || options.auto_select;
    if options.fetch_only || !selecting {
        return Ok(RunSummary {
            output_json: run_paths.output_json.display().to_string(),
            ideas_log: run_paths.queue.display().to_string(),
            screen_run_id: run_paths.run_id.to_string(),
            candidate_count: candidates.len(),
            selected_count: None,
            appended_count: None,
            fetch_only: options.fetch_only,
            selection_applied: false,
            artifacts_cleaned: None,
            keep_artifacts: None,
        });
    }

    let (selected, selection_path) = if let Some(arg) = &options.selection_json {
        let payload = read_selection_payload(config, arg, selection_input)
            .context("failed to read --selection-json")?;
        let normalized = normalize_selected(&payload, &candidates, options.idea_limit);
        if normalized.is_empty() {
            bail!(
                "no valid selected ideas after normalization; ensure the selection \
                 uses candidate tickers and includes non-empty thesis values"
            );
        }
        (normalized, resolve_selection_path(config, arg))
    } else {
        let ideas = select_ideas(&candidates, &options.thresholds, options.idea_limit);
        if ideas.is_empty() {
            bail!("no candidates satisfied the selection thresholds");
        }
        (ideas.into_iter().map(QueueRecord::from).collect(), None)
    };

    let appended = append_ideas(&run_paths.queue, &selected)?;
    let cleaned = cleanup_artifacts(
        &run_paths.output_json,
        selection_path.as_deref(),
        &run_paths.queue,
        options.keep_artifacts,
    );
    info!(appended, cleaned = cleaned.len(), "queue updated");

    Ok(RunSummary {
        output_json: run_paths.output_json.display().to_string(),
        ideas_log: run_paths.queue.display().to_string(),
        screen_run_id: run_paths.run_id.to_string(),
        candidate_count: candidates.len(),
        selected_count: Some(selected.len()),
        appended_count: Some(appended),
        fetch_only: false,
        selection_applied: true,
        artifacts_cleaned: Some(cleaned.iter().map(|p| p.display().to_string()).collect()),
        keep_artifacts: Some(options.keep_artifacts),
    })
}
