// src/paths.rs
//! Per-run artifact path resolution: the candidate snapshot, the results
//! queue, and the one run id both must agree on.
//!
//! Every validation here is fatal and runs before any fetch: a malformed
//! run id, or a supplied id conflicting with one embedded in a path, aborts
//! the run with an error naming the offending value.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::config::AppConfig;
use crate::run_id::{self, RunId};

pub const CANDIDATES_FILENAME: &str = "screener-candidates.json";
pub const QUEUE_FILENAME: &str = "screener-results.jsonl";

/// Caller-supplied path/identity overrides, all optional.
#[derive(Debug, Clone, Default)]
pub struct RunPathArgs {
    pub output_json: Option<String>,
    pub ideas_log: Option<String>,
    pub screen_run_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunPaths {
    pub output_json: PathBuf,
    pub queue: PathBuf,
    pub run_id: RunId,
}

/// Extension-less paths that don't already name the expected file are
/// treated as directories.
fn looks_like_directory(path: &Path, expected_filename: &str) -> bool {
    path.extension().is_none()
        && path.file_name().and_then(|name| name.to_str()) != Some(expected_filename)
}

fn parent_or_cwd(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

pub fn resolve_run_paths(config: &AppConfig, args: &RunPathArgs) -> Result<RunPaths> {
    let (output_json, run_id) = resolve_output_json(config, args)?;
    let queue = resolve_queue_path(config, args, &output_json, &run_id)?;
    // Writing the snapshot must never clobber the durable queue.
    if output_json == queue {
        bail!(
            "--output-json and the results queue resolve to the same file: {}",
            queue.display()
        );
    }
    Ok(RunPaths {
        output_json,
        queue,
        run_id,
    })
}

fn resolve_output_json(config: &AppConfig, args: &RunPathArgs) -> Result<(PathBuf, RunId)> {
    let requested = args
        .screen_run_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(requested) = requested {
        RunId::validate(requested, "--screen-run-id")?;
    }

    let mut output_path = if let Some(output) = &args.output_json {
        config.resolve_path(output)
    } else if let Some(legacy) = &args.ideas_log {
        // Legacy callers point --ideas-log at the queue; the snapshot goes
        // next to it.
        let legacy_path = config.resolve_path(legacy);
        if looks_like_directory(&legacy_path, QUEUE_FILENAME) {
            legacy_path.join(CANDIDATES_FILENAME)
        } else {
            parent_or_cwd(&legacy_path).join(CANDIDATES_FILENAME)
        }
    } else {
        let run_id = match requested {
            Some(requested) => RunId::parse(requested, "--screen-run-id")?,
            None => RunId::mint(),
        };
        config
            .idea_screens_root()
            .join(run_id.as_str())
            .join(CANDIDATES_FILENAME)
    };

    if looks_like_directory(&output_path, CANDIDATES_FILENAME) {
        output_path = output_path.join(CANDIDATES_FILENAME);
    }

    let embedded = run_id::extract_from_path(&output_path);
    if let Some(embedded) = embedded.as_deref() {
        RunId::validate(embedded, &format!("path {}", output_path.display()))?;
        if let Some(requested) = requested {
            if requested != embedded {
                bail!(
                    "--screen-run-id '{requested}' does not match the run folder \
                     '{embedded}' in --output-json/--ideas-log"
                );
            }
        }
    }

    let resolved = match (requested, embedded) {
        (Some(requested), _) => RunId::parse(requested, "screen run id")?,
        (None, Some(embedded)) => RunId::parse(&embedded, "screen run id")?,
        (None, None) => RunId::mint(),
    };
    Ok((output_path, resolved))
}

fn resolve_queue_path(
    config: &AppConfig,
    args: &RunPathArgs,
    output_json: &Path,
    run_id: &RunId,
) -> Result<PathBuf> {
    let path = if let Some(legacy) = &args.ideas_log {
        let mut path = config.resolve_path(legacy);
        if looks_like_directory(&path, QUEUE_FILENAME) {
            path = path.join(QUEUE_FILENAME);
        } else if path.file_name().and_then(|name| name.to_str()) == Some(CANDIDATES_FILENAME) {
            path = parent_or_cwd(&path).join(QUEUE_FILENAME);
        }
        path
    } else {
        parent_or_cwd(output_json).join(QUEUE_FILENAME)
    };

    if let Some(embedded) = run_id::extract_from_path(&path) {
        RunId::validate(&embedded, &format!("path {}", path.display()))?;
        if embedded != run_id.as_str() {
            bail!(
                "run folder '{embedded}' in results path {} does not match \
                 screen run id '{run_id}'",
                path.display()
            );
        }
    }
    Ok(path)
}
