// src/queue.rs
//! The durable results queue: append-only newline-delimited JSON,
//! deduplicated by ticker.
//!
//! This is the only module permitted to mutate the queue file, and it only
//! ever appends; existing lines are never rewritten or removed. Duplicate
//! tickers are silently dropped, malformed lines are skipped on read.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::snapshot::ascii_json;

/// One persisted idea, one JSON object per queue line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueRecord {
    pub ticker: String,
    pub company: String,
    pub exchange: String,
    pub sector: String,
    pub industry: String,
    pub market: String,
    pub exchange_country: String,
    pub thesis: String,
}

/// Tickers already present in the queue. Absent file -> empty set;
/// malformed or non-object lines are skipped, never fatal.
pub fn read_existing_tickers(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading queue at {}", path.display()))?;

    let mut tickers = HashSet::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            debug!(path = %path.display(), "skipping malformed queue line");
            continue;
        };
        let Some(ticker) = value.get("ticker").and_then(|t| t.as_str()) else {
            continue;
        };
        let ticker = ticker.trim().to_ascii_uppercase();
        if !ticker.is_empty() {
            tickers.insert(ticker);
        }
    }
    Ok(tickers)
}

/// Append new records, skipping empty and already-present tickers.
/// Returns the number actually appended; 0 means "nothing new" and leaves
/// the file untouched (or absent if it never existed).
pub fn append_ideas(path: &Path, ideas: &[QueueRecord]) -> Result<usize> {
    let mut existing = read_existing_tickers(path)?;

    let mut staged = Vec::new();
    for idea in ideas {
        let ticker = idea.ticker.trim().to_ascii_uppercase();
        if ticker.is_empty() || existing.contains(&ticker) {
            continue;
        }
        let mut record = idea.clone();
        record.ticker = ticker.clone();
        staged.push(ascii_json(&record)?);
        existing.insert(ticker);
    }

    if staged.is_empty() {
        return Ok(0);
    }
    append_lines(path, &staged)?;
    Ok(staged.len())
}

fn append_lines(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating queue directory {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening queue at {}", path.display()))?;

    // A non-empty file must end in a newline before we append.
    let len = file.metadata()?.len();
    let mut needs_separator = false;
    if len > 0 {
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        needs_separator = last != [b'\n'];
    }

    if needs_separator {
        file.write_all(b"\n")?;
    }
    for line in lines {
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

fn canonical_or_self(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Delete transient run artifacts (the snapshot, the selection input) after
/// a successful append, but only paths inside the queue's run directory
/// and distinct from the queue file itself. Failures are logged and never
/// mask the append's success. `keep` opts out entirely.
pub fn cleanup_artifacts(
    output_json: &Path,
    selection: Option<&Path>,
    queue: &Path,
    keep: bool,
) -> Vec<PathBuf> {
    if keep {
        return Vec::new();
    }

    let queue_path = canonical_or_self(queue);
    let run_dir = queue_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut cleaned = Vec::new();
    let snapshot_path = canonical_or_self(output_json);
    if snapshot_path.exists()
        && is_within(&snapshot_path, &run_dir)
        && snapshot_path != queue_path
    {
        remove_artifact(&snapshot_path, &mut cleaned);
    }

    if let Some(selection) = selection {
        let selection_path = canonical_or_self(selection);
        if selection_path.exists()
            && is_within(&selection_path, &run_dir)
            && selection_path != queue_path
            && selection_path != snapshot_path
        {
            remove_artifact(&selection_path, &mut cleaned);
        }
    }
    cleaned
}

fn remove_artifact(path: &Path, cleaned: &mut Vec<PathBuf>) {
    match fs::remove_file(path) {
        Ok(()) => cleaned.push(path.to_path_buf()),
        Err(err) => warn!(error = %err, path = %path.display(), "failed to remove run artifact"),
    }
}
