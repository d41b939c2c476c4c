// src/snapshot.rs
//! The per-run candidate snapshot payload, plus the ASCII-escaped JSON
//! writers shared with the queue (both on-disk formats are ASCII-escaped,
//! which serde_json does not do on its own).

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub country: String,
    pub exchanges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFilters {
    pub base_filters: Vec<String>,
    pub max_pages_per_exchange: u32,
    pub order: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferencesInfo {
    pub applied: bool,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub fetched_at_utc: String,
    pub screen_run_id: String,
    pub output_json: String,
    pub universe: Universe,
    pub filters: SnapshotFilters,
    pub preferences: PreferencesInfo,
    pub candidate_count: usize,
    pub candidates: Vec<Candidate>,
}

/// Current UTC time at seconds precision, RFC 3339.
pub fn now_utc_seconds() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn escape_non_ascii(json: &str) -> String {
    // serde_json only emits non-ASCII inside string literals, so a blanket
    // character pass is safe.
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                let _ = write!(&mut out, "\\u{unit:04x}");
            }
        }
    }
    out
}

/// Compact JSON with all non-ASCII characters `\u`-escaped.
pub fn ascii_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("serializing JSON")?;
    Ok(escape_non_ascii(&json))
}

/// Pretty JSON with all non-ASCII characters `\u`-escaped.
pub fn ascii_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string_pretty(value).context("serializing JSON")?;
    Ok(escape_non_ascii(&json))
}

/// Write the snapshot, creating parent directories, with a trailing newline.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating snapshot directory {}", parent.display()))?;
    }
    let mut body = ascii_json_pretty(snapshot)?;
    body.push('\n');
    fs::write(path, body).with_context(|| format!("writing snapshot to {}", path.display()))
}
