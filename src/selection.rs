// src/selection.rs
//! Selected-idea input: JSON from a file or stdin, optionally wrapped in a
//! markdown code fence, normalized against this run's candidate set.
//!
//! Accepted shapes: `{"ideas": [{...}, ...]}` or a bare array of objects.
//! Non-object items are dropped; anything else is a hard error.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use crate::candidate::{Candidate, EXCHANGE_COUNTRY, MARKET};
use crate::config::AppConfig;
use crate::parse::clean_text;
use crate::queue::QueueRecord;

pub const STDIN_SENTINEL: &str = "-";

/// The on-disk selection path, if the argument names one (stdin doesn't).
pub fn resolve_selection_path(config: &AppConfig, arg: &str) -> Option<PathBuf> {
    (arg != STDIN_SENTINEL).then(|| config.resolve_path(arg))
}

/// Strip a fenced code-block wrapper (```...```) around the JSON text.
pub fn strip_markdown_fence(text: &str) -> String {
    let stripped = text.trim();
    if !stripped.starts_with("```") {
        return stripped.to_string();
    }
    let mut lines: Vec<&str> = stripped.lines().collect();
    if lines
        .first()
        .map(|line| line.starts_with("```"))
        .unwrap_or(false)
    {
        lines.remove(0);
    }
    if lines.last().map(|line| line.trim() == "```").unwrap_or(false) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

fn objects_only(items: Vec<Value>) -> Vec<Map<String, Value>> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

/// Read and shape-check the selection payload. `arg` is a path, or `-` to
/// read the provided input stream.
pub fn read_selection_payload(
    config: &AppConfig,
    arg: &str,
    input: &mut dyn Read,
) -> Result<Vec<Map<String, Value>>> {
    let raw = if arg == STDIN_SENTINEL {
        let mut buf = String::new();
        input
            .read_to_string(&mut buf)
            .context("reading selection JSON from stdin")?;
        buf
    } else {
        let path = config.resolve_path(arg);
        fs::read_to_string(&path)
            .with_context(|| format!("reading selection JSON from {}", path.display()))?
    };

    let payload_text = strip_markdown_fence(&raw);
    let payload: Value =
        serde_json::from_str(&payload_text).context("parsing selection JSON")?;

    match payload {
        Value::Object(mut object) => match object.remove("ideas") {
            Some(Value::Array(items)) => Ok(objects_only(items)),
            _ => bail!("selection payload object must include an 'ideas' list"),
        },
        Value::Array(items) => Ok(objects_only(items)),
        _ => bail!("selection payload must be a JSON object or array"),
    }
}

fn text_field<'a>(item: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str)
}

/// Normalize selected items into queue records: the ticker must name one of
/// this run's candidates, the thesis must be non-empty, descriptive fields
/// fall back to the candidate's. Deduplicated in input order, truncated at
/// `idea_limit`.
pub fn normalize_selected(
    payload: &[Map<String, Value>],
    candidates: &[Candidate],
    idea_limit: usize,
) -> Vec<QueueRecord> {
    let by_ticker: HashMap<&str, &Candidate> = candidates
        .iter()
        .map(|c| (c.ticker.as_str(), c))
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut normalized = Vec::new();

    for item in payload {
        let ticker = clean_text(text_field(item, "ticker")).to_ascii_uppercase();
        if ticker.is_empty() || seen.contains(&ticker) {
            continue;
        }
        let Some(candidate) = by_ticker.get(ticker.as_str()) else {
            continue;
        };
        let thesis = clean_text(text_field(item, "thesis"));
        if thesis.is_empty() {
            continue;
        }

        let pick = |key: &str, fallback: &str| {
            let value = clean_text(text_field(item, key));
            if value.is_empty() {
                fallback.to_string()
            } else {
                value
            }
        };

        normalized.push(QueueRecord {
            ticker: ticker.clone(),
            company: pick("company", &candidate.company),
            exchange: pick("exchange", &candidate.exchange),
            sector: pick("sector", &candidate.sector),
            industry: pick("industry", &candidate.industry),
            market: MARKET.to_string(),
            exchange_country: EXCHANGE_COUNTRY.to_string(),
            thesis,
        });
        seen.insert(ticker);
        if normalized.len() >= idea_limit {
            break;
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Metrics;
    use std::io::Cursor;
    use std::path::Path;

    fn config() -> AppConfig {
        AppConfig {
            base_dir: Path::new("/repo").to_path_buf(),
            data_root: Path::new("/repo/data").to_path_buf(),
        }
    }

    fn candidate(ticker: &str) -> Candidate {
        Candidate {
            ticker: ticker.to_string(),
            company: format!("{ticker} Inc"),
            exchange: "NYSE".to_string(),
            sector: "Industrials".to_string(),
            industry: "Machinery".to_string(),
            market: MARKET.to_string(),
            exchange_country: EXCHANGE_COUNTRY.to_string(),
            metrics: Metrics::default(),
        }
    }

    #[test]
    fn fence_wrapper_is_stripped() {
        let fenced = "```json\n{\"ideas\": []}\n```";
        assert_eq!(strip_markdown_fence(fenced), "{\"ideas\": []}");
        assert_eq!(strip_markdown_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn stdin_sentinel_reads_the_stream() {
        let mut input = Cursor::new(b"{\"ideas\": [{\"ticker\": \"AAA\"}]}".to_vec());
        let payload = read_selection_payload(&config(), STDIN_SENTINEL, &mut input).unwrap();
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0]["ticker"], "AAA");
    }

    #[test]
    fn bare_array_is_accepted_and_non_objects_dropped() {
        let mut input = Cursor::new(b"[{\"ticker\": \"AAA\"}, 42, \"x\"]".to_vec());
        let payload = read_selection_payload(&config(), STDIN_SENTINEL, &mut input).unwrap();
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn object_without_ideas_list_is_an_error() {
        let mut input = Cursor::new(b"{\"picks\": []}".to_vec());
        assert!(read_selection_payload(&config(), STDIN_SENTINEL, &mut input).is_err());
        let mut scalar = Cursor::new(b"42".to_vec());
        assert!(read_selection_payload(&config(), STDIN_SENTINEL, &mut scalar).is_err());
    }

    fn item(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn normalization_fills_fields_from_the_candidate() {
        let candidates = vec![candidate("AAA")];
        let payload = vec![item(&[("ticker", "aaa"), ("thesis", "Cheap cash machine.")])];
        let records = normalize_selected(&payload, &candidates, 10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ticker, "AAA");
        assert_eq!(records[0].company, "AAA Inc");
        assert_eq!(records[0].sector, "Industrials");
        assert_eq!(records[0].thesis, "Cheap cash machine.");
    }

    #[test]
    fn unknown_tickers_empty_theses_and_duplicates_are_dropped() {
        let candidates = vec![candidate("AAA"), candidate("BBB")];
        let payload = vec![
            item(&[("ticker", "ZZZ"), ("thesis", "not a candidate")]),
            item(&[("ticker", "AAA"), ("thesis", "")]),
            item(&[("ticker", "BBB"), ("thesis", "keep")]),
            item(&[("ticker", "BBB"), ("thesis", "duplicate")]),
        ];
        let records = normalize_selected(&payload, &candidates, 10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ticker, "BBB");
        assert_eq!(records[0].thesis, "keep");
    }

    #[test]
    fn idea_limit_truncates_in_input_order() {
        let candidates = vec![candidate("AAA"), candidate("BBB"), candidate("CCC")];
        let payload = vec![
            item(&[("ticker", "CCC"), ("thesis", "first")]),
            item(&[("ticker", "AAA"), ("thesis", "second")]),
            item(&[("ticker", "BBB"), ("thesis", "third")]),
        ];
        let records = normalize_selected(&payload, &candidates, 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ticker, "CCC");
        assert_eq!(records[1].ticker, "AAA");
    }
}
