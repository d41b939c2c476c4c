// tests/queue_idempotence.rs
//
// The results queue is append-only NDJSON, deduplicated by ticker across
// invocations. Cleanup never touches the queue file itself.

use std::fs;
use std::path::Path;

use idea_screener::queue::{append_ideas, cleanup_artifacts, read_existing_tickers, QueueRecord};

fn record(ticker: &str, thesis: &str) -> QueueRecord {
    QueueRecord {
        ticker: ticker.to_string(),
        company: format!("{ticker} Corp"),
        exchange: "NYSE".to_string(),
        sector: "Industrials".to_string(),
        industry: "Machinery".to_string(),
        market: "us".to_string(),
        exchange_country: "US".to_string(),
        thesis: thesis.to_string(),
    }
}

fn queue_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn duplicate_tickers_are_appended_once() {
    let dir = tempfile::tempdir().unwrap();
    let queue = dir.path().join("screener-results.jsonl");

    let appended = append_ideas(
        &queue,
        &[record("AAA", "first"), record("aaa", "same ticker, lowercase")],
    )
    .unwrap();
    assert_eq!(appended, 1);

    // Second invocation with the same ticker is a no-op.
    let appended = append_ideas(&queue, &[record("AAA", "again")]).unwrap();
    assert_eq!(appended, 0);

    let lines = queue_lines(&queue);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("\"ticker\":\"AAA\""));
    assert!(lines[0].contains("first"));
}

#[test]
fn empty_append_leaves_no_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let queue = dir.path().join("screener-results.jsonl");

    let appended = append_ideas(&queue, &[]).unwrap();
    assert_eq!(appended, 0);
    assert!(!queue.exists());
}

#[test]
fn malformed_lines_are_skipped_and_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let queue = dir.path().join("screener-results.jsonl");
    fs::write(
        &queue,
        "not json at all\n{\"ticker\": \"AAA\", \"thesis\": \"kept\"}\n",
    )
    .unwrap();

    let existing = read_existing_tickers(&queue).unwrap();
    assert!(existing.contains("AAA"));
    assert_eq!(existing.len(), 1);

    let appended = append_ideas(&queue, &[record("AAA", "dup"), record("BBB", "new")]).unwrap();
    assert_eq!(appended, 1);

    let lines = queue_lines(&queue);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "not json at all");
    assert!(lines[2].contains("\"ticker\":\"BBB\""));
}

#[test]
fn missing_trailing_newline_is_repaired_before_appending() {
    let dir = tempfile::tempdir().unwrap();
    let queue = dir.path().join("screener-results.jsonl");
    fs::write(&queue, "{\"ticker\": \"AAA\"}").unwrap();

    append_ideas(&queue, &[record("BBB", "new")]).unwrap();

    let content = fs::read_to_string(&queue).unwrap();
    assert!(content.ends_with('\n'));
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "{\"ticker\": \"AAA\"}");
}

#[test]
fn records_are_written_as_ascii_only_json() {
    let dir = tempfile::tempdir().unwrap();
    let queue = dir.path().join("screener-results.jsonl");

    let mut idea = record("AAA", "Holds the Caf\u{e9} brand.");
    idea.company = "Caf\u{e9} M\u{fc}nster AG".to_string();
    append_ideas(&queue, &[idea]).unwrap();

    let content = fs::read_to_string(&queue).unwrap();
    assert!(content.is_ascii());
    assert!(content.contains("Caf\\u00e9 M\\u00fcnster AG"));
}

#[test]
fn cleanup_removes_run_local_artifacts_only() {
    let dir = tempfile::tempdir().unwrap();
    let run_dir = dir.path().join("idea-screens").join("2024-01-02-030405");
    fs::create_dir_all(&run_dir).unwrap();

    let queue = run_dir.join("screener-results.jsonl");
    let snapshot = run_dir.join("screener-candidates.json");
    let selection_inside = run_dir.join("selection.json");
    let selection_outside = dir.path().join("selection.json");
    fs::write(&queue, "{\"ticker\": \"AAA\"}\n").unwrap();
    fs::write(&snapshot, "{}").unwrap();
    fs::write(&selection_inside, "{}").unwrap();
    fs::write(&selection_outside, "{}").unwrap();

    let cleaned = cleanup_artifacts(&snapshot, Some(&selection_outside), &queue, false);
    assert_eq!(cleaned.len(), 1);
    assert!(!snapshot.exists());
    assert!(selection_outside.exists());
    assert!(queue.exists());

    let cleaned = cleanup_artifacts(&snapshot, Some(&selection_inside), &queue, false);
    assert_eq!(cleaned.len(), 1);
    assert!(!selection_inside.exists());
    assert!(queue.exists());
}

#[test]
fn cleanup_never_deletes_the_queue_passed_as_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let run_dir = dir.path().join("idea-screens").join("2024-01-02-030405");
    fs::create_dir_all(&run_dir).unwrap();

    let queue = run_dir.join("screener-results.jsonl");
    append_ideas(&queue, &[record("AAA", "durable")]).unwrap();

    // A degenerate resolution where the snapshot path aliases the queue.
    let cleaned = cleanup_artifacts(&queue, Some(&queue), &queue, false);
    assert!(cleaned.is_empty());
    assert!(queue.exists());
    assert!(read_existing_tickers(&queue).unwrap().contains("AAA"));
}

#[test]
fn keep_flag_skips_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let queue = dir.path().join("screener-results.jsonl");
    let snapshot = dir.path().join("screener-candidates.json");
    fs::write(&queue, "{}\n").unwrap();
    fs::write(&snapshot, "{}").unwrap();

    let cleaned = cleanup_artifacts(&snapshot, None, &queue, true);
    assert!(cleaned.is_empty());
    assert!(snapshot.exists());
}
