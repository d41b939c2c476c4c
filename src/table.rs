// src/table.rs
//! Screener HTML -> flat rows.
//!
//! Locates the results table (the one whose headers include both `No.` and
//! `Ticker`) and zips header text with cell text per row. Rows whose cell
//! count does not match the header count, or whose first cell is not a bare
//! row number, are skipped.

use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashMap;

/// One parsed row: source-defined column name -> cell text.
pub type RawRow = HashMap<String, String>;

pub const TICKER_COLUMN: &str = "Ticker";
pub const EXCHANGE_COLUMN: &str = "Exchange";
const ROW_NUMBER_COLUMN: &str = "No.";

fn re_table() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table>").unwrap())
}

fn re_tr() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").unwrap())
}

fn re_th() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<th\b[^>]*>(.*?)</th>").unwrap())
}

fn re_td() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").unwrap())
}

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap())
}

fn re_ws() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Markup fragment -> plain text: entity-decode, strip tags, collapse
/// whitespace.
fn cell_text(fragment: &str) -> String {
    let decoded = html_escape::decode_html_entities(fragment).to_string();
    let stripped = re_tags().replace_all(&decoded, " ");
    re_ws().replace_all(stripped.trim(), " ").to_string()
}

fn is_row_number(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Parse every data row of the screener results table. Markup without a
/// matching table yields no rows.
pub fn parse_table(html: &str) -> Vec<RawRow> {
    for table in re_table().captures_iter(html) {
        let body = &table[1];
        let headers: Vec<String> = re_th()
            .captures_iter(body)
            .map(|c| cell_text(&c[1]))
            .collect();
        if !headers.iter().any(|h| h == ROW_NUMBER_COLUMN)
            || !headers.iter().any(|h| h == TICKER_COLUMN)
        {
            continue;
        }

        let mut parsed = Vec::new();
        for row in re_tr().captures_iter(body) {
            let cells: Vec<String> = re_td()
                .captures_iter(&row[1])
                .map(|c| cell_text(&c[1]))
                .collect();
            if cells.len() != headers.len() {
                continue;
            }
            if !is_row_number(&cells[0]) {
                continue;
            }
            parsed.push(headers.iter().cloned().zip(cells).collect());
        }
        return parsed;
    }
    Vec::new()
}
