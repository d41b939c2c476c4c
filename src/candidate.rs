// src/candidate.rs
//! Reconciled screening records: a fixed metric set parsed out of merged
//! raw rows, keyed by a non-empty uppercase ticker.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::parse::{clean_text, parse_float, parse_market_cap, parse_percent};
use crate::table::RawRow;

/// This data source screens one market only.
pub const MARKET: &str = "us";
pub const EXCHANGE_COUNTRY: &str = "US";

/// Named numeric fields of one candidate; each is independently nullable
/// and serializes as an explicit `null` when absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub market_cap_usd: Option<f64>,
    pub pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub roe_pct: Option<f64>,
    pub roic_pct: Option<f64>,
    pub operating_margin_pct: Option<f64>,
    pub profit_margin_pct: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub eps_next_5y_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub ticker: String,
    pub company: String,
    pub exchange: String,
    pub sector: String,
    pub industry: String,
    pub market: String,
    pub exchange_country: String,
    pub metrics: Metrics,
}

/// Build a candidate from a merged row. Rows without a ticker yield `None`;
/// a candidate with an empty ticker must never exist.
pub fn build_candidate(row: &RawRow) -> Option<Candidate> {
    let get = |key: &str| row.get(key).map(String::as_str);

    let ticker = clean_text(get("Ticker")).to_ascii_uppercase();
    if ticker.is_empty() {
        return None;
    }

    let market_cap = parse_market_cap(get("Market Cap"));

    Some(Candidate {
        ticker,
        company: clean_text(get("Company")),
        exchange: clean_text(get("Exchange")),
        sector: clean_text(get("Sector")),
        industry: clean_text(get("Industry")),
        market: MARKET.to_string(),
        exchange_country: EXCHANGE_COUNTRY.to_string(),
        metrics: Metrics {
            market_cap_usd: market_cap.map(f64::round),
            pe: parse_float(get("P/E")),
            forward_pe: parse_float(get("Fwd P/E")),
            price_to_book: parse_float(get("P/B")),
            roe_pct: parse_percent(get("ROE")),
            roic_pct: parse_percent(get("ROIC")),
            operating_margin_pct: parse_percent(get("Oper M")),
            profit_margin_pct: parse_percent(get("Profit M")),
            debt_to_equity: parse_float(get("Debt/Eq")),
            eps_next_5y_pct: parse_percent(get("EPS Next 5Y")),
        },
    })
}

/// Candidates from raw rows, deduplicated by ticker in input order.
pub fn collect_candidates(rows: &[RawRow]) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();
    for row in rows {
        let Some(candidate) = build_candidate(row) else {
            continue;
        };
        if !seen.insert(candidate.ticker.clone()) {
            continue;
        }
        candidates.push(candidate);
    }
    candidates
}
